use serde::{Deserialize, Serialize};

use crate::matching::StrategyKind;
use crate::pricing::FareModel;

/// Rides considered per pass when no override is given.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Upper bound on a per-pass batch size override.
pub const MAX_BATCH_SIZE: usize = 64;

/// Delivered status markers after which a ride no longer keeps its chair busy.
pub const DEFAULT_COMPLETION_THRESHOLD: u32 = 6;

/// Speed assumed for chairs whose model is missing.
pub const DEFAULT_CHAIR_SPEED: i32 = 1;

/// How the assigner treats a failing write within one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// First failing write aborts the pass and rolls back every assignment.
    #[default]
    Atomic,
    /// Failing writes are logged and skipped; the rest are committed.
    PerPairing,
}

impl std::str::FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(CommitPolicy::Atomic),
            "per-pairing" => Ok(CommitPolicy::PerPairing),
            other => Err(format!("unknown commit policy '{other}'")),
        }
    }
}

/// Engine settings. Everything has a default so partial documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub batch_size: usize,
    pub completion_threshold: u32,
    pub strategy: StrategyKind,
    pub commit_policy: CommitPolicy,
    /// Cap on chairs handed to the strategy after busy ones are removed.
    pub max_chairs: Option<usize>,
    pub default_chair_speed: i32,
    pub fare: FareModel,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            strategy: StrategyKind::default(),
            commit_policy: CommitPolicy::default(),
            max_chairs: None,
            default_chair_speed: DEFAULT_CHAIR_SPEED,
            fare: FareModel::default(),
        }
    }
}

impl DispatchConfig {
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    pub fn with_max_chairs(mut self, max_chairs: usize) -> Self {
        self.max_chairs = Some(max_chairs);
        self
    }

    /// Batch size for one pass: the override when given, clamped to [`MAX_BATCH_SIZE`].
    pub fn effective_batch_size(&self, batch_override: Option<usize>) -> usize {
        batch_override
            .unwrap_or(self.batch_size)
            .min(MAX_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_falls_back_to_defaults() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{"batch_size": 3, "strategy": "greedy-revenue"}"#)
                .expect("config");
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.strategy, StrategyKind::GreedyRevenue);
        assert_eq!(config.completion_threshold, DEFAULT_COMPLETION_THRESHOLD);
        assert_eq!(config.commit_policy, CommitPolicy::Atomic);
    }

    #[test]
    fn batch_override_is_clamped() {
        let config = DispatchConfig::default();
        assert_eq!(config.effective_batch_size(None), DEFAULT_BATCH_SIZE);
        assert_eq!(config.effective_batch_size(Some(2)), 2);
        assert_eq!(config.effective_batch_size(Some(10_000)), MAX_BATCH_SIZE);
    }
}
