//! Scorer: interchangeable strategies that turn a snapshot into pairings.
//!
//! - **`NearestMatching`**: oldest ride, nearest chair, one pairing per pass.
//! - **`GreedyMatching`**: ride by ride, pickup distance or revenue rate.
//! - **`FlowMatching`**: batch-optimal min-cost assignment (the default).

pub mod algorithm;
pub mod flow;
pub mod greedy;
pub mod min_cost_flow;
pub mod nearest;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use algorithm::MatchingStrategy;
pub use flow::FlowMatching;
pub use greedy::{GreedyMatching, GreedyObjective};
pub use nearest::NearestMatching;

use crate::config::DispatchConfig;

/// Which strategy a pass runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Nearest,
    GreedyDistance,
    GreedyRevenue,
    #[default]
    Flow,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Nearest,
        StrategyKind::GreedyDistance,
        StrategyKind::GreedyRevenue,
        StrategyKind::Flow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Nearest => "nearest",
            StrategyKind::GreedyDistance => "greedy-distance",
            StrategyKind::GreedyRevenue => "greedy-revenue",
            StrategyKind::Flow => "flow",
        }
    }

    pub fn build(&self, config: &DispatchConfig) -> Box<dyn MatchingStrategy> {
        match self {
            StrategyKind::Nearest => Box::new(NearestMatching),
            StrategyKind::GreedyDistance => Box::new(GreedyMatching::by_distance()),
            StrategyKind::GreedyRevenue => Box::new(GreedyMatching::by_revenue(config.fare)),
            StrategyKind::Flow => Box::new(FlowMatching),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown matching strategy '{s}'"))
    }
}
