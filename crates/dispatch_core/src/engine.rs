//! One matching pass: read, filter, score, assign, commit.
//!
//! A pass is a single transaction. Candidate rows are locked with skip
//! semantics for its whole duration, which is what keeps concurrent passes
//! (overlapping ticks or several service instances) from double-booking a ride
//! or a chair. Any failure rolls the transaction back; the next trigger retries
//! on fresh data.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, warn, Instrument};

use crate::assigner::Assigner;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::filter::CandidateFilter;
use crate::matching::MatchingStrategy;
use crate::model::Pairing;
use crate::reader::read_snapshot;
use crate::store::{DispatchStore, DispatchTx};

/// Counters and decisions of one pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub strategy: &'static str,
    pub rides_considered: usize,
    /// Chairs handed to the strategy.
    pub chairs_considered: usize,
    /// Locked chairs the in-transaction re-check still found busy.
    pub busy_chairs: usize,
    /// Pairings that were written.
    pub pairings: Vec<Pairing>,
    pub skipped: usize,
    pub failed: usize,
    /// Sum of [`Pairing::cost`] over written pairings, in the strategy's distance.
    pub total_cost: i64,
    pub elapsed: Duration,
}

/// Result of a pass that did not fail.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// Nothing was eligible, or nothing could be written.
    NoContent(PassReport),
    /// At least one ride received a chair.
    Assigned(PassReport),
}

impl PassOutcome {
    pub fn report(&self) -> &PassReport {
        match self {
            PassOutcome::NoContent(report) | PassOutcome::Assigned(report) => report,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, PassOutcome::Assigned(_))
    }
}

/// The matching engine. Holds an injected store handle and one strategy.
pub struct MatchingEngine {
    store: Arc<dyn DispatchStore>,
    strategy: Box<dyn MatchingStrategy>,
    config: DispatchConfig,
}

impl MatchingEngine {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        strategy: Box<dyn MatchingStrategy>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            strategy,
            config,
        }
    }

    /// Engine running the strategy named in `config`.
    pub fn from_config(store: Arc<dyn DispatchStore>, config: DispatchConfig) -> Self {
        let strategy = config.strategy.build(&config);
        Self::new(store, strategy, config)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Runs one complete, independent matching pass.
    ///
    /// `batch_override` replaces the configured batch size for this pass only.
    pub async fn run_pass(&self, batch_override: Option<usize>) -> Result<PassOutcome> {
        let batch_size = self.config.effective_batch_size(batch_override);
        let span = info_span!("dispatch_pass", strategy = self.strategy.name(), batch_size);
        self.pass(batch_size).instrument(span).await
    }

    async fn pass(&self, batch_size: usize) -> Result<PassOutcome> {
        let started = Instant::now();
        let mut report = PassReport {
            strategy: self.strategy.name(),
            ..PassReport::default()
        };

        let mut tx = self.store.begin().await.map_err(DispatchError::Begin)?;

        let read = read_snapshot(&mut *tx, batch_size, &self.config).await;
        let snapshot = match read {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(abort(tx, err).await),
        };
        report.rides_considered = snapshot.rides.len();

        let filtered =
            CandidateFilter::new(self.config.completion_threshold).available_chairs(&snapshot);
        report.busy_chairs = filtered.busy;
        let chairs = filtered.chairs;
        report.chairs_considered = chairs.len();

        if snapshot.rides.is_empty() || chairs.is_empty() {
            release(tx).await;
            report.elapsed = started.elapsed();
            debug!(
                rides = report.rides_considered,
                chairs = report.chairs_considered,
                busy = report.busy_chairs,
                "nothing to match"
            );
            return Ok(PassOutcome::NoContent(report));
        }

        let pairings = self.strategy.find_batch_matches(&snapshot.rides, &chairs);
        let applied = Assigner::new(self.config.commit_policy)
            .apply(&mut *tx, pairings)
            .await;
        let assigned = match applied {
            Ok(assigned) => assigned,
            Err(err) => return Err(abort(tx, err).await),
        };

        tx.commit().await.map_err(DispatchError::Commit)?;

        report.total_cost = assigned.assigned.iter().map(|pairing| pairing.cost).sum();
        report.pairings = assigned.assigned;
        report.skipped = assigned.skipped;
        report.failed = assigned.failed;
        report.elapsed = started.elapsed();

        info!(
            rides = report.rides_considered,
            chairs = report.chairs_considered,
            busy = report.busy_chairs,
            assigned = report.pairings.len(),
            skipped = report.skipped,
            failed = report.failed,
            total_cost = report.total_cost,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "matching pass finished"
        );

        if report.pairings.is_empty() {
            Ok(PassOutcome::NoContent(report))
        } else {
            Ok(PassOutcome::Assigned(report))
        }
    }
}

/// Rolls back after `err`; a failing rollback is logged, `err` is still returned.
async fn abort(tx: Box<dyn DispatchTx>, err: DispatchError) -> DispatchError {
    if let Err(rollback) = tx.rollback().await {
        warn!(error = %rollback, "rollback after failed pass also failed");
    }
    err
}

/// Ends a transaction that wrote nothing.
async fn release(tx: Box<dyn DispatchTx>) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "failed to release idle matching transaction");
    }
}
