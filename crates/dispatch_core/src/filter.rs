//! Candidate filter: drops chairs still working through an earlier ride.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{ChairCandidate, ChairId, RideProgress};
use crate::reader::Snapshot;

#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter {
    pub completion_threshold: u32,
}

/// Chairs left after the filter, plus how many were dropped as busy.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub chairs: Vec<ChairCandidate>,
    pub busy: usize,
}

impl CandidateFilter {
    pub fn new(completion_threshold: u32) -> Self {
        Self {
            completion_threshold,
        }
    }

    /// A ride keeps its chair busy until enough status markers were delivered.
    pub fn is_busy(&self, progress: &RideProgress) -> bool {
        progress.delivered_events < self.completion_threshold
    }

    /// Busy chairs out of the snapshot's chair list, order preserved.
    pub fn available_chairs(&self, snapshot: &Snapshot) -> FilterOutcome {
        let busy: HashSet<&ChairId> = snapshot
            .progress
            .iter()
            .filter(|progress| self.is_busy(progress))
            .map(|progress| &progress.chair_id)
            .collect();

        let mut outcome = FilterOutcome::default();
        for chair in &snapshot.chairs {
            if busy.contains(&chair.id) {
                debug!(chair_id = %chair.id, "chair busy with an unfinished ride");
                outcome.busy += 1;
            } else {
                outcome.chairs.push(chair.clone());
            }
        }
        outcome
    }
}
