//! Assigner: writes a pass's pairings inside the pass's transaction.

use tracing::{debug, warn};

use crate::config::CommitPolicy;
use crate::error::{DispatchError, Result};
use crate::model::Pairing;
use crate::store::DispatchTx;

/// What the assigner did with the pairings it was given.
#[derive(Debug, Clone, Default)]
pub struct AssignReport {
    /// Pairings whose conditional update changed the ride.
    pub assigned: Vec<Pairing>,
    /// Rides another pass had already claimed; nothing was written.
    pub skipped: usize,
    /// Writes that failed under [`CommitPolicy::PerPairing`].
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Assigner {
    pub policy: CommitPolicy,
}

impl Assigner {
    pub fn new(policy: CommitPolicy) -> Self {
        Self { policy }
    }

    /// Applies each pairing as `chair_id = ? WHERE chair_id IS NULL`.
    ///
    /// Under `Atomic` the first failed write is returned and the caller rolls the
    /// transaction back. Under `PerPairing` failures are logged and counted.
    pub async fn apply(
        &self,
        tx: &mut dyn DispatchTx,
        pairings: Vec<Pairing>,
    ) -> Result<AssignReport> {
        let mut report = AssignReport::default();

        for pairing in pairings {
            match tx.assign_chair(&pairing.ride_id, &pairing.chair_id).await {
                Ok(true) => {
                    debug!(
                        ride_id = %pairing.ride_id,
                        chair_id = %pairing.chair_id,
                        cost = pairing.cost,
                        "assigned chair"
                    );
                    report.assigned.push(pairing);
                }
                Ok(false) => {
                    warn!(
                        ride_id = %pairing.ride_id,
                        chair_id = %pairing.chair_id,
                        "ride already claimed, skipping"
                    );
                    report.skipped += 1;
                }
                Err(source) => match self.policy {
                    CommitPolicy::Atomic => {
                        return Err(DispatchError::Write {
                            ride_id: pairing.ride_id,
                            chair_id: pairing.chair_id,
                            source,
                        });
                    }
                    CommitPolicy::PerPairing => {
                        warn!(
                            ride_id = %pairing.ride_id,
                            chair_id = %pairing.chair_id,
                            error = %source,
                            "assignment failed, continuing with remaining pairings"
                        );
                        report.failed += 1;
                    }
                },
            }
        }

        Ok(report)
    }
}
