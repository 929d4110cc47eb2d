//! State reader: the locked snapshot one pass works from.

use tracing::debug;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::model::{ChairCandidate, ChairId, RideCandidate, RideProgress};
use crate::store::{ChairQuery, DispatchTx};

/// Everything a pass decides on, read inside its own transaction.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Pending rides, oldest first.
    pub rides: Vec<RideCandidate>,
    /// Free active chairs with a known location, ordered by id.
    pub chairs: Vec<ChairCandidate>,
    /// Progress of every ride bound to one of `chairs`.
    pub progress: Vec<RideProgress>,
}

/// Reads pending rides and candidate chairs with lock-and-skip semantics.
///
/// Chairs are only read once at least one ride is pending, so an idle pass
/// never locks the fleet. Only chairs that are free and within
/// `config.max_chairs` are locked. Missing model speeds resolve to
/// `config.default_chair_speed`.
pub async fn read_snapshot(
    tx: &mut dyn DispatchTx,
    batch_size: usize,
    config: &DispatchConfig,
) -> Result<Snapshot> {
    if batch_size == 0 {
        return Ok(Snapshot::default());
    }

    let rides: Vec<RideCandidate> = tx
        .lock_pending_rides(batch_size)
        .await
        .map_err(DispatchError::Read)?
        .iter()
        .map(RideCandidate::from)
        .collect();
    if rides.is_empty() {
        debug!("no pending rides");
        return Ok(Snapshot::default());
    }

    let chairs: Vec<ChairCandidate> = tx
        .lock_available_chairs(ChairQuery {
            completion_threshold: config.completion_threshold,
            limit: config.max_chairs,
        })
        .await
        .map_err(DispatchError::Read)?
        .into_iter()
        .map(|chair| ChairCandidate {
            id: chair.id,
            location: chair.location,
            speed: chair.speed.unwrap_or(config.default_chair_speed),
        })
        .collect();
    if chairs.is_empty() {
        debug!(rides = rides.len(), "no free chairs with a location");
        return Ok(Snapshot {
            rides,
            ..Snapshot::default()
        });
    }

    let chair_ids: Vec<ChairId> = chairs.iter().map(|chair| chair.id.clone()).collect();
    let progress = tx
        .ride_progress(&chair_ids)
        .await
        .map_err(DispatchError::Read)?;

    Ok(Snapshot {
        rides,
        chairs,
        progress,
    })
}
