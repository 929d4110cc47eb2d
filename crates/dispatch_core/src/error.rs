use thiserror::Error;

use crate::model::{ChairId, RideId};

/// Failures raised by a [`DispatchStore`](crate::store::DispatchStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "mysql")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transaction already finished")]
    Finished,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a matching pass was aborted. Each variant leaves no assignment behind.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to begin matching transaction: {0}")]
    Begin(#[source] StoreError),

    #[error("failed to read dispatch state: {0}")]
    Read(#[source] StoreError),

    #[error("failed to assign chair {chair_id} to ride {ride_id}: {source}")]
    Write {
        ride_id: RideId,
        chair_id: ChairId,
        #[source]
        source: StoreError,
    },

    #[error("failed to commit matching transaction: {0}")]
    Commit(#[source] StoreError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
