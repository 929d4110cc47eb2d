//! Transactional store abstraction the engine runs a pass against.
//!
//! Two backends are provided:
//!
//! - **`InMemoryStore`**: tables behind a mutex with per-row lock ownership. Zero dependencies.
//! - **`MySqlStore`** (feature `mysql`): `SELECT ... FOR UPDATE SKIP LOCKED` over sqlx.
//!
//! Both read candidate rows with lock-and-skip semantics: a row locked by another
//! open transaction is left out of the result instead of being waited on.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{ChairId, Ride, RideId, RideProgress};
use crate::spatial::Coordinate;

pub mod memory;
#[cfg(feature = "mysql")]
pub mod mysql;

pub use memory::InMemoryStore;
#[cfg(feature = "mysql")]
pub use mysql::MySqlStore;

/// Active chair row locked by a transaction, joined with its latest location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedChair {
    pub id: ChairId,
    pub location: Coordinate,
    /// Speed of the chair's model, if the chair has a known model.
    pub speed: Option<i32>,
}

/// Which chairs a pass may lock.
///
/// Busy chairs and chairs past `limit` are left unlocked so an overlapping pass
/// can still use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChairQuery {
    /// Delivered status markers after which a bound ride no longer keeps its chair busy.
    pub completion_threshold: u32,
    /// Most chairs to lock, `None` for no cap.
    pub limit: Option<usize>,
}

/// Entry point handed to the engine. Implementations must be `Send + Sync` so
/// a single store can serve concurrently running passes.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn DispatchTx>, StoreError>;
}

/// One open transaction. Dropping it without `commit` rolls it back.
#[async_trait]
pub trait DispatchTx: Send {
    /// Oldest unassigned rides first, at most `limit`, skipping rows locked elsewhere.
    async fn lock_pending_rides(&mut self, limit: usize) -> Result<Vec<Ride>, StoreError>;

    /// Active, non-busy chairs that have at least one location row, ordered by id,
    /// at most `query.limit`, skipping rows locked elsewhere.
    async fn lock_available_chairs(
        &mut self,
        query: ChairQuery,
    ) -> Result<Vec<LockedChair>, StoreError>;

    /// Delivered status counts for every ride bound to one of `chair_ids`.
    async fn ride_progress(&mut self, chair_ids: &[ChairId])
        -> Result<Vec<RideProgress>, StoreError>;

    /// Sets the ride's chair if it is still unassigned. `Ok(false)` means no row changed.
    async fn assign_chair(&mut self, ride_id: &RideId, chair_id: &ChairId)
        -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
