//! In-process store with row-level lock ownership and skip-locked reads.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    Chair, ChairId, ChairLocation, ChairModel, Ride, RideId, RideProgress, RideStatusEvent,
};

use super::{ChairQuery, DispatchStore, DispatchTx, LockedChair};

type TxId = u64;

#[derive(Debug, Default)]
struct Faults {
    begin: bool,
    assign: bool,
    commit: bool,
    /// Reads still allowed to succeed before one fails.
    read: Option<u32>,
}

#[derive(Debug, Default)]
struct Tables {
    rides: BTreeMap<RideId, Ride>,
    chairs: BTreeMap<ChairId, Chair>,
    models: HashMap<String, ChairModel>,
    locations: Vec<ChairLocation>,
    statuses: Vec<RideStatusEvent>,
    ride_locks: HashMap<RideId, TxId>,
    chair_locks: HashMap<ChairId, TxId>,
    next_tx: TxId,
    faults: Faults,
}

impl Tables {
    fn release(&mut self, tx: TxId) {
        self.ride_locks.retain(|_, owner| *owner != tx);
        self.chair_locks.retain(|_, owner| *owner != tx);
    }

    fn take_read_fault(&mut self) -> Result<(), StoreError> {
        match self.faults.read {
            Some(0) => {
                self.faults.read = None;
                Err(StoreError::Unavailable("injected read failure".to_string()))
            }
            Some(remaining) => {
                self.faults.read = Some(remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn delivered_events(&self, ride_id: &RideId) -> u32 {
        self.statuses
            .iter()
            .filter(|event| &event.ride_id == ride_id && event.chair_sent_at.is_some())
            .count() as u32
    }

    fn is_busy(&self, chair_id: &ChairId, completion_threshold: u32) -> bool {
        self.rides.values().any(|ride| {
            ride.chair_id.as_ref() == Some(chair_id)
                && self.delivered_events(&ride.id) < completion_threshold
        })
    }

    fn latest_location(&self, chair_id: &ChairId) -> Option<&ChairLocation> {
        self.locations
            .iter()
            .filter(|location| &location.chair_id == chair_id)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
    }
}

/// Shared in-memory tables. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ride(&self, ride: Ride) {
        lock(&self.tables).rides.insert(ride.id.clone(), ride);
    }

    pub fn insert_chair(&self, chair: Chair) {
        lock(&self.tables).chairs.insert(chair.id.clone(), chair);
    }

    pub fn insert_chair_model(&self, model: ChairModel) {
        lock(&self.tables).models.insert(model.name.clone(), model);
    }

    pub fn record_location(&self, location: ChairLocation) {
        lock(&self.tables).locations.push(location);
    }

    pub fn record_status(&self, event: RideStatusEvent) {
        lock(&self.tables).statuses.push(event);
    }

    pub fn set_chair_active(&self, chair_id: &ChairId, is_active: bool) {
        if let Some(chair) = lock(&self.tables).chairs.get_mut(chair_id) {
            chair.is_active = is_active;
        }
    }

    pub fn ride(&self, ride_id: &RideId) -> Option<Ride> {
        lock(&self.tables).rides.get(ride_id).cloned()
    }

    /// Committed rides ordered by creation time.
    pub fn rides(&self) -> Vec<Ride> {
        let mut rides: Vec<Ride> = lock(&self.tables).rides.values().cloned().collect();
        rides.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rides
    }

    /// Number of rows currently locked by open transactions.
    pub fn held_locks(&self) -> usize {
        let tables = lock(&self.tables);
        tables.ride_locks.len() + tables.chair_locks.len()
    }

    pub fn fail_next_begin(&self) {
        lock(&self.tables).faults.begin = true;
    }

    /// Fails the next read of any transaction.
    pub fn fail_next_read(&self) {
        self.fail_read_after(0);
    }

    /// Lets `reads` more reads succeed, then fails the one after.
    pub fn fail_read_after(&self, reads: u32) {
        lock(&self.tables).faults.read = Some(reads);
    }

    pub fn fail_next_assign(&self) {
        lock(&self.tables).faults.assign = true;
    }

    pub fn fail_next_commit(&self) {
        lock(&self.tables).faults.commit = true;
    }
}

#[async_trait]
impl DispatchStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn DispatchTx>, StoreError> {
        let mut tables = lock(&self.tables);
        if std::mem::take(&mut tables.faults.begin) {
            return Err(StoreError::Unavailable("injected begin failure".to_string()));
        }
        tables.next_tx += 1;
        Ok(Box::new(InMemoryTx {
            tables: Arc::clone(&self.tables),
            id: tables.next_tx,
            pending: Vec::new(),
            finished: false,
        }))
    }
}

/// Transaction over [`InMemoryStore`]. Writes stay private until commit.
#[derive(Debug)]
pub struct InMemoryTx {
    tables: Arc<Mutex<Tables>>,
    id: TxId,
    pending: Vec<(RideId, ChairId)>,
    finished: bool,
}

impl InMemoryTx {
    fn open(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.finished {
            return Err(StoreError::Finished);
        }
        Ok(lock(&self.tables))
    }

    fn finish(&mut self) {
        self.finished = true;
        self.pending.clear();
        lock(&self.tables).release(self.id);
    }
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            lock(&self.tables).release(self.id);
        }
    }
}

#[async_trait]
impl DispatchTx for InMemoryTx {
    async fn lock_pending_rides(&mut self, limit: usize) -> Result<Vec<Ride>, StoreError> {
        let id = self.id;
        let claimed: HashSet<&RideId> = self.pending.iter().map(|(ride, _)| ride).collect();
        let mut tables = self.open()?;
        tables.take_read_fault()?;

        let mut rides: Vec<Ride> = tables
            .rides
            .values()
            .filter(|ride| ride.chair_id.is_none() && !claimed.contains(&ride.id))
            .filter(|ride| tables.ride_locks.get(&ride.id).map_or(true, |owner| *owner == id))
            .cloned()
            .collect();
        rides.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rides.truncate(limit);

        for ride in &rides {
            tables.ride_locks.insert(ride.id.clone(), id);
        }
        Ok(rides)
    }

    async fn lock_available_chairs(
        &mut self,
        query: ChairQuery,
    ) -> Result<Vec<LockedChair>, StoreError> {
        let id = self.id;
        let mut tables = self.open()?;
        tables.take_read_fault()?;

        let chairs: Vec<LockedChair> = tables
            .chairs
            .values()
            .filter(|chair| chair.is_active)
            .filter(|chair| tables.chair_locks.get(&chair.id).map_or(true, |owner| *owner == id))
            .filter(|chair| !tables.is_busy(&chair.id, query.completion_threshold))
            .filter_map(|chair| {
                let location = tables.latest_location(&chair.id)?;
                let speed = chair
                    .model
                    .as_ref()
                    .and_then(|name| tables.models.get(name))
                    .map(|model| model.speed);
                Some(LockedChair {
                    id: chair.id.clone(),
                    location: location.coordinate,
                    speed,
                })
            })
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        for chair in &chairs {
            tables.chair_locks.insert(chair.id.clone(), id);
        }
        Ok(chairs)
    }

    async fn ride_progress(
        &mut self,
        chair_ids: &[ChairId],
    ) -> Result<Vec<RideProgress>, StoreError> {
        let wanted: HashSet<&ChairId> = chair_ids.iter().collect();
        let mut tables = self.open()?;
        tables.take_read_fault()?;

        Ok(tables
            .rides
            .values()
            .filter_map(|ride| {
                let chair_id = ride.chair_id.as_ref().filter(|chair| wanted.contains(chair))?;
                Some(RideProgress {
                    ride_id: ride.id.clone(),
                    chair_id: chair_id.clone(),
                    delivered_events: tables.delivered_events(&ride.id),
                })
            })
            .collect())
    }

    async fn assign_chair(
        &mut self,
        ride_id: &RideId,
        chair_id: &ChairId,
    ) -> Result<bool, StoreError> {
        let id = self.id;
        let already_pending = self.pending.iter().any(|(ride, _)| ride == ride_id);
        let mut tables = self.open()?;
        if std::mem::take(&mut tables.faults.assign) {
            return Err(StoreError::Unavailable("injected assign failure".to_string()));
        }

        let unassigned = tables
            .rides
            .get(ride_id)
            .is_some_and(|ride| ride.chair_id.is_none());
        let locked_elsewhere = tables
            .ride_locks
            .get(ride_id)
            .is_some_and(|owner| *owner != id);
        if !unassigned || locked_elsewhere || already_pending {
            return Ok(false);
        }

        tables.ride_locks.insert(ride_id.clone(), id);
        drop(tables);
        self.pending.push((ride_id.clone(), chair_id.clone()));
        Ok(true)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let mut tables = self.open()?;
        if std::mem::take(&mut tables.faults.commit) {
            drop(tables);
            self.finish();
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }
        for (ride_id, chair_id) in &self.pending {
            if let Some(ride) = tables.rides.get_mut(ride_id) {
                if ride.chair_id.is_none() {
                    ride.chair_id = Some(chair_id.clone());
                }
            }
        }
        drop(tables);
        self.finish();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Finished);
        }
        self.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::ChairLocationId;
    use crate::spatial::Coordinate;

    const ALL_CHAIRS: ChairQuery = ChairQuery {
        completion_threshold: 6,
        limit: None,
    };

    fn ride(id: &str, created_secs: i64) -> Ride {
        Ride {
            id: RideId::from(id),
            pickup: Coordinate::new(0, 0),
            destination: Coordinate::new(5, 5),
            created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
            chair_id: None,
        }
    }

    fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_ride(ride("r2", 20));
        store.insert_ride(ride("r1", 10));
        store.insert_chair(Chair {
            id: ChairId::from("c1"),
            is_active: true,
            model: Some("swift".to_string()),
        });
        store.insert_chair_model(ChairModel {
            name: "swift".to_string(),
            speed: 7,
        });
        for (id, secs, lat) in [("l1", 1, 1), ("l2", 5, 9), ("l3", 3, 4)] {
            store.record_location(ChairLocation {
                id: ChairLocationId::from(id),
                chair_id: ChairId::from("c1"),
                coordinate: Coordinate::new(lat, lat),
                created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            });
        }
        store
    }

    #[tokio::test]
    async fn pending_rides_come_oldest_first_and_skip_foreign_locks() {
        let store = seeded_store();
        let mut first = store.begin().await.unwrap();
        let locked = first.lock_pending_rides(1).await.unwrap();
        assert_eq!(locked[0].id, RideId::from("r1"));

        let mut second = store.begin().await.unwrap();
        let visible = second.lock_pending_rides(5).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, RideId::from("r2"));
    }

    #[tokio::test]
    async fn chairs_carry_latest_location_and_model_speed() {
        let store = seeded_store();
        let mut tx = store.begin().await.unwrap();
        let chairs = tx.lock_available_chairs(ALL_CHAIRS).await.unwrap();
        assert_eq!(
            chairs,
            vec![LockedChair {
                id: ChairId::from("c1"),
                location: Coordinate::new(9, 9),
                speed: Some(7),
            }]
        );
    }

    #[tokio::test]
    async fn dropping_a_transaction_releases_its_locks_and_discards_writes() {
        let store = seeded_store();
        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_available_chairs(ALL_CHAIRS).await.unwrap();
            assert!(tx
                .assign_chair(&RideId::from("r1"), &ChairId::from("c1"))
                .await
                .unwrap());
            assert!(store.held_locks() > 0);
        }
        assert_eq!(store.held_locks(), 0);
        assert_eq!(store.ride(&RideId::from("r1")).unwrap().chair_id, None);
    }

    #[tokio::test]
    async fn conditional_assign_is_a_no_op_once_assigned() {
        let store = seeded_store();
        let mut tx = store.begin().await.unwrap();
        assert!(tx
            .assign_chair(&RideId::from("r1"), &ChairId::from("c1"))
            .await
            .unwrap());
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(!tx
            .assign_chair(&RideId::from("r1"), &ChairId::from("c2"))
            .await
            .unwrap());
        tx.commit().await.unwrap();
        assert_eq!(
            store.ride(&RideId::from("r1")).unwrap().chair_id,
            Some(ChairId::from("c1"))
        );
    }

    fn add_chair(store: &InMemoryStore, id: &str, secs: i64) {
        store.insert_chair(Chair {
            id: ChairId::from(id),
            is_active: true,
            model: None,
        });
        store.record_location(ChairLocation {
            id: ChairLocationId::new(format!("{id}-loc")),
            chair_id: ChairId::from(id),
            coordinate: Coordinate::new(0, 0),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        });
    }

    #[tokio::test]
    async fn busy_and_surplus_chairs_stay_unlocked() {
        let store = seeded_store();
        add_chair(&store, "c2", 1);
        add_chair(&store, "c3", 1);
        let mut bind = store.begin().await.unwrap();
        bind.assign_chair(&RideId::from("r1"), &ChairId::from("c1"))
            .await
            .unwrap();
        bind.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let chairs = tx
            .lock_available_chairs(ChairQuery {
                completion_threshold: 6,
                limit: Some(1),
            })
            .await
            .unwrap();
        let ids: Vec<&str> = chairs.iter().map(|chair| chair.id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
        assert_eq!(store.held_locks(), 1);

        let mut other = store.begin().await.unwrap();
        let rest = other.lock_available_chairs(ALL_CHAIRS).await.unwrap();
        let ids: Vec<&str> = rest.iter().map(|chair| chair.id.as_str()).collect();
        assert_eq!(ids, vec!["c3"]);
    }

    #[tokio::test]
    async fn read_fault_fires_once_after_the_allowed_reads() {
        let store = seeded_store();
        store.fail_read_after(1);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.lock_pending_rides(5).await.unwrap().len(), 2);
        assert!(matches!(
            tx.lock_available_chairs(ALL_CHAIRS).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(tx.lock_available_chairs(ALL_CHAIRS).await.unwrap().len(), 1);
    }
}
