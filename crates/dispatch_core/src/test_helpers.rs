//! Fixture helpers shared by unit tests, integration tests and benchmarks.
//!
//! Timestamps are whole seconds after the Unix epoch so fixtures read as
//! "created at t=1", "created at t=2".

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    Chair, ChairCandidate, ChairId, ChairLocation, ChairLocationId, ChairModel, Ride,
    RideCandidate, RideId, RideStatus, RideStatusEvent,
};
use crate::spatial::Coordinate;
use crate::store::InMemoryStore;

/// Model name every seeded chair uses unless a test says otherwise.
pub const TEST_MODEL: &str = "standard";

/// Speed of [`TEST_MODEL`].
pub const TEST_MODEL_SPEED: i32 = 2;

/// `secs` seconds after the epoch.
pub fn at_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or_default()
}

pub fn ride_at(
    id: &str,
    created_secs: i64,
    pickup: (i32, i32),
    destination: (i32, i32),
) -> RideCandidate {
    RideCandidate {
        id: RideId::from(id),
        pickup: pickup.into(),
        destination: destination.into(),
        created_at: at_secs(created_secs),
    }
}

pub fn chair_at(id: &str, location: (i32, i32), speed: i32) -> ChairCandidate {
    ChairCandidate {
        id: ChairId::from(id),
        location: location.into(),
        speed,
    }
}

/// Store with the [`TEST_MODEL`] chair model registered and nothing else.
pub fn empty_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_chair_model(ChairModel {
        name: TEST_MODEL.to_string(),
        speed: TEST_MODEL_SPEED,
    });
    store
}

/// Adds an unassigned ride.
pub fn seed_ride(
    store: &InMemoryStore,
    id: &str,
    created_secs: i64,
    pickup: (i32, i32),
    destination: (i32, i32),
) -> RideId {
    let ride_id = RideId::from(id);
    store.insert_ride(Ride {
        id: ride_id.clone(),
        pickup: pickup.into(),
        destination: destination.into(),
        created_at: at_secs(created_secs),
        chair_id: None,
    });
    ride_id
}

/// Adds an active [`TEST_MODEL`] chair reporting a single location.
pub fn seed_chair(store: &InMemoryStore, id: &str, location: (i32, i32)) -> ChairId {
    let chair_id = ChairId::from(id);
    store.insert_chair(Chair {
        id: chair_id.clone(),
        is_active: true,
        model: Some(TEST_MODEL.to_string()),
    });
    move_chair(store, &chair_id, 0, location);
    chair_id
}

/// Appends a location row for `chair_id` reported at `secs`.
pub fn move_chair(store: &InMemoryStore, chair_id: &ChairId, secs: i64, location: (i32, i32)) {
    let coordinate: Coordinate = location.into();
    store.record_location(ChairLocation {
        id: ChairLocationId::new(format!("{chair_id}-{secs}-{}", coordinate.latitude)),
        chair_id: chair_id.clone(),
        coordinate,
        created_at: at_secs(secs),
    });
}

/// Records the first `count` status markers of a ride as delivered to its chair.
pub fn deliver_statuses(store: &InMemoryStore, ride_id: &RideId, count: usize) {
    for status in RideStatus::ALL.into_iter().take(count) {
        store.record_status(RideStatusEvent {
            ride_id: ride_id.clone(),
            status,
            chair_sent_at: Some(at_secs(0)),
        });
    }
}

/// Marks every status of the ride as delivered, freeing its chair.
pub fn complete_ride(store: &InMemoryStore, ride_id: &RideId) {
    deliver_statuses(store, ride_id, RideStatus::ALL.len());
}

/// Two rides and two chairs:
/// R1 pickup (0,0) at t=1, R2 pickup (10,10) at t=2, C1 at (1,1), C2 at (9,9).
pub fn two_by_two_store() -> InMemoryStore {
    let store = empty_store();
    seed_ride(&store, "R1", 1, (0, 0), (0, 0));
    seed_ride(&store, "R2", 2, (10, 10), (10, 10));
    seed_chair(&store, "C1", (1, 1));
    seed_chair(&store, "C2", (9, 9));
    store
}
