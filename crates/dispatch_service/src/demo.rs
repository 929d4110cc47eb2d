//! Seeds the in-process store so the loop can run without a database.

use std::collections::HashSet;

use chrono::{Duration as ChronoDuration, Utc};
use dispatch_core::model::{
    Chair, ChairId, ChairLocation, ChairLocationId, ChairModel, Ride, RideId, RideStatus,
    RideStatusEvent,
};
use dispatch_core::spatial::Coordinate;
use dispatch_core::InMemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GRID: i32 = 300;
const MODELS: [(&str, i32); 3] = [("akachan", 2), ("hayai", 5), ("zoom", 7)];

fn random_point(rng: &mut StdRng) -> Coordinate {
    Coordinate::new(rng.gen_range(-GRID..=GRID), rng.gen_range(-GRID..=GRID))
}

pub fn seeded_store(rides: usize, chairs: usize, seed: u64) -> InMemoryStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let store = InMemoryStore::new();
    let now = Utc::now();

    for (name, speed) in MODELS {
        store.insert_chair_model(ChairModel {
            name: name.to_string(),
            speed,
        });
    }

    for j in 0..chairs {
        let chair_id = ChairId::new(format!("chair-{j:04}"));
        let (model, _) = MODELS[rng.gen_range(0..MODELS.len())];
        store.insert_chair(Chair {
            id: chair_id.clone(),
            is_active: rng.gen_bool(0.9),
            model: Some(model.to_string()),
        });
        for step in 0..3 {
            store.record_location(ChairLocation {
                id: ChairLocationId::new(format!("loc-{j:04}-{step}")),
                chair_id: chair_id.clone(),
                coordinate: random_point(&mut rng),
                created_at: now - ChronoDuration::seconds(60 - step * 10),
            });
        }
    }

    for i in 0..rides {
        store.insert_ride(Ride {
            id: RideId::new(format!("ride-{i:05}")),
            pickup: random_point(&mut rng),
            destination: random_point(&mut rng),
            created_at: now + ChronoDuration::milliseconds(i as i64),
            chair_id: None,
        });
    }

    store
}

/// Delivers every status of newly assigned rides so their chairs free up for
/// later passes.
pub fn finish_assigned_rides(store: &InMemoryStore, finished: &mut HashSet<RideId>) {
    for ride in store.rides() {
        if ride.chair_id.is_none() || !finished.insert(ride.id.clone()) {
            continue;
        }
        for status in RideStatus::ALL {
            store.record_status(RideStatusEvent {
                ride_id: ride.id.clone(),
                status,
                chair_sent_at: Some(Utc::now()),
            });
        }
    }
}
