#![allow(dead_code)]

use std::collections::HashSet;

use dispatch_core::model::{ChairCandidate, Pairing, RideCandidate};
use dispatch_core::test_helpers::{chair_at, ride_at};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Grid span random fixtures are drawn from.
pub const GRID: i32 = 40;

fn random_point(rng: &mut StdRng) -> (i32, i32) {
    (rng.gen_range(-GRID..=GRID), rng.gen_range(-GRID..=GRID))
}

/// Seeded rides (oldest first) and chairs for property checks.
pub fn random_snapshot(
    seed: u64,
    rides: usize,
    chairs: usize,
) -> (Vec<RideCandidate>, Vec<ChairCandidate>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let rides = (0..rides)
        .map(|i| {
            let pickup = random_point(&mut rng);
            let destination = random_point(&mut rng);
            ride_at(&format!("r{i:02}"), i as i64 + 1, pickup, destination)
        })
        .collect();
    let chairs = (0..chairs)
        .map(|j| {
            let location = random_point(&mut rng);
            let speed = rng.gen_range(1..=5);
            chair_at(&format!("c{j:02}"), location, speed)
        })
        .collect();
    (rides, chairs)
}

/// Panics unless every ride and every chair appears at most once.
pub fn assert_one_to_one(pairings: &[Pairing]) {
    let mut rides = HashSet::new();
    let mut chairs = HashSet::new();
    for pairing in pairings {
        assert!(rides.insert(&pairing.ride_id), "ride {} paired twice", pairing.ride_id);
        assert!(chairs.insert(&pairing.chair_id), "chair {} paired twice", pairing.chair_id);
    }
}

pub fn destination_cost(pairings: &[Pairing], rides: &[RideCandidate], chairs: &[ChairCandidate]) -> i64 {
    pairings
        .iter()
        .map(|pairing| {
            let ride = rides
                .iter()
                .find(|ride| ride.id == pairing.ride_id)
                .expect("paired ride exists");
            let chair = chairs
                .iter()
                .find(|chair| chair.id == pairing.chair_id)
                .expect("paired chair exists");
            ride.destination.manhattan_distance(chair.location)
        })
        .sum()
}
