//! Fare and trip-time estimates used by the revenue-rate scorer.

use serde::{Deserialize, Serialize};

use crate::spatial::Coordinate;

/// Flat amount charged for every ride.
pub const BASE_FARE: i64 = 500;

/// Amount charged per grid unit between pickup and destination.
pub const PER_DISTANCE_RATE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareModel {
    pub base_fare: i64,
    pub per_distance: i64,
}

impl Default for FareModel {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            per_distance: PER_DISTANCE_RATE,
        }
    }
}

impl FareModel {
    /// `fare = base_fare + distance(pickup, destination) * per_distance`
    pub fn estimate_fare(&self, pickup: Coordinate, destination: Coordinate) -> i64 {
        self.base_fare + pickup.manhattan_distance(destination) * self.per_distance
    }

    /// Time for a chair at `chair` to reach the pickup and then the destination.
    ///
    /// Never returns less than one time unit, so a chair already parked on a
    /// zero-length ride still yields a finite rate.
    pub fn estimate_time(
        &self,
        chair: Coordinate,
        speed: i32,
        pickup: Coordinate,
        destination: Coordinate,
    ) -> f64 {
        let travel = chair.manhattan_distance(pickup) + pickup.manhattan_distance(destination);
        let speed = f64::from(speed.max(1));
        (travel as f64 / speed).max(1.0)
    }

    /// Revenue earned per unit of time if `chair` serves the ride.
    pub fn revenue_rate(
        &self,
        chair: Coordinate,
        speed: i32,
        pickup: Coordinate,
        destination: Coordinate,
    ) -> f64 {
        self.estimate_fare(pickup, destination) as f64
            / self.estimate_time(chair, speed, pickup, destination)
    }
}
