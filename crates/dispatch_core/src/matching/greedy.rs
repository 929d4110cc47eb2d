use crate::model::{ChairCandidate, RideCandidate};
use crate::pricing::FareModel;

use super::algorithm::MatchingStrategy;
use super::nearest::nearest_pickup;

/// What the greedy pass optimises for each ride in turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GreedyObjective {
    /// Shortest distance from chair to pickup.
    PickupDistance,
    /// Highest estimated fare per unit of travel time.
    RevenueRate(FareModel),
}

/// Greedy batch matching.
///
/// Each ride, oldest first, takes the best chair still free in this pass. Runs in
/// O(rides × chairs) but is not optimal in aggregate: an early ride may take the
/// chair a later ride needed far more.
#[derive(Debug)]
pub struct GreedyMatching {
    pub objective: GreedyObjective,
}

impl GreedyMatching {
    pub fn by_distance() -> Self {
        Self {
            objective: GreedyObjective::PickupDistance,
        }
    }

    pub fn by_revenue(fare: FareModel) -> Self {
        Self {
            objective: GreedyObjective::RevenueRate(fare),
        }
    }
}

fn best_revenue_rate(
    fare: &FareModel,
    ride: &RideCandidate,
    chairs: &[ChairCandidate],
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, chair) in chairs.iter().enumerate() {
        let rate = fare.revenue_rate(chair.location, chair.speed, ride.pickup, ride.destination);
        if best.map_or(true, |(_, best_rate)| rate > best_rate) {
            best = Some((idx, rate));
        }
    }
    best.map(|(idx, _)| idx)
}

impl MatchingStrategy for GreedyMatching {
    fn name(&self) -> &'static str {
        match self.objective {
            GreedyObjective::PickupDistance => "greedy-distance",
            GreedyObjective::RevenueRate(_) => "greedy-revenue",
        }
    }

    fn find_match(&self, ride: &RideCandidate, chairs: &[ChairCandidate]) -> Option<usize> {
        match &self.objective {
            GreedyObjective::PickupDistance => nearest_pickup(ride, chairs),
            GreedyObjective::RevenueRate(fare) => best_revenue_rate(fare, ride, chairs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{chair_at, ride_at};

    #[test]
    fn pairs_every_ride_in_one_pass() {
        let rides = vec![ride_at("r1", 1, (0, 0), (5, 5)), ride_at("r2", 2, (10, 10), (0, 0))];
        let chairs = vec![chair_at("c1", (1, 1), 1), chair_at("c2", (9, 9), 1)];

        let pairings = GreedyMatching::by_distance().find_batch_matches(&rides, &chairs);
        let pairs: Vec<(&str, &str)> = pairings
            .iter()
            .map(|p| (p.ride_id.as_str(), p.chair_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("r1", "c1"), ("r2", "c2")]);
    }

    #[test]
    fn earlier_ride_can_block_a_better_later_pairing() {
        // r1 is equally close to both chairs and takes c1 first; r2 then has to
        // travel to c2 although c1 sits on its pickup.
        let rides = vec![ride_at("r1", 1, (5, 0), (5, 5)), ride_at("r2", 2, (0, 0), (5, 5))];
        let chairs = vec![chair_at("c1", (0, 0), 1), chair_at("c2", (10, 0), 1)];

        let pairings = GreedyMatching::by_distance().find_batch_matches(&rides, &chairs);
        assert_eq!(pairings[0].chair_id.as_str(), "c1");
        assert_eq!(pairings[1].chair_id.as_str(), "c2");
        assert_eq!(pairings[1].cost, 10);
    }

    #[test]
    fn revenue_rate_prefers_faster_chair_over_nearer_one() {
        let ride = ride_at("r1", 1, (0, 0), (20, 0));
        let chairs = vec![chair_at("slow", (1, 0), 1), chair_at("fast", (4, 0), 10)];

        let revenue = GreedyMatching::by_revenue(FareModel::default());
        assert_eq!(revenue.find_match(&ride, &chairs), Some(1));
        assert_eq!(GreedyMatching::by_distance().find_match(&ride, &chairs), Some(0));
    }

    #[test]
    fn chair_is_never_handed_out_twice() {
        let rides = vec![
            ride_at("r1", 1, (0, 0), (1, 1)),
            ride_at("r2", 2, (0, 0), (1, 1)),
            ride_at("r3", 3, (0, 0), (1, 1)),
        ];
        let chairs = vec![chair_at("c1", (0, 0), 1), chair_at("c2", (3, 3), 1)];

        let pairings =
            GreedyMatching::by_revenue(FareModel::default()).find_batch_matches(&rides, &chairs);
        assert_eq!(pairings.len(), 2);
        assert_ne!(pairings[0].chair_id, pairings[1].chair_id);
        assert_eq!(pairings[0].ride_id.as_str(), "r1");
        assert_eq!(pairings[1].ride_id.as_str(), "r2");
    }

    #[test]
    fn revenue_pairing_records_pickup_distance() {
        let rides = vec![ride_at("r1", 1, (0, 0), (20, 0))];
        let chairs = vec![chair_at("fast", (4, 3), 10)];

        let pairings =
            GreedyMatching::by_revenue(FareModel::default()).find_batch_matches(&rides, &chairs);
        assert_eq!(pairings[0].cost, 7);
    }
}
