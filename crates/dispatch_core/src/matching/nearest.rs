use crate::model::{ChairCandidate, Pairing, RideCandidate};

use super::algorithm::MatchingStrategy;

/// Single-pair baseline: the oldest pending ride gets the chair nearest its pickup.
///
/// Produces at most one pairing per pass; the remaining rides wait for later
/// passes. Useful as a predictable reference when comparing batch strategies.
#[derive(Debug, Default)]
pub struct NearestMatching;

pub(crate) fn nearest_pickup(ride: &RideCandidate, chairs: &[ChairCandidate]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, chair) in chairs.iter().enumerate() {
        let distance = ride.pickup.manhattan_distance(chair.location);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}

impl MatchingStrategy for NearestMatching {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn find_match(&self, ride: &RideCandidate, chairs: &[ChairCandidate]) -> Option<usize> {
        nearest_pickup(ride, chairs)
    }

    fn find_batch_matches(
        &self,
        rides: &[RideCandidate],
        chairs: &[ChairCandidate],
    ) -> Vec<Pairing> {
        let Some(ride) = rides.first() else {
            return Vec::new();
        };
        self.find_match(ride, chairs)
            .map(|idx| Pairing {
                ride_id: ride.id.clone(),
                chair_id: chairs[idx].id.clone(),
                cost: self.pairing_cost(ride, &chairs[idx]),
            })
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{chair_at, ride_at};

    #[test]
    fn pairs_only_the_oldest_ride() {
        let rides = vec![ride_at("r1", 1, (0, 0), (5, 5)), ride_at("r2", 2, (10, 10), (0, 0))];
        let chairs = vec![chair_at("c1", (1, 1), 1), chair_at("c2", (9, 9), 1)];

        let pairings = NearestMatching.find_batch_matches(&rides, &chairs);
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings[0].ride_id.as_str(), "r1");
        assert_eq!(pairings[0].chair_id.as_str(), "c1");
        assert_eq!(pairings[0].cost, 2);
    }

    #[test]
    fn ties_go_to_first_listed_chair() {
        let ride = ride_at("r1", 1, (0, 0), (5, 5));
        let chairs = vec![chair_at("c1", (2, 0), 1), chair_at("c2", (0, 2), 1)];
        assert_eq!(NearestMatching.find_match(&ride, &chairs), Some(0));
    }

    #[test]
    fn empty_inputs_produce_nothing() {
        let ride = ride_at("r1", 1, (0, 0), (5, 5));
        assert!(NearestMatching.find_batch_matches(&[], &[chair_at("c1", (0, 0), 1)]).is_empty());
        assert!(NearestMatching.find_batch_matches(&[ride], &[]).is_empty());
    }
}
