use crate::model::{ChairCandidate, Pairing, RideCandidate};

/// Strategy that decides which chair serves which ride within one pass.
///
/// `rides` arrive oldest first and `chairs` already exclude busy ones. Every
/// strategy must give a chair at most one ride and a ride at most one chair.
pub trait MatchingStrategy: Send + Sync {
    /// Short stable name used in logs and pass reports.
    fn name(&self) -> &'static str;

    /// Best chair for a single ride, as an index into `chairs`.
    /// Ties go to the chair listed first.
    fn find_match(&self, ride: &RideCandidate, chairs: &[ChairCandidate]) -> Option<usize>;

    /// Cost recorded on a pairing this strategy produced.
    fn pairing_cost(&self, ride: &RideCandidate, chair: &ChairCandidate) -> i64 {
        ride.pickup.manhattan_distance(chair.location)
    }

    /// Pairings for the whole batch.
    ///
    /// The default walks rides oldest first and removes each chosen chair before
    /// moving on, so an older ride always gets first pick.
    fn find_batch_matches(
        &self,
        rides: &[RideCandidate],
        chairs: &[ChairCandidate],
    ) -> Vec<Pairing> {
        let mut remaining = chairs.to_vec();
        let mut pairings = Vec::new();

        for ride in rides {
            if remaining.is_empty() {
                break;
            }
            let Some(pick) = self.find_match(ride, &remaining) else {
                continue;
            };
            let chair = remaining.remove(pick);
            pairings.push(Pairing {
                ride_id: ride.id.clone(),
                chair_id: chair.id.clone(),
                cost: self.pairing_cost(ride, &chair),
            });
        }

        pairings
    }
}
