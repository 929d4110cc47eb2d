//! Batch-optimal assignment as a min-cost max-flow problem.
//!
//! Rides and chairs form the two sides of a bipartite network:
//!
//! ```text
//! source ──(1, 0)──▶ ride ──(1, d(destination, chair))──▶ chair ──(1, 0)──▶ sink
//! ```
//!
//! Every ride→chair edge carrying a unit of flow becomes a pairing. The edge
//! cost is the distance from the ride's destination to the chair, so the batch
//! leaves chairs spread where the next requests will start rather than only
//! minimising the immediate pickup.

use tracing::trace;

use crate::model::{ChairCandidate, Pairing, RideCandidate};

use super::algorithm::MatchingStrategy;
use super::min_cost_flow::MinCostFlow;

#[derive(Debug, Default)]
pub struct FlowMatching;

impl FlowMatching {
    fn edge_cost(ride: &RideCandidate, chair: &ChairCandidate) -> i64 {
        ride.destination.manhattan_distance(chair.location)
    }
}

impl MatchingStrategy for FlowMatching {
    fn name(&self) -> &'static str {
        "flow"
    }

    fn find_match(&self, ride: &RideCandidate, chairs: &[ChairCandidate]) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for (idx, chair) in chairs.iter().enumerate() {
            let cost = Self::edge_cost(ride, chair);
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((idx, cost));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn pairing_cost(&self, ride: &RideCandidate, chair: &ChairCandidate) -> i64 {
        Self::edge_cost(ride, chair)
    }

    /// Solves the whole batch at once.
    ///
    /// When chairs are scarcer than rides only the oldest `chairs.len()` rides
    /// enter the network, so a newer ride can never take the last chair from an
    /// older one. Within that set the total cost is minimal.
    fn find_batch_matches(
        &self,
        rides: &[RideCandidate],
        chairs: &[ChairCandidate],
    ) -> Vec<Pairing> {
        if rides.is_empty() || chairs.is_empty() {
            return Vec::new();
        }

        let rides = &rides[..rides.len().min(chairs.len())];
        let source = 0;
        let ride_node = |i: usize| 1 + i;
        let chair_node = |j: usize| 1 + rides.len() + j;
        let sink = 1 + rides.len() + chairs.len();

        let mut graph = MinCostFlow::new(sink + 1);
        for i in 0..rides.len() {
            graph.add_edge(source, ride_node(i), 1, 0);
        }
        let mut ride_edges = Vec::with_capacity(rides.len() * chairs.len());
        for (i, ride) in rides.iter().enumerate() {
            for (j, chair) in chairs.iter().enumerate() {
                let edge = graph.add_edge(ride_node(i), chair_node(j), 1, Self::edge_cost(ride, chair));
                ride_edges.push((i, j, edge));
            }
        }
        for j in 0..chairs.len() {
            graph.add_edge(chair_node(j), sink, 1, 0);
        }

        let summary = graph.solve(source, sink, rides.len() as i64);
        trace!(flow = summary.flow, cost = summary.cost, "solved assignment network");

        ride_edges
            .into_iter()
            .filter(|(_, _, edge)| graph.flow(*edge) > 0)
            .map(|(i, j, _)| Pairing {
                ride_id: rides[i].id.clone(),
                chair_id: chairs[j].id.clone(),
                cost: Self::edge_cost(&rides[i], &chairs[j]),
            })
            .collect()
    }
}
