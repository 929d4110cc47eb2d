mod support;

use dispatch_core::matching::{FlowMatching, GreedyMatching, MatchingStrategy, NearestMatching};
use dispatch_core::model::{ChairCandidate, RideCandidate};
use dispatch_core::pricing::FareModel;
use dispatch_core::test_helpers::{chair_at, ride_at};
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

use support::{assert_one_to_one, destination_cost, random_snapshot};

fn all_strategies() -> Vec<Box<dyn MatchingStrategy>> {
    vec![
        Box::new(NearestMatching),
        Box::new(GreedyMatching::by_distance()),
        Box::new(GreedyMatching::by_revenue(FareModel::default())),
        Box::new(FlowMatching),
    ]
}

#[test]
fn flow_total_cost_matches_assignment_optimum() {
    for seed in 0..40 {
        let rides_n = 1 + (seed as usize % 5);
        let chairs_n = rides_n + (seed as usize % 4);
        let (rides, chairs) = random_snapshot(seed, rides_n, chairs_n);

        let weights = Matrix::from_rows(rides.iter().map(|ride| {
            chairs
                .iter()
                .map(|chair| ride.destination.manhattan_distance(chair.location))
                .collect::<Vec<i64>>()
        }))
        .expect("rectangular cost matrix");
        let (optimum, _) = kuhn_munkres_min(&weights);

        let pairings = FlowMatching.find_batch_matches(&rides, &chairs);
        assert_eq!(pairings.len(), rides.len(), "seed {seed}: every ride gets a chair");
        assert_one_to_one(&pairings);
        assert_eq!(
            destination_cost(&pairings, &rides, &chairs),
            optimum,
            "seed {seed}: flow cost must equal the assignment optimum"
        );
        let reported: i64 = pairings.iter().map(|p| p.cost).sum();
        assert_eq!(reported, optimum);
    }
}

#[test]
fn flow_never_costs_more_than_greedy_on_the_same_objective() {
    struct GreedyByDestination;
    impl MatchingStrategy for GreedyByDestination {
        fn name(&self) -> &'static str {
            "greedy-destination"
        }
        fn find_match(&self, ride: &RideCandidate, chairs: &[ChairCandidate]) -> Option<usize> {
            FlowMatching.find_match(ride, chairs)
        }
    }

    for seed in 100..140 {
        let (rides, chairs) = random_snapshot(seed, 5, 7);
        let flow = FlowMatching.find_batch_matches(&rides, &chairs);
        let greedy = GreedyByDestination.find_batch_matches(&rides, &chairs);
        assert!(
            destination_cost(&flow, &rides, &chairs) <= destination_cost(&greedy, &rides, &chairs),
            "seed {seed}"
        );
    }
}

#[test]
fn every_strategy_pairs_one_to_one() {
    for strategy in all_strategies() {
        for seed in 200..230 {
            let (rides, chairs) = random_snapshot(seed, 5, 1 + seed as usize % 7);
            let pairings = strategy.find_batch_matches(&rides, &chairs);
            assert_one_to_one(&pairings);
            assert!(pairings.len() <= rides.len().min(chairs.len()));
        }
    }
}

#[test]
fn oldest_ride_wins_a_single_chair_under_every_strategy() {
    for strategy in all_strategies() {
        for seed in 300..320 {
            let (rides, _) = random_snapshot(seed, 4, 0);
            let chair = vec![chair_at("only", (seed as i32 % 7, -(seed as i32 % 5)), 3)];
            let pairings = strategy.find_batch_matches(&rides, &chair);
            assert_eq!(pairings.len(), 1, "{} seed {seed}", strategy.name());
            assert_eq!(pairings[0].ride_id, rides[0].id, "{} seed {seed}", strategy.name());
        }
    }
}

#[test]
fn strategies_are_deterministic_for_fixed_input() {
    for strategy in all_strategies() {
        let (rides, chairs) = random_snapshot(7, 5, 6);
        let first = strategy.find_batch_matches(&rides, &chairs);
        let second = strategy.find_batch_matches(&rides, &chairs);
        assert_eq!(first, second, "{}", strategy.name());
    }
}

#[test]
fn example_scenario_per_strategy() {
    let rides = vec![ride_at("R1", 1, (0, 0), (0, 0)), ride_at("R2", 2, (10, 10), (10, 10))];
    let chairs = vec![chair_at("C1", (1, 1), 2), chair_at("C2", (9, 9), 2)];

    let nearest = NearestMatching.find_batch_matches(&rides, &chairs);
    assert_eq!(nearest.len(), 1);
    assert_eq!((nearest[0].ride_id.as_str(), nearest[0].chair_id.as_str()), ("R1", "C1"));
    assert_eq!(nearest[0].cost, 2);

    for strategy in [
        Box::new(GreedyMatching::by_distance()) as Box<dyn MatchingStrategy>,
        Box::new(FlowMatching) as Box<dyn MatchingStrategy>,
    ] {
        let pairings = strategy.find_batch_matches(&rides, &chairs);
        let pairs: Vec<(&str, &str)> = pairings
            .iter()
            .map(|p| (p.ride_id.as_str(), p.chair_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("R1", "C1"), ("R2", "C2")], "{}", strategy.name());
    }
}
