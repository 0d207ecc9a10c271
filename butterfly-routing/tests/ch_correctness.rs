//! Hierarchy routes must match plain search on randomized grids

use std::ops::ControlFlow;

use butterfly_routing::contracted::{
    contract, ContractedRouter, ContractionConfig, MetaGraph, PriorityWeights,
};
use butterfly_routing::validate::{
    dijkstra_costs, grid_profile, path_cost, random_grid, validate_ch,
};
use butterfly_routing::{route, DirectedSearch, Dykstra, Seed, UNBOUNDED};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn bidirectional_matches_plain_search() {
    let graph = random_grid(7, 5, 3).unwrap();
    let profile = grid_profile();

    for source in [0u32, 12, 34] {
        let seeds = [Seed::at(source)];
        let mut plain = Dykstra::new(&graph, &profile, &seeds, UNBOUNDED, false).unwrap();
        let _ = plain.run(|_| ControlFlow::Continue(()));

        for target in graph.vertices() {
            match (plain.settled_cost(target), route(&graph, &profile, source, target, UNBOUNDED)) {
                (Some(expected), Ok(found)) => {
                    assert!(close(expected, found.cost), "{source} -> {target}");
                    let walked = path_cost(&graph, &profile, &found.vertices).unwrap();
                    assert!(close(walked, found.cost));
                    assert_eq!(found.source(), Some(source));
                    assert_eq!(found.target(), Some(target));
                }
                (None, Err(e)) => assert!(e.is_no_route()),
                (expected, found) => panic!("{source} -> {target}: {expected:?} vs {found:?}"),
            }
        }
    }
}

#[test]
fn plain_search_matches_ground_truth() {
    let graph = random_grid(6, 6, 11).unwrap();
    let profile = grid_profile();
    let truth = dijkstra_costs(&graph, &profile, 0);

    let mut plain = Dykstra::new(&graph, &profile, &[Seed::at(0)], UNBOUNDED, false).unwrap();
    let _ = plain.run(|_| ControlFlow::Continue(()));
    for v in graph.vertices() {
        match (truth.get(&v), plain.settled_cost(v)) {
            (Some(&a), Some(b)) => assert!(close(a, b), "vertex {v}"),
            (None, None) => {}
            other => panic!("vertex {v}: {other:?}"),
        }
    }
}

#[test]
fn contraction_preserves_distances() {
    for seed in [1u64, 2, 3] {
        let graph = random_grid(8, 8, seed).unwrap();
        let profile = grid_profile();
        let meta = MetaGraph::from_graph(&graph, &profile).unwrap();
        let (meta, stats) = contract(meta, &ContractionConfig::default()).unwrap();
        assert_eq!(stats.vertices, 64);

        let result = validate_ch(&graph, &profile, &meta, 150, seed).unwrap();
        assert!(result.passed(), "seed {seed}: {:?}", result.errors);
    }
}

#[test]
fn spreading_weights_also_preserve_distances() {
    let graph = random_grid(8, 6, 5).unwrap();
    let profile = grid_profile();
    let config = ContractionConfig {
        priority: PriorityWeights::spreading(),
        ..ContractionConfig::default()
    };
    let meta = MetaGraph::from_graph(&graph, &profile).unwrap();
    let (meta, _) = contract(meta, &config).unwrap();
    let result = validate_ch(&graph, &profile, &meta, 150, 5).unwrap();
    assert!(result.passed(), "{:?}", result.errors);
}

#[test]
fn tight_witness_limits_stay_exact() {
    let graph = random_grid(7, 7, 8).unwrap();
    let profile = grid_profile();
    let mut config = ContractionConfig::default();
    config.witness.max_settles = 3;
    config.witness.hop_limit = 1;

    let meta = MetaGraph::from_graph(&graph, &profile).unwrap();
    let (meta, _) = contract(meta, &config).unwrap();
    let result = validate_ch(&graph, &profile, &meta, 100, 8).unwrap();
    assert!(result.passed(), "{:?}", result.errors);
}

#[test]
fn every_source_target_pair_on_a_small_grid() {
    let graph = random_grid(4, 4, 21).unwrap();
    let profile = grid_profile();
    let meta = MetaGraph::from_graph(&graph, &profile).unwrap();
    let (meta, _) = contract(meta, &ContractionConfig::default()).unwrap();
    let router = ContractedRouter::new(&meta).unwrap();

    for source in graph.vertices() {
        let truth = dijkstra_costs(&graph, &profile, source);
        for target in graph.vertices() {
            match (truth.get(&target), router.route(source, target, UNBOUNDED)) {
                (Some(&expected), Ok(found)) => {
                    assert!(close(expected, found.cost), "{source} -> {target}");
                    let walked = path_cost(&graph, &profile, &found.vertices).unwrap();
                    assert!(close(walked, expected));
                }
                (None, Err(e)) => assert!(e.is_no_route()),
                (expected, found) => panic!("{source} -> {target}: {expected:?} vs {found:?}"),
            }
        }
    }
}
