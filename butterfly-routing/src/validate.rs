//! Validation of hierarchy correctness
//!
//! Compares hierarchy routes against an independent Dijkstra on the base
//! graph and checks that every unpacked route is a drivable walk.

use std::cmp::{Ordering, Reverse};

use priority_queue::PriorityQueue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::contracted::{ContractedRouter, MetaGraph};
use crate::error::{Result, RoutingError};
use crate::graph::{EdgeData, Graph};
use crate::profile::{Factor, FactorDirection, FactorTable, Profile};
use crate::search::UNBOUNDED;

/// Total order over costs for the decrease-key queue
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f32);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Single-source costs on the base graph (ground truth).
pub fn dijkstra_costs<P: Profile + ?Sized>(
    graph: &Graph,
    profile: &P,
    source: u32,
) -> FxHashMap<u32, f32> {
    let mut dist: FxHashMap<u32, f32> = FxHashMap::default();
    let mut pq: PriorityQueue<u32, Reverse<Cost>> = PriorityQueue::new();
    pq.push(source, Reverse(Cost(0.0)));

    while let Some((u, Reverse(Cost(d)))) = pq.pop() {
        dist.insert(u, d);
        for arc in graph.edges(u) {
            if dist.contains_key(&arc.neighbor) {
                continue;
            }
            let factor = profile.factor(arc.data.profile);
            if !factor.allows(arc.inverted, false) {
                continue;
            }
            let nd = d + factor.cost(arc.data.distance);
            pq.push_increase(arc.neighbor, Reverse(Cost(nd)));
        }
    }
    dist
}

/// Cost of walking `path` on the base graph, `None` if some step is not drivable.
pub fn path_cost<P: Profile + ?Sized>(graph: &Graph, profile: &P, path: &[u32]) -> Option<f32> {
    let mut total = 0.0f32;
    for pair in path.windows(2) {
        let step = graph
            .edges(pair[0])
            .iter()
            .filter(|a| a.neighbor == pair[1])
            .filter_map(|a| {
                let factor = profile.factor(a.data.profile);
                factor
                    .allows(a.inverted, false)
                    .then(|| factor.cost(a.data.distance))
            })
            .min_by(f32::total_cmp)?;
        total += step;
    }
    Some(total)
}

/// Profile ids used by [`random_grid`]
pub mod grid_profiles {
    pub const RESIDENTIAL: u16 = 0;
    pub const PRIMARY: u16 = 1;
    pub const ONEWAY: u16 = 2;
    pub const CLOSED: u16 = 3;
}

/// Car profile matching [`random_grid`]'s ids.
pub fn grid_profile() -> FactorTable {
    use grid_profiles::*;
    FactorTable::new()
        .with(RESIDENTIAL, Factor::from_speed_kmh(30.0))
        .with(PRIMARY, Factor::from_speed_kmh(80.0))
        .with(
            ONEWAY,
            Factor::from_speed_kmh(50.0).with_direction(FactorDirection::Forward),
        )
        .with(CLOSED, Factor::NO_ACCESS)
}

/// Street grid with random lengths, road classes and one-way orientation.
pub fn random_grid(width: u32, height: u32, seed: u64) -> Result<Graph> {
    use grid_profiles::*;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = Graph::with_capacity((width * height) as usize);
    for v in 0..width * height {
        graph.add_vertex(v)?;
    }

    let mut add = |graph: &mut Graph, a: u32, b: u32| -> Result<()> {
        let distance = rng.random_range(50.0f32..500.0);
        let profile = match rng.random_range(0..20u32) {
            0..=10 => RESIDENTIAL,
            11..=15 => PRIMARY,
            16..=18 => ONEWAY,
            _ => CLOSED,
        };
        let (from, to) = if rng.random_bool(0.5) { (a, b) } else { (b, a) };
        graph.add_edge(from, to, EdgeData::new(distance, profile))
    };

    for row in 0..height {
        for col in 0..width {
            let v = row * width + col;
            if col + 1 < width {
                add(&mut graph, v, v + 1)?;
            }
            if row + 1 < height {
                add(&mut graph, v, v + width)?;
            }
        }
    }
    graph.compress();
    Ok(graph)
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub source: u32,
    pub target: u32,
    pub dijkstra_cost: Option<f32>,
    pub ch_cost: Option<f32>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub n_tests: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unreachable_both: usize,
    /// First few mismatches
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.incorrect == 0
    }
}

const MAX_REPORTED: usize = 10;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0)
}

/// Run `n_tests` random queries through the hierarchy and check each one.
pub fn validate_ch<P: Profile + ?Sized>(
    graph: &Graph,
    profile: &P,
    meta: &MetaGraph,
    n_tests: usize,
    seed: u64,
) -> Result<ValidationResult> {
    let router = ContractedRouter::new(meta)?;
    let vertices: Vec<u32> = graph.vertices().collect();
    let mut result = ValidationResult {
        n_tests,
        ..ValidationResult::default()
    };
    if vertices.is_empty() {
        return Ok(result);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for i in 0..n_tests {
        let source = vertices[rng.random_range(0..vertices.len())];
        let target = vertices[rng.random_range(0..vertices.len())];

        let truth = dijkstra_costs(graph, profile, source).get(&target).copied();
        let route = match router.route(source, target, UNBOUNDED) {
            Ok(route) => Some(route),
            Err(e) if e.is_no_route() => None,
            Err(e) => return Err(e),
        };

        let failure = match (truth, &route) {
            (None, None) => {
                result.unreachable_both += 1;
                None
            }
            (Some(expected), Some(route)) if close(expected, route.cost) => {
                match path_cost(graph, profile, &route.vertices) {
                    _ if route.vertices.first() != Some(&source)
                        || route.vertices.last() != Some(&target) =>
                    {
                        Some("route does not join source and target".to_string())
                    }
                    None => Some("route uses a step that cannot be driven".to_string()),
                    Some(walked) if !close(walked, route.cost) => {
                        Some(format!("walked cost {walked} differs from route cost"))
                    }
                    Some(_) => None,
                }
            }
            _ => Some("cost mismatch".to_string()),
        };

        match failure {
            None => result.correct += 1,
            Some(reason) => {
                result.incorrect += 1;
                if result.errors.len() < MAX_REPORTED {
                    result.errors.push(ValidationError {
                        source,
                        target,
                        dijkstra_cost: truth,
                        ch_cost: route.as_ref().map(|r| r.cost),
                        reason,
                    });
                }
            }
        }

        if (i + 1) % 100 == 0 {
            tracing::info!(
                done = i + 1,
                total = n_tests,
                correct = result.correct,
                incorrect = result.incorrect,
                "Validation progress"
            );
        }
    }

    if !result.passed() {
        tracing::warn!(incorrect = result.incorrect, "Hierarchy validation failed");
    }
    Ok(result)
}

/// Convenience for callers that want an error on mismatch.
pub fn ensure_valid(result: &ValidationResult) -> Result<()> {
    match result.errors.first() {
        Some(first) if !result.passed() => Err(RoutingError::ContractionInconsistency {
            vertex: first.source,
            reason: format!(
                "{} of {} queries wrong, first {} -> {}: {}",
                result.incorrect, result.n_tests, first.source, first.target, first.reason
            ),
        }),
        _ => Ok(()),
    }
}
