//! Contraction order heuristic: lower priority contracts sooner

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::meta_graph::MetaGraph;
use super::witness::{required_shortcuts, WitnessCalculator};
use crate::error::Result;

pub trait PriorityCalculator {
    /// Priority of `v` given which vertices are already contracted. Equal
    /// flags and notifications give equal answers.
    fn calculate(&mut self, graph: &MetaGraph, contracted: &[bool], v: u32) -> Result<i32>;

    /// Record that `v` was contracted.
    fn notify_contracted(&mut self, graph: &MetaGraph, v: u32);
}

/// Term weights of the edge-difference formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Multiplies `added - removed`
    pub difference: i32,
    /// Multiplies the number of contracted neighbors
    pub contracted: i32,
    /// Multiplies the hierarchy depth reached so far
    pub depth: i32,
}

impl Default for PriorityWeights {
    /// Contracted neighbors and depth pull a vertex forward in the queue.
    fn default() -> Self {
        Self {
            difference: 1,
            contracted: -1,
            depth: -2,
        }
    }
}

impl PriorityWeights {
    /// Contracted neighbors and depth push a vertex back, spreading
    /// contraction evenly over the graph.
    pub fn spreading() -> Self {
        Self {
            difference: 1,
            contracted: 1,
            depth: 2,
        }
    }
}

/// Edge difference plus contracted-neighbor and depth terms
pub struct EdgeDifferencePriorityCalculator<W> {
    witness: W,
    weights: PriorityWeights,
    contracted_neighbors: FxHashMap<u32, i32>,
    depth: FxHashMap<u32, i32>,
}

impl<W: WitnessCalculator> EdgeDifferencePriorityCalculator<W> {
    pub fn new(witness: W) -> Self {
        Self::with_weights(witness, PriorityWeights::default())
    }

    pub fn with_weights(witness: W, weights: PriorityWeights) -> Self {
        Self {
            witness,
            weights,
            contracted_neighbors: FxHashMap::default(),
            depth: FxHashMap::default(),
        }
    }

    pub fn weights(&self) -> PriorityWeights {
        self.weights
    }

    pub fn witness_mut(&mut self) -> &mut W {
        &mut self.witness
    }

    /// Depth recorded for `v`.
    pub fn depth(&self, v: u32) -> i32 {
        self.depth.get(&v).copied().unwrap_or(0)
    }

}

impl<W: WitnessCalculator> PriorityCalculator for EdgeDifferencePriorityCalculator<W> {
    fn calculate(&mut self, graph: &MetaGraph, contracted: &[bool], v: u32) -> Result<i32> {
        let is_contracted = |n: u32| contracted.get(n as usize).copied().unwrap_or(false);

        // entries neighbors hold for v, plus v's own entries to contracted neighbors
        let own = graph.edges(v);
        let removed = own.len() + own.iter().filter(|e| is_contracted(e.neighbor)).count();

        let incident = graph.incident(v, contracted);
        let added = 2 * required_shortcuts(graph, v, &incident, &mut self.witness)?.len();

        let count = self.contracted_neighbors.get(&v).copied().unwrap_or(0);
        let depth = self.depth(v);

        Ok(self.weights.difference * (added as i32 - removed as i32)
            + self.weights.contracted * count
            + self.weights.depth * depth)
    }

    fn notify_contracted(&mut self, graph: &MetaGraph, v: u32) {
        let next_depth = self.depth(v) + 1;
        let mut seen = FxHashSet::default();
        for edge in graph.edges(v) {
            let n = edge.neighbor;
            if !seen.insert(n) {
                continue;
            }
            *self.contracted_neighbors.entry(n).or_insert(0) += 1;
            let depth = self.depth.entry(n).or_insert(0);
            if *depth < next_depth {
                *depth = next_depth;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracted::witness::fixed::FixedWitnesses;
    use crate::profile::FactorDirection;

    fn meta(n: u32, edges: &[(u32, u32, f32, FactorDirection)]) -> MetaGraph {
        let mut meta = MetaGraph::with_vertices(n);
        for &(from, to, weight, direction) in edges {
            meta.add_edge(from, to, weight, direction, None).unwrap();
        }
        meta
    }

    fn no_witnesses() -> EdgeDifferencePriorityCalculator<FixedWitnesses> {
        EdgeDifferencePriorityCalculator::new(FixedWitnesses::default())
    }

    fn spreading() -> EdgeDifferencePriorityCalculator<FixedWitnesses> {
        EdgeDifferencePriorityCalculator::with_weights(
            FixedWitnesses::default(),
            PriorityWeights::spreading(),
        )
    }

    use FactorDirection::{Backward, Both, Forward};

    #[test]
    fn isolated_vertex_is_zero() {
        let graph = meta(2, &[]);
        assert_eq!(no_witnesses().calculate(&graph, &[false; 2], 0).unwrap(), 0);
    }

    #[test]
    fn single_neighbor_is_a_pure_win() {
        let graph = meta(2, &[(0, 1, 100.0, Both)]);
        assert_eq!(no_witnesses().calculate(&graph, &[false; 2], 0).unwrap(), -1);
    }

    #[test]
    fn neighbor_count_drives_priority() {
        let two = meta(3, &[(0, 1, 100.0, Both), (0, 2, 100.0, Both)]);
        assert_eq!(no_witnesses().calculate(&two, &[false; 3], 0).unwrap(), 0);

        let three = meta(4, &[(0, 1, 100.0, Both), (0, 2, 100.0, Both), (0, 3, 100.0, Both)]);
        assert_eq!(no_witnesses().calculate(&three, &[false; 4], 0).unwrap(), 3);
    }

    #[test]
    fn oneway_through_route_needs_one_shortcut() {
        // 2 -> 0 -> 1
        let graph = meta(3, &[(0, 1, 100.0, Forward), (0, 2, 100.0, Backward)]);
        assert_eq!(no_witnesses().calculate(&graph, &[false; 3], 0).unwrap(), 0);

        // 1 -> 0 -> 2
        let graph = meta(3, &[(0, 1, 100.0, Backward), (0, 2, 100.0, Forward)]);
        assert_eq!(no_witnesses().calculate(&graph, &[false; 3], 0).unwrap(), 0);
    }

    #[test]
    fn opposite_oneways_need_nothing() {
        // 0 -> 1 and 0 -> 2: nothing passes through 0
        let graph = meta(3, &[(0, 1, 100.0, Forward), (0, 2, 100.0, Forward)]);
        assert_eq!(no_witnesses().calculate(&graph, &[false; 3], 0).unwrap(), -2);
    }

    #[test]
    fn contracted_neighbors_are_removed() {
        let one = meta(2, &[(0, 1, 100.0, Forward)]);
        assert_eq!(no_witnesses().calculate(&one, &[false, true], 0).unwrap(), -2);

        let two = meta(3, &[(0, 1, 100.0, Both), (0, 2, 100.0, Both)]);
        let flags = [false, true, false];
        assert_eq!(no_witnesses().calculate(&two, &flags, 0).unwrap(), -3);
    }

    #[test]
    fn notify_lowers_priority_of_sole_neighbor() {
        let graph = meta(2, &[(0, 1, 100.0, Forward)]);
        let flags = [false, true];

        let mut calc = no_witnesses();
        let before = calc.calculate(&graph, &flags, 0).unwrap();
        calc.notify_contracted(&graph, 1);
        let after = calc.calculate(&graph, &flags, 0).unwrap();
        assert_eq!(before, -2);
        assert_eq!(after, -5);
        assert!(after < before);
        assert_eq!(calc.depth(0), 1);
    }

    #[test]
    fn spreading_weights_push_neighbors_back() {
        let one = meta(2, &[(0, 1, 100.0, Forward)]);
        let mut calc = spreading();
        calc.notify_contracted(&one, 1);
        assert_eq!(calc.calculate(&one, &[false, true], 0).unwrap(), 1);

        let two = meta(3, &[(0, 1, 100.0, Both), (0, 2, 100.0, Both)]);
        let mut calc = spreading();
        calc.notify_contracted(&two, 1);
        assert_eq!(calc.calculate(&two, &[false, true, false], 0).unwrap(), 0);
    }

    #[test]
    fn notify_only_affects_direct_neighbors() {
        // 0 - 1 - 2 - 3
        let graph = meta(4, &[(0, 1, 1.0, Both), (1, 2, 1.0, Both), (2, 3, 1.0, Both)]);
        let flags = [false; 4];
        let mut calc = no_witnesses();
        let far = calc.calculate(&graph, &flags, 3).unwrap();
        let near = calc.calculate(&graph, &flags, 2).unwrap();

        calc.notify_contracted(&graph, 1);
        assert_eq!(calc.calculate(&graph, &flags, 3).unwrap(), far);
        assert_ne!(calc.calculate(&graph, &flags, 2).unwrap(), near);
    }

    #[test]
    fn quadrilateral_with_unrelated_witnesses() {
        // 0 -> 2, 3 -> 0, 2 -> 1, 1 -> 3
        let graph = meta(
            4,
            &[
                (0, 2, 100.0, Forward),
                (0, 3, 10.0, Backward),
                (1, 2, 1000.0, Backward),
                (1, 3, 10000.0, Forward),
            ],
        );
        let flags = [false; 4];
        let witnesses = FixedWitnesses::new(&[(1, 3), (3, 0)]);
        let mut calc = EdgeDifferencePriorityCalculator::new(witnesses);
        for v in 0..4 {
            assert_eq!(calc.calculate(&graph, &flags, v).unwrap(), 0, "vertex {v}");
        }
    }

    #[test]
    fn quadrilateral_with_every_witness() {
        let graph = meta(
            4,
            &[
                (0, 2, 100.0, Forward),
                (0, 3, 10.0, Backward),
                (1, 2, 1000.0, Backward),
                (1, 3, 10000.0, Forward),
            ],
        );
        let flags = [false; 4];
        // through routes: 3->0->2, 2->1->3, 0->2->1, 1->3->0
        let mut calc = EdgeDifferencePriorityCalculator::new(FixedWitnesses::new(&[
            (3, 2),
            (2, 3),
            (0, 1),
            (1, 0),
        ]));
        for v in 0..4 {
            assert_eq!(calc.calculate(&graph, &flags, v).unwrap(), -2, "vertex {v}");
        }
    }

    #[test]
    fn calculate_is_repeatable() {
        let graph = meta(4, &[(0, 1, 100.0, Both), (0, 2, 100.0, Both), (0, 3, 100.0, Both)]);
        let flags = [false; 4];
        let mut calc = no_witnesses();
        let first = calc.calculate(&graph, &flags, 0).unwrap();
        assert_eq!(calc.calculate(&graph, &flags, 0).unwrap(), first);
    }

    #[test]
    fn calculate_follows_the_flags_it_is_given() {
        let graph = meta(3, &[(0, 1, 100.0, Both), (0, 2, 100.0, Both)]);
        let mut calc = no_witnesses();
        assert_eq!(calc.calculate(&graph, &[false; 3], 0).unwrap(), 0);
        assert_eq!(calc.calculate(&graph, &[false, true, false], 0).unwrap(), -3);
        assert_eq!(calc.calculate(&graph, &[false; 3], 0).unwrap(), 0);
    }
}
