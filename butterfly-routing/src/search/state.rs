//! Search tree arena and lazy min-queue shared by every directed search
//!
//! Paths are nodes in an index arena; a node's `parent` points at the node
//! it was relaxed from, so a settled vertex's path is a predecessor walk.
//! The heap holds `(cost, sequence, node)` entries and is never mutated in
//! place: a better label pushes a new entry and the old one is dropped when
//! it surfaces.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

/// Element of the search tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathNode {
    pub vertex: u32,
    /// Cumulative cost from the seed
    pub cost: f32,
    /// Predecessor node index, `None` for seeds
    pub parent: Option<u32>,
    /// Number of arcs from the seed
    pub hops: u32,
}

/// Arena of path nodes
#[derive(Debug, Clone, Default)]
pub struct PathTree {
    nodes: Vec<PathNode>,
}

impl PathTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_root(&mut self, vertex: u32, cost: f32) -> u32 {
        self.push(PathNode {
            vertex,
            cost,
            parent: None,
            hops: 0,
        })
    }

    pub fn push_child(&mut self, parent: u32, vertex: u32, cost: f32) -> u32 {
        let hops = self.nodes[parent as usize].hops + 1;
        self.push(PathNode {
            vertex,
            cost,
            parent: Some(parent),
            hops,
        })
    }

    fn push(&mut self, node: PathNode) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(node);
        idx
    }

    #[inline]
    pub fn node(&self, idx: u32) -> &PathNode {
        &self.nodes[idx as usize]
    }

    /// Vertices from the root down to `idx`.
    pub fn path_to(&self, idx: u32) -> Vec<u32> {
        let mut path = Vec::with_capacity(self.node(idx).hops as usize + 1);
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            let node = self.node(i);
            path.push(node.vertex);
            cursor = node.parent;
        }
        path.reverse();
        path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

/// Heap entry, ordered so that `BinaryHeap` pops the lowest `(cost, seq)`
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    cost: f32,
    seq: u64,
    node: u32,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Queue, labels and settled set of one directed search
#[derive(Debug, Clone)]
pub struct SearchState {
    tree: PathTree,
    heap: BinaryHeap<QueueEntry>,
    /// vertex -> node index of its final label
    settled: FxHashMap<u32, u32>,
    /// vertex -> node index of its best tentative label
    best: FxHashMap<u32, u32>,
    seq: u64,
    max_cost: f32,
    bounded: bool,
}

impl SearchState {
    pub fn new(max_cost: f32) -> Self {
        Self {
            tree: PathTree::new(),
            heap: BinaryHeap::with_capacity(64),
            settled: FxHashMap::default(),
            best: FxHashMap::default(),
            seq: 0,
            max_cost,
            bounded: false,
        }
    }

    /// Clear everything but keep allocations.
    pub fn reset(&mut self, max_cost: f32) {
        self.tree.clear();
        self.heap.clear();
        self.settled.clear();
        self.best.clear();
        self.seq = 0;
        self.max_cost = max_cost;
        self.bounded = false;
    }

    pub fn seed(&mut self, vertex: u32, cost: f32) {
        if cost > self.max_cost {
            self.bounded = true;
            return;
        }
        if self.label_cost(vertex).is_some_and(|c| c <= cost) {
            return;
        }
        let node = self.tree.push_root(vertex, cost);
        self.enqueue(vertex, node, cost);
    }

    /// Offer `vertex` at `cost` via `parent`. Returns true if the label improved.
    pub fn relax(&mut self, parent: u32, vertex: u32, cost: f32) -> bool {
        if cost > self.max_cost {
            self.bounded = true;
            return false;
        }
        if self.settled.contains_key(&vertex) {
            return false;
        }
        if self.label_cost(vertex).is_some_and(|c| c <= cost) {
            return false;
        }
        let node = self.tree.push_child(parent, vertex, cost);
        self.enqueue(vertex, node, cost);
        true
    }

    fn enqueue(&mut self, vertex: u32, node: u32, cost: f32) {
        self.best.insert(vertex, node);
        self.heap.push(QueueEntry {
            cost,
            seq: self.seq,
            node,
        });
        self.seq += 1;
    }

    fn label_cost(&self, vertex: u32) -> Option<f32> {
        self.best.get(&vertex).map(|&n| self.tree.node(n).cost)
    }

    fn is_live(&self, entry: &QueueEntry) -> bool {
        let vertex = self.tree.node(entry.node).vertex;
        !self.settled.contains_key(&vertex) && self.best.get(&vertex) == Some(&entry.node)
    }

    /// Pop and settle the cheapest live entry, returning its node index.
    pub fn pop_unsettled(&mut self) -> Option<u32> {
        while let Some(entry) = self.heap.pop() {
            if !self.is_live(&entry) {
                continue;
            }
            let vertex = self.tree.node(entry.node).vertex;
            self.settled.insert(vertex, entry.node);
            return Some(entry.node);
        }
        None
    }

    /// Cost of the next vertex to settle, discarding stale entries on top.
    pub fn frontier_cost(&mut self) -> Option<f32> {
        while let Some(top) = self.heap.peek() {
            if self.is_live(top) {
                return Some(top.cost);
            }
            self.heap.pop();
        }
        None
    }

    #[inline]
    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn settled_node(&self, vertex: u32) -> Option<u32> {
        self.settled.get(&vertex).copied()
    }

    pub fn settled_cost(&self, vertex: u32) -> Option<f32> {
        self.settled_node(vertex).map(|n| self.tree.node(n).cost)
    }

    /// Settled label if any, otherwise the best tentative one.
    pub fn reached_node(&self, vertex: u32) -> Option<u32> {
        self.settled_node(vertex)
            .or_else(|| self.best.get(&vertex).copied())
    }

    pub fn is_settled(&self, vertex: u32) -> bool {
        self.settled.contains_key(&vertex)
    }

    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    pub fn max_cost(&self) -> f32 {
        self.max_cost
    }

    /// True once the max-cost bound pruned at least one label.
    pub fn was_bounded(&self) -> bool {
        self.bounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_walks_predecessors() {
        let mut tree = PathTree::new();
        let root = tree.push_root(7, 0.0);
        let a = tree.push_child(root, 3, 1.0);
        let b = tree.push_child(a, 9, 2.5);
        assert_eq!(tree.path_to(b), vec![7, 3, 9]);
        assert_eq!(tree.node(b).hops, 2);
        assert_eq!(tree.path_to(root), vec![7]);
    }

    #[test]
    fn equal_costs_pop_in_insertion_order() {
        let mut state = SearchState::new(f32::INFINITY);
        state.seed(0, 0.0);
        let root = state.pop_unsettled().unwrap();
        state.relax(root, 5, 1.0);
        state.relax(root, 2, 1.0);
        state.relax(root, 8, 1.0);

        let mut order = Vec::new();
        while let Some(n) = state.pop_unsettled() {
            order.push(state.tree().node(n).vertex);
        }
        assert_eq!(order, vec![5, 2, 8]);
    }

    #[test]
    fn stale_entries_are_skipped() {
        let mut state = SearchState::new(f32::INFINITY);
        state.seed(0, 0.0);
        let root = state.pop_unsettled().unwrap();
        assert!(state.relax(root, 1, 10.0));
        assert!(state.relax(root, 1, 4.0));
        assert!(!state.relax(root, 1, 6.0));

        assert_eq!(state.frontier_cost(), Some(4.0));
        let node = state.pop_unsettled().unwrap();
        assert_eq!(state.tree().node(node).cost, 4.0);
        // the 10.0 entry is dead
        assert_eq!(state.pop_unsettled(), None);
        assert_eq!(state.frontier_cost(), None);
        assert_eq!(state.settled_cost(1), Some(4.0));
    }

    #[test]
    fn bound_prunes_and_is_reported() {
        let mut state = SearchState::new(5.0);
        state.seed(0, 0.0);
        let root = state.pop_unsettled().unwrap();
        assert!(!state.was_bounded());
        assert!(!state.relax(root, 1, 5.5));
        assert!(state.was_bounded());
        assert!(state.relax(root, 2, 5.0));
    }

    #[test]
    fn reset_reuses_buffers() {
        let mut state = SearchState::new(1.0);
        state.seed(0, 2.0);
        assert!(state.was_bounded());
        state.reset(f32::INFINITY);
        assert!(!state.was_bounded());
        state.seed(0, 2.0);
        assert_eq!(state.frontier_cost(), Some(2.0));
        assert_eq!(state.settled_count(), 0);
    }
}
