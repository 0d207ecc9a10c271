//! Best-first path search
//!
//! [`Dykstra`] walks the base graph; the contracted query walks the
//! meta-graph. Both expose [`DirectedSearch`] so [`BidirectionalSearch`]
//! is written once.

pub mod bidirectional;
pub mod dykstra;
pub mod state;

pub use bidirectional::{BidirectionalSearch, Meeting, Stopping};
pub use dykstra::Dykstra;
pub use state::{PathNode, PathTree, SearchState};

/// No max-cost bound
pub const UNBOUNDED: f32 = f32::INFINITY;

/// Initial path of a search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    pub vertex: u32,
    pub cost: f32,
}

impl Seed {
    pub fn new(vertex: u32, cost: f32) -> Self {
        Self { vertex, cost }
    }

    /// Seed with zero starting cost.
    pub fn at(vertex: u32) -> Self {
        Self { vertex, cost: 0.0 }
    }
}

/// Reported on every settle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settled {
    pub vertex: u32,
    pub cost: f32,
    /// Index into the search's [`PathTree`]
    pub node: u32,
}

/// One direction of a best-first search
pub trait DirectedSearch {
    fn state(&self) -> &SearchState;

    fn state_mut(&mut self) -> &mut SearchState;

    /// Settle the next vertex and relax its arcs.
    fn step(&mut self) -> Option<Settled>;

    fn frontier_cost(&mut self) -> Option<f32> {
        self.state_mut().frontier_cost()
    }

    fn settled_cost(&self, vertex: u32) -> Option<f32> {
        self.state().settled_cost(vertex)
    }

    /// Seed-first vertices leading to settled `vertex`.
    fn path_to(&self, vertex: u32) -> Option<Vec<u32>> {
        let state = self.state();
        state
            .settled_node(vertex)
            .map(|node| state.tree().path_to(node))
    }

    fn was_bounded(&self) -> bool {
        self.state().was_bounded()
    }

    fn settled_count(&self) -> usize {
        self.state().settled_count()
    }
}
