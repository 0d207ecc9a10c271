//! Single-direction best-first search over the base graph

use std::ops::ControlFlow;

use super::{DirectedSearch, SearchState, Seed, Settled};
use crate::error::{Result, RoutingError};
use crate::graph::Graph;
use crate::profile::Profile;

/// Dykstra search from one or more seeds.
///
/// With `backward` set the search follows arcs against their travel
/// direction, so settled costs are costs *to* the seeds.
pub struct Dykstra<'a, P: ?Sized> {
    graph: &'a Graph,
    profile: &'a P,
    backward: bool,
    state: SearchState,
}

impl<'a, P: Profile + ?Sized> Dykstra<'a, P> {
    pub fn new(
        graph: &'a Graph,
        profile: &'a P,
        seeds: &[Seed],
        max_cost: f32,
        backward: bool,
    ) -> Result<Self> {
        let mut state = SearchState::new(max_cost);
        for seed in seeds {
            if !graph.has_vertex(seed.vertex) {
                return Err(RoutingError::InvalidVertex(seed.vertex));
            }
            state.seed(seed.vertex, seed.cost);
        }
        Ok(Self {
            graph,
            profile,
            backward,
            state,
        })
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    /// Step until the queue drains or `visit` breaks.
    ///
    /// Returns `Break` if the callback stopped the run.
    pub fn run<F>(&mut self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(Settled) -> ControlFlow<()>,
    {
        while let Some(settled) = self.step() {
            visit(settled)?;
        }
        tracing::trace!(
            settled = self.state.settled_count(),
            bounded = self.state.was_bounded(),
            "Dykstra exhausted"
        );
        ControlFlow::Continue(())
    }
}

impl<P: Profile + ?Sized> DirectedSearch for Dykstra<'_, P> {
    fn state(&self) -> &SearchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    fn step(&mut self) -> Option<Settled> {
        let idx = self.state.pop_unsettled()?;
        let node = *self.state.tree().node(idx);

        for arc in self.graph.edges(node.vertex) {
            let factor = self.profile.factor(arc.data.profile);
            if !factor.allows(arc.inverted, self.backward) {
                continue;
            }
            let cost = node.cost + factor.cost(arc.data.distance);
            self.state.relax(idx, arc.neighbor, cost);
        }

        Some(Settled {
            vertex: node.vertex,
            cost: node.cost,
            node: idx,
        })
    }
}
