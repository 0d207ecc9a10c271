//! Point-to-point queries on a contracted meta-graph

use super::meta_graph::MetaGraph;
use crate::error::{Result, RoutingError};
use crate::route::Route;
use crate::search::{BidirectionalSearch, DirectedSearch, SearchState, Settled, Stopping};

/// Search that only climbs to higher-ranked vertices
pub struct UpwardSearch<'a> {
    graph: &'a MetaGraph,
    backward: bool,
    state: SearchState,
}

impl<'a> UpwardSearch<'a> {
    pub fn new(graph: &'a MetaGraph, seed: u32, max_cost: f32, backward: bool) -> Result<Self> {
        if !graph.has_vertex(seed) {
            return Err(RoutingError::InvalidVertex(seed));
        }
        let mut state = SearchState::new(max_cost);
        state.seed(seed, 0.0);
        Ok(Self {
            graph,
            backward,
            state,
        })
    }
}

impl DirectedSearch for UpwardSearch<'_> {
    fn state(&self) -> &SearchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    fn step(&mut self) -> Option<Settled> {
        let idx = self.state.pop_unsettled()?;
        let node = *self.state.tree().node(idx);
        let rank = self.graph.rank(node.vertex);

        for edge in self.graph.edges(node.vertex) {
            if self.graph.rank(edge.neighbor) <= rank {
                continue;
            }
            let allowed = if self.backward {
                edge.backward()
            } else {
                edge.forward()
            };
            if allowed {
                self.state.relax(idx, edge.neighbor, node.cost + edge.weight);
            }
        }

        Some(Settled {
            vertex: node.vertex,
            cost: node.cost,
            node: idx,
        })
    }
}

/// Shortest routes over a finished hierarchy
pub struct ContractedRouter<'a> {
    graph: &'a MetaGraph,
}

impl<'a> ContractedRouter<'a> {
    pub fn new(graph: &'a MetaGraph) -> Result<Self> {
        if !graph.is_contracted() {
            return Err(RoutingError::NotContracted);
        }
        Ok(Self { graph })
    }

    /// Upward search from both ends, then shortcut unpacking.
    pub fn route(&self, source: u32, target: u32, max_cost: f32) -> Result<Route> {
        let forward = UpwardSearch::new(self.graph, source, max_cost, false)?;
        let backward = UpwardSearch::new(self.graph, target, max_cost, true)?;
        let mut search = BidirectionalSearch::with_stopping(forward, backward, Stopping::PerSide);

        let meeting = search.run()?;
        let packed = search.path()?;
        let vertices = self.graph.unpack(&packed)?;

        tracing::debug!(
            source,
            target,
            cost = meeting.cost,
            packed = packed.len(),
            unpacked = vertices.len(),
            "Hierarchy route"
        );
        Ok(Route {
            vertices,
            cost: meeting.cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracted::{contract, ContractionConfig};
    use crate::profile::FactorDirection;
    use crate::search::UNBOUNDED;

    fn ring(n: u32) -> MetaGraph {
        let mut meta = MetaGraph::with_vertices(n);
        for v in 0..n {
            meta.add_edge(v, (v + 1) % n, 1.0, FactorDirection::Both, None).unwrap();
        }
        let (meta, _) = contract(meta, &ContractionConfig::default()).unwrap();
        meta
    }

    #[test]
    fn routes_around_a_ring() {
        let meta = ring(8);
        let router = ContractedRouter::new(&meta).unwrap();
        let route = router.route(0, 3, UNBOUNDED).unwrap();
        assert_eq!(route.cost, 3.0);
        assert_eq!(route.vertices, vec![0, 1, 2, 3]);

        let route = router.route(1, 6, UNBOUNDED).unwrap();
        assert_eq!(route.cost, 3.0);
        assert_eq!(route.vertices, vec![1, 0, 7, 6]);
    }

    #[test]
    fn source_is_target() {
        let meta = ring(4);
        let router = ContractedRouter::new(&meta).unwrap();
        let route = router.route(2, 2, UNBOUNDED).unwrap();
        assert_eq!(route.vertices, vec![2]);
        assert_eq!(route.cost, 0.0);
    }

    #[test]
    fn uncontracted_graph_is_refused() {
        let meta = MetaGraph::with_vertices(2);
        assert!(matches!(
            ContractedRouter::new(&meta),
            Err(RoutingError::NotContracted)
        ));
    }

    #[test]
    fn oneway_ring_goes_the_long_way() {
        let mut meta = MetaGraph::with_vertices(5);
        for v in 0..5 {
            meta.add_edge(v, (v + 1) % 5, 1.0, FactorDirection::Forward, None).unwrap();
        }
        let (meta, _) = contract(meta, &ContractionConfig::default()).unwrap();
        let router = ContractedRouter::new(&meta).unwrap();
        let route = router.route(1, 0, UNBOUNDED).unwrap();
        assert_eq!(route.cost, 4.0);
        assert_eq!(route.vertices, vec![1, 2, 3, 4, 0]);
    }

    #[test]
    fn unknown_vertex_is_rejected() {
        let meta = ring(3);
        let router = ContractedRouter::new(&meta).unwrap();
        assert_eq!(
            router.route(0, 10, UNBOUNDED).unwrap_err(),
            RoutingError::InvalidVertex(10)
        );
    }
}
