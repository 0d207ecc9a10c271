//! Routing facade over the base graph

use serde::Serialize;

use crate::error::Result;
use crate::graph::Graph;
use crate::profile::Profile;
use crate::search::{BidirectionalSearch, Dykstra, Seed};

/// Vertex sequence from source to target and its total cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub vertices: Vec<u32>,
    pub cost: f32,
}

impl Route {
    pub fn source(&self) -> Option<u32> {
        self.vertices.first().copied()
    }

    pub fn target(&self) -> Option<u32> {
        self.vertices.last().copied()
    }
}

/// Search handle for one direction.
pub fn build_search<'a, P: Profile + ?Sized>(
    graph: &'a Graph,
    profile: &'a P,
    seeds: &[Seed],
    max_cost: f32,
    backward: bool,
) -> Result<Dykstra<'a, P>> {
    Dykstra::new(graph, profile, seeds, max_cost, backward)
}

/// Cheapest route between two vertices of the base graph.
pub fn route<P: Profile + ?Sized>(
    graph: &Graph,
    profile: &P,
    source: u32,
    target: u32,
    max_cost: f32,
) -> Result<Route> {
    let forward = build_search(graph, profile, &[Seed::at(source)], max_cost, false)?;
    let backward = build_search(graph, profile, &[Seed::at(target)], max_cost, true)?;
    let mut search = BidirectionalSearch::new(forward, backward);
    let meeting = search.run()?;
    Ok(Route {
        vertices: search.path()?,
        cost: meeting.cost,
    })
}
