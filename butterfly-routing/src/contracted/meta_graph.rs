//! Meta-graph: original edges plus shortcuts, with contraction ranks
//!
//! Every edge between two uncontracted vertices is stored at both ends, the
//! neighbor-side copy carrying the reversed direction. Contracting `v` drops
//! the copies its neighbors hold, so once the hierarchy is complete each
//! vertex keeps exactly its upward edges.

use crate::error::{Result, RoutingError};
use crate::graph::Graph;
use crate::profile::{FactorDirection, Profile};

const UNRANKED: u32 = u32::MAX;

/// Edge as seen from its owning vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractedEdge {
    pub neighbor: u32,
    pub weight: f32,
    /// Relative to `owner -> neighbor`
    pub direction: FactorDirection,
    /// Contracted vertex this shortcut bypasses; `None` for original edges
    pub via: Option<u32>,
}

impl ContractedEdge {
    /// Traversable `owner -> neighbor`.
    #[inline]
    pub fn forward(&self) -> bool {
        matches!(
            self.direction,
            FactorDirection::Forward | FactorDirection::Both
        )
    }

    /// Traversable `neighbor -> owner`.
    #[inline]
    pub fn backward(&self) -> bool {
        matches!(
            self.direction,
            FactorDirection::Backward | FactorDirection::Both
        )
    }

    pub fn is_shortcut(&self) -> bool {
        self.via.is_some()
    }
}

pub(crate) fn direction_of(forward: bool, backward: bool) -> FactorDirection {
    match (forward, backward) {
        (true, true) => FactorDirection::Both,
        (true, false) => FactorDirection::Forward,
        (false, true) => FactorDirection::Backward,
        (false, false) => FactorDirection::None,
    }
}

/// Cheapest connection between a vertex and one neighbor, per direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incident {
    pub vertex: u32,
    /// Cost of `vertex -> center`
    pub to_center: Option<f32>,
    /// Cost of `center -> vertex`
    pub from_center: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct MetaGraph {
    edges: Vec<Vec<ContractedEdge>>,
    exists: Vec<bool>,
    rank: Vec<u32>,
    contracted_count: usize,
    original_edges: usize,
    shortcuts: usize,
    sealed: bool,
}

fn min_opt(current: Option<f32>, candidate: f32) -> Option<f32> {
    Some(current.map_or(candidate, |c| c.min(candidate)))
}

impl MetaGraph {
    /// Meta-graph with vertices `0..vertices` and no edges.
    pub fn with_vertices(vertices: u32) -> Self {
        let n = vertices as usize;
        Self {
            edges: vec![Vec::new(); n],
            exists: vec![true; n],
            rank: vec![UNRANKED; n],
            ..Self::default()
        }
    }

    /// One mirrored edge per passable base edge, weighted by the profile.
    pub fn from_graph<P: Profile + ?Sized>(graph: &Graph, profile: &P) -> Result<Self> {
        let n = graph.vertex_count();
        let mut meta = Self {
            edges: vec![Vec::new(); n],
            exists: (0..n as u32).map(|v| graph.has_vertex(v)).collect(),
            rank: vec![UNRANKED; n],
            ..Self::default()
        };

        let mut skipped = 0usize;
        for v in graph.vertices() {
            for arc in graph.edges(v).iter().filter(|a| !a.inverted) {
                let factor = profile.factor(arc.data.profile);
                if !factor.is_passable() {
                    skipped += 1;
                    continue;
                }
                meta.add_edge(
                    v,
                    arc.neighbor,
                    factor.cost(arc.data.distance),
                    factor.direction,
                    None,
                )?;
            }
        }

        tracing::debug!(
            vertices = n,
            edges = meta.original_edges,
            skipped,
            "Built meta-graph"
        );
        Ok(meta)
    }

    #[inline]
    pub fn has_vertex(&self, v: u32) -> bool {
        self.exists.get(v as usize).copied().unwrap_or(false)
    }

    pub fn vertex_count(&self) -> usize {
        self.exists.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        self.exists
            .iter()
            .enumerate()
            .filter(|(_, e)| **e)
            .map(|(i, _)| i as u32)
    }

    #[inline]
    pub fn edges(&self, v: u32) -> &[ContractedEdge] {
        self.edges.get(v as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add-or-update `from -> to` in both endpoint lists, keeping the
    /// cheapest entry per direction. Returns false if existing entries
    /// already cover every requested direction at no higher weight.
    pub fn add_edge(
        &mut self,
        from: u32,
        to: u32,
        weight: f32,
        direction: FactorDirection,
        via: Option<u32>,
    ) -> Result<bool> {
        for v in [from, to] {
            if !self.has_vertex(v) {
                return Err(RoutingError::InvalidVertex(v));
            }
        }
        if from == to {
            return Err(RoutingError::InvalidEdge {
                from,
                to,
                reason: "self loops are not stored".into(),
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(RoutingError::InvalidEdge {
                from,
                to,
                reason: format!("weight {weight} is not a finite non-negative value"),
            });
        }
        if direction == FactorDirection::None {
            return Err(RoutingError::InvalidEdge {
                from,
                to,
                reason: "edge has no traversable direction".into(),
            });
        }

        let changed = upsert(&mut self.edges[from as usize], to, weight, direction, via);
        upsert(
            &mut self.edges[to as usize],
            from,
            weight,
            direction.reversed(),
            via,
        );
        if changed {
            if via.is_some() {
                self.shortcuts += 1;
            } else {
                self.original_edges += 1;
            }
        }
        Ok(changed)
    }

    /// Drop every entry between `from` and `to`, at both ends.
    pub fn remove_edges(&mut self, from: u32, to: u32) {
        self.remove_entries(from, to);
        self.remove_entries(to, from);
    }

    /// Drop the entries `owner` holds for `neighbor`.
    pub(crate) fn remove_entries(&mut self, owner: u32, neighbor: u32) {
        if let Some(list) = self.edges.get_mut(owner as usize) {
            list.retain(|e| e.neighbor != neighbor);
        }
    }

    /// Cheapest connections of `center`, one per neighbor, skipping
    /// neighbors flagged in `contracted`.
    pub fn incident(&self, center: u32, contracted: &[bool]) -> Vec<Incident> {
        let mut out: Vec<Incident> = Vec::new();
        for edge in self.edges(center) {
            if contracted.get(edge.neighbor as usize).copied().unwrap_or(false) {
                continue;
            }
            let idx = match out.iter().position(|i| i.vertex == edge.neighbor) {
                Some(idx) => idx,
                None => {
                    out.push(Incident {
                        vertex: edge.neighbor,
                        to_center: None,
                        from_center: None,
                    });
                    out.len() - 1
                }
            };
            let entry = &mut out[idx];
            if edge.forward() {
                entry.from_center = min_opt(entry.from_center, edge.weight);
            }
            if edge.backward() {
                entry.to_center = min_opt(entry.to_center, edge.weight);
            }
        }
        out
    }

    pub(crate) fn set_rank(&mut self, v: u32, rank: u32) {
        self.rank[v as usize] = rank;
        self.contracted_count += 1;
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    /// Contraction order of `v`, `None` while uncontracted.
    #[inline]
    pub fn rank(&self, v: u32) -> Option<u32> {
        match self.rank.get(v as usize) {
            Some(&r) if r != UNRANKED => Some(r),
            _ => None,
        }
    }

    /// True once the hierarchy has been fully built.
    pub fn is_contracted(&self) -> bool {
        self.sealed
    }

    pub fn contracted_count(&self) -> usize {
        self.contracted_count
    }

    pub fn original_edge_count(&self) -> usize {
        self.original_edges
    }

    pub fn shortcut_count(&self) -> usize {
        self.shortcuts
    }

    /// Cheapest entry traversable `a -> b`, looking in both lists.
    pub fn find_edge(&self, a: u32, b: u32) -> Option<ContractedEdge> {
        let own = self
            .edges(a)
            .iter()
            .filter(|e| e.neighbor == b && e.forward())
            .copied();
        let mirrored = self
            .edges(b)
            .iter()
            .filter(|e| e.neighbor == a && e.backward())
            .map(|e| ContractedEdge {
                neighbor: b,
                direction: e.direction.reversed(),
                ..*e
            });
        own.chain(mirrored)
            .min_by(|x, y| x.weight.total_cmp(&y.weight))
    }

    /// Expand every shortcut on `path` down to original edges.
    pub fn unpack(&self, path: &[u32]) -> Result<Vec<u32>> {
        let Some(&first) = path.first() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(path.len());
        out.push(first);

        let mut stack: Vec<(u32, u32)> = Vec::new();
        for pair in path.windows(2) {
            stack.push((pair[0], pair[1]));
            while let Some((a, b)) = stack.pop() {
                let edge = self.find_edge(a, b).ok_or_else(|| RoutingError::InvalidEdge {
                    from: a,
                    to: b,
                    reason: "no traversable edge in the hierarchy".into(),
                })?;
                match edge.via {
                    None => out.push(b),
                    Some(via) => {
                        stack.push((via, b));
                        stack.push((a, via));
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Keep the cheapest entry per direction for `neighbor` in one list.
fn upsert(
    list: &mut Vec<ContractedEdge>,
    neighbor: u32,
    weight: f32,
    direction: FactorDirection,
    via: Option<u32>,
) -> bool {
    let probe = ContractedEdge {
        neighbor,
        weight,
        direction,
        via,
    };
    let mut want_forward = probe.forward();
    let mut want_backward = probe.backward();
    for e in list.iter().filter(|e| e.neighbor == neighbor) {
        if e.weight <= weight {
            want_forward &= !e.forward();
            want_backward &= !e.backward();
        }
    }
    if !want_forward && !want_backward {
        return false;
    }

    // strip the directions about to be replaced
    list.retain_mut(|e| {
        if e.neighbor != neighbor {
            return true;
        }
        let direction =
            direction_of(e.forward() && !want_forward, e.backward() && !want_backward);
        e.direction = direction;
        direction != FactorDirection::None
    });

    let wanted = direction_of(want_forward, want_backward);
    match list
        .iter_mut()
        .find(|e| e.neighbor == neighbor && e.weight == weight && e.via == via)
    {
        Some(twin) => twin.direction = FactorDirection::Both,
        None => list.push(ContractedEdge {
            direction: wanted,
            ..probe
        }),
    }
    true
}
