//! Directed weighted graph with compact per-vertex adjacency
//!
//! Edges are stored once per endpoint. While building, each vertex owns a
//! growable arc list; `compress()` sorts and deduplicates the lists, flattens
//! them into CSR form and seals the graph.

use crate::error::{Result, RoutingError};

/// Inline per-edge cost blob
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    /// Length in meters
    pub distance: f32,
    /// Opaque profile id resolved through a [`crate::Profile`]
    pub profile: u16,
}

impl EdgeData {
    pub fn new(distance: f32, profile: u16) -> Self {
        Self { distance, profile }
    }
}

/// One stored arc. `inverted` is set on the copy held by the edge's `to` end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub neighbor: u32,
    pub data: EdgeData,
    pub inverted: bool,
}

#[derive(Debug, Clone, Default)]
enum Storage {
    Building(Vec<Vec<Arc>>),
    Compressed { offsets: Vec<u32>, arcs: Vec<Arc> },
    #[default]
    Empty,
}

/// Road graph consumed by the search engine
#[derive(Debug, Clone)]
pub struct Graph {
    exists: Vec<bool>,
    storage: Storage,
    edge_count: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            exists: Vec::with_capacity(vertices),
            storage: Storage::Building(Vec::with_capacity(vertices)),
            edge_count: 0,
        }
    }

    /// Make `id` addressable. Adding an existing vertex is a no-op.
    pub fn add_vertex(&mut self, id: u32) -> Result<()> {
        let Storage::Building(lists) = &mut self.storage else {
            return Err(RoutingError::GraphSealed);
        };
        let idx = id as usize;
        if idx >= self.exists.len() {
            self.exists.resize(idx + 1, false);
            lists.resize_with(idx + 1, Vec::new);
        }
        self.exists[idx] = true;
        Ok(())
    }

    pub fn add_edge(&mut self, from: u32, to: u32, data: EdgeData) -> Result<()> {
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
        if !data.distance.is_finite() || data.distance < 0.0 {
            return Err(RoutingError::InvalidEdge {
                from,
                to,
                reason: format!("distance {} is not a finite non-negative value", data.distance),
            });
        }
        let Storage::Building(lists) = &mut self.storage else {
            return Err(RoutingError::GraphSealed);
        };

        lists[from as usize].push(Arc {
            neighbor: to,
            data,
            inverted: false,
        });
        lists[to as usize].push(Arc {
            neighbor: from,
            data,
            inverted: true,
        });
        self.edge_count += 1;
        Ok(())
    }

    /// Sort every arc list, keep the shortest arc per
    /// `(neighbor, inverted, profile)` and flatten to CSR. Arcs with different
    /// profiles are all kept: their costs are only comparable under a
    /// [`crate::Profile`]. Calling it twice is harmless.
    pub fn compress(&mut self) {
        if !matches!(self.storage, Storage::Building(_)) {
            return;
        }
        let Storage::Building(lists) = std::mem::take(&mut self.storage) else {
            return;
        };

        let total: usize = lists.iter().map(Vec::len).sum();
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut arcs: Vec<Arc> = Vec::with_capacity(total);
        let mut forward_edges = 0usize;

        offsets.push(0u32);
        for mut list in lists {
            list.sort_by(|a, b| {
                (a.neighbor, a.inverted, a.data.profile)
                    .cmp(&(b.neighbor, b.inverted, b.data.profile))
                    .then(a.data.distance.total_cmp(&b.data.distance))
            });
            let start = arcs.len();
            for arc in list {
                if let Some(last) = arcs[start..].last() {
                    if last.neighbor == arc.neighbor
                        && last.inverted == arc.inverted
                        && last.data.profile == arc.data.profile
                    {
                        // sorted by distance within a class: first one wins
                        continue;
                    }
                }
                if !arc.inverted {
                    forward_edges += 1;
                }
                arcs.push(arc);
            }
            offsets.push(arcs.len() as u32);
        }

        tracing::debug!(
            vertices = offsets.len() - 1,
            edges_before = self.edge_count,
            edges_after = forward_edges,
            "Compressed graph"
        );

        self.edge_count = forward_edges;
        self.storage = Storage::Compressed { offsets, arcs };
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.storage, Storage::Compressed { .. })
    }

    #[inline]
    pub fn has_vertex(&self, v: u32) -> bool {
        self.exists.get(v as usize).copied().unwrap_or(false)
    }

    /// Number of addressable slots (highest id + 1).
    pub fn vertex_count(&self) -> usize {
        self.exists.len()
    }

    /// Number of logical edges (each stored at both endpoints).
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Arcs of `v`, sorted by `(neighbor, inverted, profile)` once compressed.
    /// Unknown ids yield an empty slice.
    #[inline]
    pub fn edges(&self, v: u32) -> &[Arc] {
        let idx = v as usize;
        match &self.storage {
            Storage::Building(lists) => lists.get(idx).map(Vec::as_slice).unwrap_or(&[]),
            Storage::Compressed { offsets, arcs } => {
                if idx + 1 >= offsets.len() {
                    return &[];
                }
                &arcs[offsets[idx] as usize..offsets[idx + 1] as usize]
            }
            Storage::Empty => &[],
        }
    }

    /// Whether an edge `from -> to` is stored, in its own orientation.
    pub fn contains_arc(&self, from: u32, to: u32) -> bool {
        let arcs = self.edges(from);
        if self.is_compressed() {
            arcs.binary_search_by(|a| (a.neighbor, a.inverted).cmp(&(to, false)))
                .is_ok()
        } else {
            arcs.iter().any(|a| a.neighbor == to && !a.inverted)
        }
    }

    /// Iterator over all existing vertex ids.
    pub fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        self.exists
            .iter()
            .enumerate()
            .filter(|(_, e)| **e)
            .map(|(i, _)| i as u32)
    }
}
