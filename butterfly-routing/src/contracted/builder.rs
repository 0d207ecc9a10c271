//! Hierarchy construction: contract vertices in priority order with a lazy queue

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::meta_graph::MetaGraph;
use super::priority::{EdgeDifferencePriorityCalculator, PriorityCalculator, PriorityWeights};
use super::witness::{
    required_shortcuts, DykstraWitnessCalculator, WitnessCalculator, WitnessConfig,
};
use crate::error::{Result, RoutingError};
use crate::profile::FactorDirection;

/// Settings for [`contract`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractionConfig {
    pub witness: WitnessConfig,
    pub priority: PriorityWeights,
    /// Log progress every this many contracted vertices (0 disables)
    pub progress_interval: usize,
}

impl Default for ContractionConfig {
    fn default() -> Self {
        Self {
            witness: WitnessConfig::default(),
            priority: PriorityWeights::default(),
            progress_interval: 10_000,
        }
    }
}

/// Summary of one contraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContractionStats {
    pub vertices: usize,
    pub original_edges: usize,
    pub shortcuts: usize,
    /// Queue entries found stale and pushed back
    pub requeued: usize,
    pub elapsed_ms: u128,
}

/// Contract `graph` with the Dykstra witness search and edge-difference priority.
pub fn contract(
    graph: MetaGraph,
    config: &ContractionConfig,
) -> Result<(MetaGraph, ContractionStats)> {
    let priority = EdgeDifferencePriorityCalculator::with_weights(
        DykstraWitnessCalculator::new(config.witness),
        config.priority,
    );
    HierarchyBuilder::new(graph, priority, DykstraWitnessCalculator::new(config.witness))
        .with_progress_interval(config.progress_interval)
        .build()
}

/// Contraction loop over pluggable priority and witness calculators
pub struct HierarchyBuilder<P, W> {
    graph: MetaGraph,
    priority: P,
    witness: W,
    contracted: Vec<bool>,
    next_rank: u32,
    progress_interval: usize,
}

impl<P: PriorityCalculator, W: WitnessCalculator> HierarchyBuilder<P, W> {
    pub fn new(graph: MetaGraph, priority: P, witness: W) -> Self {
        let contracted = vec![false; graph.vertex_count()];
        Self {
            graph,
            priority,
            witness,
            contracted,
            next_rank: 0,
            progress_interval: 0,
        }
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn build(mut self) -> Result<(MetaGraph, ContractionStats)> {
        if self.graph.is_contracted() {
            return Err(RoutingError::AlreadyContracted);
        }
        let start = Instant::now();
        let original_edges = self.graph.original_edge_count();
        let vertices: Vec<u32> = self.graph.vertices().collect();

        tracing::info!(vertices = vertices.len(), original_edges, "Contracting");

        let mut queue: BinaryHeap<Reverse<(i32, u64, u32)>> =
            BinaryHeap::with_capacity(vertices.len());
        let mut seq = 0u64;
        for &v in &vertices {
            let priority = self.priority.calculate(&self.graph, &self.contracted, v)?;
            queue.push(Reverse((priority, seq, v)));
            seq += 1;
        }

        let mut requeued = 0usize;
        while let Some(Reverse((queued, _, v))) = queue.pop() {
            if self.contracted[v as usize] {
                continue;
            }
            let fresh = self.priority.calculate(&self.graph, &self.contracted, v)?;
            if fresh > queued {
                queue.push(Reverse((fresh, seq, v)));
                seq += 1;
                requeued += 1;
                continue;
            }
            self.contract_vertex(v)?;

            if self.progress_interval > 0 && self.next_rank as usize % self.progress_interval == 0 {
                tracing::info!(
                    contracted = self.next_rank,
                    total = vertices.len(),
                    shortcuts = self.graph.shortcut_count(),
                    "Contraction progress"
                );
            }
        }

        self.graph.seal();
        let stats = ContractionStats {
            vertices: vertices.len(),
            original_edges,
            shortcuts: self.graph.shortcut_count(),
            requeued,
            elapsed_ms: start.elapsed().as_millis(),
        };
        tracing::info!(
            vertices = stats.vertices,
            shortcuts = stats.shortcuts,
            requeued = stats.requeued,
            elapsed_ms = stats.elapsed_ms as u64,
            "Contraction complete"
        );
        Ok((self.graph, stats))
    }

    fn contract_vertex(&mut self, v: u32) -> Result<()> {
        let incident = self.graph.incident(v, &self.contracted);
        let shortcuts = required_shortcuts(&self.graph, v, &incident, &mut self.witness)?;

        for n in &incident {
            self.graph.remove_entries(n.vertex, v);
        }
        for shortcut in &shortcuts {
            match (shortcut.forward, shortcut.backward) {
                (Some(f), Some(b)) if f == b => {
                    self.graph.add_edge(
                        shortcut.from,
                        shortcut.to,
                        f,
                        FactorDirection::Both,
                        Some(v),
                    )?;
                }
                (f, b) => {
                    if let Some(f) = f {
                        self.graph.add_edge(
                            shortcut.from,
                            shortcut.to,
                            f,
                            FactorDirection::Forward,
                            Some(v),
                        )?;
                    }
                    if let Some(b) = b {
                        self.graph.add_edge(
                            shortcut.from,
                            shortcut.to,
                            b,
                            FactorDirection::Backward,
                            Some(v),
                        )?;
                    }
                }
            }
        }

        self.graph.set_rank(v, self.next_rank);
        self.next_rank += 1;
        self.contracted[v as usize] = true;
        self.priority.notify_contracted(&self.graph, v);

        tracing::trace!(
            vertex = v,
            neighbors = incident.len(),
            shortcuts = shortcuts.len(),
            "Contracted"
        );
        Ok(())
    }
}
