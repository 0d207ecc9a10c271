//! Witness search: does a path avoiding the contracted vertex make a
//! shortcut unnecessary?

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::meta_graph::{Incident, MetaGraph};
use crate::error::{Result, RoutingError};
use crate::search::SearchState;

/// Candidate target of a witness search from some source `u`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WitnessTarget {
    pub vertex: u32,
    /// Shortcut cost `u -> vertex`
    pub forward_weight: f32,
    /// Shortcut cost `vertex -> u`
    pub backward_weight: f32,
}

/// Finds witnesses for a batch of targets sharing one source.
pub trait WitnessCalculator {
    /// Sets `forward[i]` when a path `source -> targets[i]` avoiding `skip`
    /// costs no more than `forward_weight`, and `backward[i]` likewise for
    /// `targets[i] -> source`. Flags already set are left untouched.
    fn calculate(
        &mut self,
        graph: &MetaGraph,
        source: u32,
        targets: &[WitnessTarget],
        skip: u32,
        forward: &mut [bool],
        backward: &mut [bool],
    ) -> Result<()>;

    fn has_witness(
        &mut self,
        graph: &MetaGraph,
        from: u32,
        to: u32,
        skip: u32,
        cost: f32,
    ) -> Result<bool> {
        let target = WitnessTarget {
            vertex: to,
            forward_weight: cost,
            backward_weight: f32::INFINITY,
        };
        let mut forward = [false];
        let mut backward = [true];
        self.calculate(graph, from, &[target], skip, &mut forward, &mut backward)?;
        Ok(forward[0])
    }
}

/// Limits for the local searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WitnessConfig {
    /// Give up (and keep the shortcut) after this many settles
    pub max_settles: usize,
    /// Do not expand paths longer than this many edges
    pub hop_limit: u32,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            max_settles: 1_000,
            hop_limit: 16,
        }
    }
}

/// Bounded Dykstra on the meta-graph, reusing its buffers across calls
#[derive(Debug, Clone)]
pub struct DykstraWitnessCalculator {
    config: WitnessConfig,
    state: SearchState,
    pending: FxHashMap<u32, usize>,
}

impl Default for DykstraWitnessCalculator {
    fn default() -> Self {
        Self::new(WitnessConfig::default())
    }
}

impl DykstraWitnessCalculator {
    pub fn new(config: WitnessConfig) -> Self {
        Self {
            config,
            state: SearchState::new(0.0),
            pending: FxHashMap::default(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &mut self,
        graph: &MetaGraph,
        source: u32,
        targets: &[WitnessTarget],
        skip: u32,
        resolved: &mut [bool],
        backward: bool,
        weight: fn(&WitnessTarget) -> f32,
    ) -> Result<()> {
        self.pending.clear();
        let mut bound = 0.0f32;
        for (i, target) in targets.iter().enumerate() {
            if resolved[i] {
                continue;
            }
            let w = weight(target);
            if w.is_nan() || w < 0.0 {
                return Err(RoutingError::ContractionInconsistency {
                    vertex: skip,
                    reason: format!("shortcut {source} -> {} has weight {w}", target.vertex),
                });
            }
            self.pending.insert(target.vertex, i);
            bound = bound.max(w);
        }
        if self.pending.is_empty() {
            return Ok(());
        }

        self.state.reset(bound);
        self.state.seed(source, 0.0);
        let mut settles = 0usize;

        while let Some(idx) = self.state.pop_unsettled() {
            let node = *self.state.tree().node(idx);
            if let Some(i) = self.pending.remove(&node.vertex) {
                if node.cost <= weight(&targets[i]) {
                    resolved[i] = true;
                }
                if self.pending.is_empty() {
                    break;
                }
            }

            settles += 1;
            if settles >= self.config.max_settles {
                break;
            }
            if node.hops >= self.config.hop_limit {
                continue;
            }

            for edge in graph.edges(node.vertex) {
                if edge.neighbor == skip {
                    continue;
                }
                let allowed = if backward {
                    edge.backward()
                } else {
                    edge.forward()
                };
                if !allowed {
                    continue;
                }
                self.state.relax(idx, edge.neighbor, node.cost + edge.weight);
            }
        }

        tracing::trace!(
            source,
            skip,
            backward,
            settles,
            unresolved = self.pending.len(),
            "Witness search"
        );
        Ok(())
    }
}

impl WitnessCalculator for DykstraWitnessCalculator {
    fn calculate(
        &mut self,
        graph: &MetaGraph,
        source: u32,
        targets: &[WitnessTarget],
        skip: u32,
        forward: &mut [bool],
        backward: &mut [bool],
    ) -> Result<()> {
        self.search(graph, source, targets, skip, forward, false, |t| {
            t.forward_weight
        })?;
        self.search(graph, source, targets, skip, backward, true, |t| {
            t.backward_weight
        })
    }
}

/// Shortcut required to contract a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shortcut {
    pub from: u32,
    pub to: u32,
    /// Cost `from -> to`, if that direction is needed
    pub forward: Option<f32>,
    /// Cost `to -> from`, if that direction is needed
    pub backward: Option<f32>,
}

/// Every neighbor pair of `center` that loses its cheapest route when
/// `center` goes away.
pub fn required_shortcuts<W: WitnessCalculator + ?Sized>(
    graph: &MetaGraph,
    center: u32,
    incident: &[Incident],
    witness: &mut W,
) -> Result<Vec<Shortcut>> {
    let mut shortcuts = Vec::new();
    let mut targets = Vec::with_capacity(incident.len());
    let mut forward = Vec::with_capacity(incident.len());
    let mut backward = Vec::with_capacity(incident.len());

    for (i, u) in incident.iter().enumerate() {
        targets.clear();
        forward.clear();
        backward.clear();

        for w in &incident[i + 1..] {
            let through = u.to_center.zip(w.from_center).map(|(a, b)| a + b);
            let back = w.to_center.zip(u.from_center).map(|(a, b)| a + b);
            targets.push(WitnessTarget {
                vertex: w.vertex,
                forward_weight: through.unwrap_or(f32::INFINITY),
                backward_weight: back.unwrap_or(f32::INFINITY),
            });
            // untraversable directions count as witnessed
            forward.push(through.is_none());
            backward.push(back.is_none());
        }
        if targets.is_empty() {
            continue;
        }

        witness.calculate(graph, u.vertex, &targets, center, &mut forward, &mut backward)?;

        for (j, target) in targets.iter().enumerate() {
            if forward[j] && backward[j] {
                continue;
            }
            shortcuts.push(Shortcut {
                from: u.vertex,
                to: target.vertex,
                forward: (!forward[j]).then_some(target.forward_weight),
                backward: (!backward[j]).then_some(target.backward_weight),
            });
        }
    }
    Ok(shortcuts)
}
