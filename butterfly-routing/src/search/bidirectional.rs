//! Bidirectional search: one forward and one backward directed search
//! stepped in turn until the meeting can no longer improve

use super::{DirectedSearch, Settled};
use crate::error::{Result, RoutingError};

/// When the interleaved searches may stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stopping {
    /// Stop once `frontier_f + frontier_b >= best`. Exact on the base graph.
    #[default]
    FrontierSum,
    /// Each side runs until its own frontier reaches `best`. Required for
    /// upward hierarchy searches, whose labels are not true distances.
    PerSide,
}

/// Best meeting found so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meeting {
    pub vertex: u32,
    pub cost: f32,
    forward_node: u32,
    backward_node: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Forward,
    Backward,
}

/// Couples two opposing [`DirectedSearch`]es
pub struct BidirectionalSearch<F, B> {
    forward: F,
    backward: B,
    stopping: Stopping,
    best: Option<Meeting>,
    has_run: bool,
}

impl<F: DirectedSearch, B: DirectedSearch> BidirectionalSearch<F, B> {
    pub fn new(forward: F, backward: B) -> Self {
        Self::with_stopping(forward, backward, Stopping::FrontierSum)
    }

    pub fn with_stopping(forward: F, backward: B, stopping: Stopping) -> Self {
        Self {
            forward,
            backward,
            stopping,
            best: None,
            has_run: false,
        }
    }

    /// Run to completion. `NoPathFound`/`MaxCostExceeded` are the normal
    /// no-route outcomes.
    pub fn run(&mut self) -> Result<Meeting> {
        let mut turn = Side::Forward;
        loop {
            let f_front = self.forward.frontier_cost();
            let b_front = self.backward.frontier_cost();

            let (f_live, b_live) = match (self.best, self.stopping) {
                (Some(best), Stopping::FrontierSum) => {
                    if f_front.unwrap_or(0.0) + b_front.unwrap_or(0.0) >= best.cost {
                        break;
                    }
                    (f_front.is_some(), b_front.is_some())
                }
                (Some(best), Stopping::PerSide) => (
                    f_front.is_some_and(|c| c < best.cost),
                    b_front.is_some_and(|c| c < best.cost),
                ),
                (None, _) => (f_front.is_some(), b_front.is_some()),
            };

            let side = match (f_live, b_live) {
                (false, false) => break,
                (true, false) => Side::Forward,
                (false, true) => Side::Backward,
                (true, true) => turn,
            };
            match side {
                Side::Forward => {
                    if let Some(settled) = self.forward.step() {
                        self.meet(settled, Side::Forward);
                    }
                    turn = Side::Backward;
                }
                Side::Backward => {
                    if let Some(settled) = self.backward.step() {
                        self.meet(settled, Side::Backward);
                    }
                    turn = Side::Forward;
                }
            }
        }
        self.has_run = true;

        tracing::trace!(
            forward_settled = self.forward.settled_count(),
            backward_settled = self.backward.settled_count(),
            found = self.best.is_some(),
            "Bidirectional search finished"
        );

        match self.best {
            Some(meeting) => Ok(meeting),
            None if self.forward.was_bounded() || self.backward.was_bounded() => {
                let max_cost = self
                    .forward
                    .state()
                    .max_cost()
                    .min(self.backward.state().max_cost());
                Err(RoutingError::MaxCostExceeded { max_cost })
            }
            None => Err(RoutingError::NoPathFound),
        }
    }

    /// Check the freshly settled vertex against the other side's labels,
    /// settled or tentative.
    fn meet(&mut self, settled: Settled, side: Side) {
        let other = match side {
            Side::Forward => self.backward.state(),
            Side::Backward => self.forward.state(),
        };
        let Some(other_node) = other.reached_node(settled.vertex) else {
            return;
        };
        let cost = settled.cost + other.tree().node(other_node).cost;
        if self.best.is_some_and(|b| b.cost <= cost) {
            return;
        }
        let (forward_node, backward_node) = match side {
            Side::Forward => (settled.node, other_node),
            Side::Backward => (other_node, settled.node),
        };
        self.best = Some(Meeting {
            vertex: settled.vertex,
            cost,
            forward_node,
            backward_node,
        });
    }

    pub fn has_run(&self) -> bool {
        self.has_run
    }

    pub fn has_succeeded(&self) -> bool {
        self.has_run && self.best.is_some()
    }

    pub fn best_vertex(&self) -> Option<u32> {
        self.best.map(|m| m.vertex)
    }

    pub fn best_cost(&self) -> Option<f32> {
        self.best.map(|m| m.cost)
    }

    /// Source-to-target vertices through the meeting vertex.
    pub fn path(&self) -> Result<Vec<u32>> {
        if !self.has_run {
            return Err(RoutingError::NotRun);
        }
        let meeting = self.best.ok_or(RoutingError::NoPathFound)?;

        let mut path = self.forward.state().tree().path_to(meeting.forward_node);
        let mut tail = self.backward.state().tree().path_to(meeting.backward_node);
        tail.reverse();
        path.extend(tail.into_iter().skip(1));
        Ok(path)
    }

    pub fn forward(&self) -> &F {
        &self.forward
    }

    pub fn backward(&self) -> &B {
        &self.backward
    }
}
