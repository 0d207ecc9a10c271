//! Error types for butterfly-routing
//!
//! Query-time "no route" outcomes and fatal build-time failures share one enum.
//! Use [`RoutingError::is_no_route`] to tell them apart.

use thiserror::Error;

/// Main error type for graph building, search and contraction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    /// A vertex id that was never added to the graph
    #[error("vertex {0} does not exist")]
    InvalidVertex(u32),

    /// An edge that cannot be stored (self loop, bad distance)
    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge { from: u32, to: u32, reason: String },

    /// Mutation attempted after `compress()`
    #[error("graph is compressed and no longer accepts vertices or edges")]
    GraphSealed,

    /// The search finished without connecting source and target
    #[error("no path found")]
    NoPathFound,

    /// The search was cut off by its max-cost bound before connecting
    #[error("no path found within max cost {max_cost}")]
    MaxCostExceeded { max_cost: f32 },

    /// Result accessor used before `run()` completed
    #[error("search has not been run")]
    NotRun,

    /// `contract()` called on an already contracted meta-graph
    #[error("meta-graph is already contracted")]
    AlreadyContracted,

    /// Hierarchy query on a meta-graph that was never contracted
    #[error("meta-graph has not been contracted")]
    NotContracted,

    /// Cost anomaly found while preprocessing (negative or non-finite weight)
    #[error("contraction inconsistency at vertex {vertex}: {reason}")]
    ContractionInconsistency { vertex: u32, reason: String },

    /// Configuration could not be read or parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RoutingError {
    /// True for the recoverable "no route" family.
    pub fn is_no_route(&self) -> bool {
        matches!(
            self,
            RoutingError::NoPathFound | RoutingError::MaxCostExceeded { .. }
        )
    }
}

impl From<std::io::Error> for RoutingError {
    fn from(err: std::io::Error) -> Self {
        RoutingError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::Config(err.to_string())
    }
}

/// Convenience result type for butterfly-routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;
