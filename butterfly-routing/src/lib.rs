//! Path search and contraction hierarchies over road graphs
//!
//! ```text
//! Graph + Profile ──► Dykstra / BidirectionalSearch      (plain queries)
//!        │
//!        └──► MetaGraph ──► contract() ──► ContractedRouter (hierarchy queries)
//! ```
//!
//! Graphs and meta-graphs are read-only once built; every search owns its
//! queue and settled state, so concurrent queries only share references.

pub mod config;
pub mod contracted;
pub mod error;
pub mod graph;
pub mod profile;
pub mod route;
pub mod search;
pub mod validate;

pub use config::RoutingConfig;
pub use contracted::{
    contract, ContractedRouter, ContractionConfig, ContractionStats, MetaGraph, PriorityWeights,
    WitnessConfig,
};
pub use error::{Result, RoutingError};
pub use graph::{Arc, EdgeData, Graph};
pub use profile::{Factor, FactorDirection, FactorTable, Profile};
pub use route::{build_search, route, Route};
pub use search::{BidirectionalSearch, DirectedSearch, Dykstra, Seed, Settled, UNBOUNDED};
