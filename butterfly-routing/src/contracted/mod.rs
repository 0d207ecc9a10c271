//! Contraction hierarchies
//!
//! `MetaGraph::from_graph` lifts a base graph into a meta-graph, [`contract`]
//! orders and contracts it, and [`ContractedRouter`] answers queries with an
//! upward bidirectional search followed by shortcut unpacking.

pub mod builder;
pub mod meta_graph;
pub mod priority;
pub mod query;
pub mod witness;

pub use builder::{contract, ContractionConfig, ContractionStats, HierarchyBuilder};
pub use meta_graph::{ContractedEdge, Incident, MetaGraph};
pub use priority::{EdgeDifferencePriorityCalculator, PriorityCalculator, PriorityWeights};
pub use query::{ContractedRouter, UpwardSearch};
pub use witness::{
    required_shortcuts, DykstraWitnessCalculator, Shortcut, WitnessCalculator, WitnessConfig,
    WitnessTarget,
};
