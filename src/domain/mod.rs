//! Domain layer: entities and business rules
//!
//! This layer is independent of external concerns (no storage, no CLI, no config loading).

pub mod benchmark;
pub mod entities;
pub mod error;

pub use benchmark::{
    AggregateConfig, BenchmarkSample, CreationResult, Metric, NodeSummary, ResultAggregate,
};
pub use entities::{ClosureEdge, DeleteMode, Node, NodeId, TreeShape};
pub use error::{DomainError, DomainResult};
