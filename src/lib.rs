//! Closure-table tree engine.
//!
//! Nodes live in a node table; every ancestor/descendant pair (including each
//! node with itself) lives in a closure relation with its distance, so root,
//! lineage and subtree queries never walk parent pointers.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::services::{
    BenchmarkOptions, BenchmarkRun, BenchmarkService, ClosureIndex, TreeGenerator, TreeStore,
};
pub use application::{ApplicationError, ApplicationResult, ReportFormat, Reporter, Sampler};
pub use config::Settings;
pub use domain::{DeleteMode, DomainError, NodeId, TreeShape};
