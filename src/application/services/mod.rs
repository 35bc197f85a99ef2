//! Application services
//!
//! Each service owns a specific domain of functionality.

pub mod benchmark;
pub mod closure;
pub mod generator;
pub mod tree_store;

pub use benchmark::{BenchmarkOptions, BenchmarkRun, BenchmarkService};
pub use closure::ClosureIndex;
pub use generator::{GeneratedTree, TreeGenerator};
pub use tree_store::TreeStore;
