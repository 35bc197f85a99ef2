//! Infrastructure layer: storage and clock implementations
//!
//! This layer implements the boundary traits the application services depend on.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{InfraError, InfraResult, StorageError, StorageResult};
pub use memory::{MemoryEdgeRelation, MemoryNodeTable};
pub use traits::{Clock, EdgeRelation, NodeTable, SystemClock, Transactional};
