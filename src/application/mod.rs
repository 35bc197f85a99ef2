//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on the storage and clock boundary traits.

pub mod error;
pub mod report;
pub mod sampler;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use report::{ReportFormat, Reporter};
pub use sampler::{Sampler, Timed};
