// Application layer - use cases and orchestration.
// Normalizes user input, drives the repository and runs limit checks
// after inserts commit.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
