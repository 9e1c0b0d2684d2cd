mod repository;
mod schema;

pub use repository::*;
pub use schema::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
