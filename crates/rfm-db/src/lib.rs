//! rfm-db - Migration ledger for rf-migrate
//!
//! This crate provides the `MigrationStore` trait the migration engine
//! consumes, a DuckDB implementation, and an in-memory double for tests.

pub mod duckdb;
pub mod error;
pub mod memory;
pub mod traits;

pub use crate::duckdb::DuckDbStore;
pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use traits::MigrationStore;
