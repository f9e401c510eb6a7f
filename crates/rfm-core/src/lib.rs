//! rfm-core - Core library for rf-migrate
//!
//! This crate provides the content hasher, the migration file catalog, the
//! ledger record type with chain verification, the on-disk layout of a
//! migration directory, and configuration resolution.

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod error;
pub mod layout;
pub mod record;

pub use catalog::{list_migration_files, migration_file_name};
pub use checksum::compute_checksum;
pub use config::{Config, ConfigOverrides};
pub use error::{CoreError, CoreResult};
pub use layout::MigrationLayout;
pub use record::{chain_tail, verify_chain, ChainBreak, MigrationRecord};
