//! Read-only comparison of the ledger against the migrations directory

use rfm_core::{ChainBreak, MigrationRecord};
use serde::Serialize;

/// Snapshot produced by [`Migrator::status`](crate::Migrator::status)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Ledger rows, oldest first
    pub applied: Vec<MigrationRecord>,

    /// Migration files with no ledger row, in catalog order
    pub pending: Vec<String>,

    /// Ledger rows whose file is absent from disk
    pub missing_files: Vec<String>,

    /// Committed files whose current digest differs from the recorded hash
    pub drifted: Vec<String>,

    /// Where the ledger stops forming a hash chain, if it does
    pub chain_break: Option<ChainBreak>,

    /// Whether the staging file holds uncommitted SQL
    pub staged: bool,
}

impl MigrationStatus {
    /// No pending work and nothing inconsistent between disk and ledger
    pub fn is_clean(&self) -> bool {
        self.pending.is_empty()
            && self.missing_files.is_empty()
            && self.drifted.is_empty()
            && self.chain_break.is_none()
    }

    /// Hash of the most recently applied migration
    pub fn tail(&self) -> Option<&str> {
        rfm_core::chain_tail(&self.applied)
    }
}
