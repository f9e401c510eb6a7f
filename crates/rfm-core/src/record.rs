//! Ledger entries for applied migrations and hash-chain verification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One applied migration as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Content digest of the migration file (primary key)
    pub hash: String,

    /// Digest of the chain predecessor, absent for the first record
    pub previous_hash: Option<String>,

    /// Name of the migration file inside the migrations directory
    pub file_name: String,

    /// When the migration was recorded
    pub applied_at: DateTime<Utc>,
}

/// First position where the ledger stops forming a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainBreak {
    /// Index of the offending record in application order
    pub position: usize,

    /// File name of the offending record
    pub file_name: String,

    /// Predecessor hash the record should carry
    pub expected: Option<String>,

    /// Predecessor hash the record actually carries
    pub found: Option<String>,
}

impl fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record #{} ({}) links to {} but its predecessor is {}",
            self.position,
            self.file_name,
            self.found.as_deref().unwrap_or("<none>"),
            self.expected.as_deref().unwrap_or("<none>")
        )
    }
}

/// Hash of the chain tail, or `None` when nothing has been applied
pub fn chain_tail(records: &[MigrationRecord]) -> Option<&str> {
    records.last().map(|r| r.hash.as_str())
}

/// Check that `records` (ordered by application time) form a hash chain.
///
/// Record 0 must have no predecessor; record `i` must point at record `i-1`.
pub fn verify_chain(records: &[MigrationRecord]) -> Result<(), ChainBreak> {
    let mut expected: Option<&str> = None;
    for (position, record) in records.iter().enumerate() {
        if record.previous_hash.as_deref() != expected {
            return Err(ChainBreak {
                position,
                file_name: record.file_name.clone(),
                expected: expected.map(String::from),
                found: record.previous_hash.clone(),
            });
        }
        expected = Some(&record.hash);
    }
    Ok(())
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
