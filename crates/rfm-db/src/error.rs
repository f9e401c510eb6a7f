//! Error types for rfm-db

use thiserror::Error;

/// Migration ledger errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection or ledger provisioning failed (D001)
    #[error("[D001] Migration store unavailable: {0}")]
    StoreUnavailable(String),

    /// The database rejected migration SQL (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionFailed(String),

    /// Content digest already recorded in the ledger (D003)
    #[error("[D003] Migration with hash {hash} is already recorded")]
    DuplicateMigration { hash: String },

    /// Ledger is empty (D004)
    #[error("[D004] No migrations have been applied")]
    NoMigrationsApplied,

    /// Reading or writing ledger rows failed (D005)
    #[error("[D005] Ledger query failed: {0}")]
    QueryFailed(String),

    /// Transaction management error (D006)
    #[error("[D006] Ledger transaction failed: {0}")]
    TransactionFailed(String),

    /// Mutex poisoned (D007)
    #[error("[D007] Store mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

/// Whether a DuckDB error is a primary-key violation.
///
/// duckdb::Error does not expose structured constraint variants, so the
/// message is inspected. Covers both "Duplicate key" (1.x) and
/// "duplicated key" (0.x) wording.
pub(crate) fn is_duplicate_key(err: &duckdb::Error) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("duplicate") && msg.contains("key")
}

/// Whether DuckDB refused to open a transaction inside another one
pub(crate) fn is_nested_transaction(err: &duckdb::Error) -> bool {
    err.to_string()
        .to_lowercase()
        .contains("transaction within a transaction")
}
