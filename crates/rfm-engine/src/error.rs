//! Error types for rfm-engine

use rfm_core::CoreError;
use rfm_db::DbError;
use std::path::Path;
use thiserror::Error;

/// Migration lifecycle errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Caller passed an unusable argument; no I/O was performed (M001)
    #[error("[M001] Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Staging file is empty at commit time (M002)
    #[error("[M002] Nothing to commit: {path} is empty")]
    NothingToCommit { path: String },

    /// Ledger references a file that is absent on disk (M003)
    #[error("[M003] Migration file missing: '{path}' is recorded in the ledger but absent on disk")]
    MigrationFileMissing { path: String },

    /// Filesystem operation on a staging or migration file failed (M004)
    #[error("[M004] Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: String,
        source: std::io::Error,
    },

    /// The migration store reported an error (M005)
    #[error("[M005] {context}: {source}")]
    Store { context: String, source: DbError },

    /// The file-change subscription could not be established (M006)
    #[error("[M006] Failed to watch '{path}': {message}")]
    Watch { path: String, message: String },

    /// The ledger tail changed between reading and removing it (M007)
    #[error("[M007] Ledger changed during uncommit: expected to remove {expected}, removed {found}")]
    LedgerDiverged { expected: String, found: String },

    /// Catalog or layout error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// The underlying store error, if this error came from the store
    pub fn store_error(&self) -> Option<&DbError> {
        match self {
            MigrateError::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Wrap a [`DbError`] with the operation and target it interrupted
pub(crate) fn store_err(context: impl Into<String>) -> impl FnOnce(DbError) -> MigrateError {
    let context = context.into();
    move |source| MigrateError::Store { context, source }
}

/// Wrap an I/O error with the action and path it interrupted
pub(crate) fn io_err(
    action: &'static str,
    path: &Path,
) -> impl FnOnce(std::io::Error) -> MigrateError {
    let path = path.display().to_string();
    move |source| MigrateError::Io {
        action,
        path,
        source,
    }
}
