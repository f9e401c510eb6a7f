//! Migration store trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use rfm_core::MigrationRecord;

/// Durable ledger of applied migrations plus raw SQL execution
/// against the target database.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Idempotently create the ledger schema and table
    async fn ensure_schema(&self) -> DbResult<()>;

    /// Run SQL text against the target database as one batch
    async fn execute(&self, sql: &str) -> DbResult<()>;

    /// Insert a ledger row in its own transaction
    async fn record_applied(
        &self,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()>;

    /// All ledger rows, oldest first
    async fn list_applied(&self) -> DbResult<Vec<MigrationRecord>>;

    /// Delete and return the most recently applied row in one transaction
    async fn remove_last(&self) -> DbResult<MigrationRecord>;

    /// Execute migration SQL and record it.
    ///
    /// The default runs [`execute`](Self::execute) then
    /// [`record_applied`](Self::record_applied) as two steps; a failure
    /// between them leaves SQL applied but unrecorded. Stores that can
    /// should override this to do both in one transaction.
    async fn apply_migration(
        &self,
        sql: &str,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        self.execute(sql).await?;
        self.record_applied(file_name, hash, previous_hash).await
    }

    /// Store type identifier for logging
    fn store_type(&self) -> &'static str;
}
