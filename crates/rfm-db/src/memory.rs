//! In-memory migration store.
//!
//! Keeps the ledger in a `Vec` and logs every SQL text it is asked to run
//! instead of running it. Used to exercise the migration engine without a
//! database; failures can be injected with [`MemoryStore::fail_when_sql_contains`].

use crate::error::{DbError, DbResult};
use crate::traits::MigrationStore;
use async_trait::async_trait;
use chrono::Utc;
use rfm_core::MigrationRecord;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    provisioned: bool,
    unavailable: bool,
    records: Vec<MigrationRecord>,
    executed: Vec<String>,
    rejected: Vec<String>,
    fail_markers: Vec<String>,
}

/// In-memory migration store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose `ensure_schema` always fails
    pub fn unavailable() -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.unavailable = true;
        }
        store
    }

    /// Make `execute` fail for any SQL containing `marker`
    pub fn fail_when_sql_contains(&self, marker: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_markers.push(marker.to_string());
        }
    }

    /// Clear injected failures
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_markers.clear();
        }
    }

    /// Every SQL text successfully executed, in order
    pub fn executed(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.executed.clone())
            .unwrap_or_default()
    }

    /// Every SQL text that hit an injected failure, in order
    pub fn rejected(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.rejected.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the ledger, oldest first
    pub fn records(&self) -> Vec<MigrationRecord> {
        self.state
            .lock()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Lock the state, requiring the ledger to have been provisioned
    fn ledger(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        let state = self.lock()?;
        if !state.provisioned {
            return Err(DbError::QueryFailed(
                "ledger table does not exist; call ensure_schema first".to_string(),
            ));
        }
        Ok(state)
    }
}

impl MemoryState {
    fn run(&mut self, sql: &str) -> DbResult<()> {
        if let Some(marker) = self.fail_markers.iter().find(|m| sql.contains(m.as_str())) {
            let err = DbError::ExecutionFailed(format!("simulated failure on '{marker}'"));
            self.rejected.push(sql.to_string());
            return Err(err);
        }
        self.executed.push(sql.to_string());
        Ok(())
    }

    fn check_unique(&self, hash: &str) -> DbResult<()> {
        if self.records.iter().any(|r| r.hash == hash) {
            return Err(DbError::DuplicateMigration {
                hash: hash.to_string(),
            });
        }
        Ok(())
    }

    fn push(&mut self, file_name: &str, hash: &str, previous_hash: Option<&str>) {
        self.records.push(MigrationRecord {
            hash: hash.to_string(),
            previous_hash: previous_hash.map(String::from),
            file_name: file_name.to_string(),
            applied_at: Utc::now(),
        });
    }
}

#[async_trait]
impl MigrationStore for MemoryStore {
    async fn ensure_schema(&self) -> DbResult<()> {
        let mut state = self.lock()?;
        if state.unavailable {
            return Err(DbError::StoreUnavailable(
                "memory store configured as unavailable".to_string(),
            ));
        }
        state.provisioned = true;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.lock()?.run(sql)
    }

    async fn record_applied(
        &self,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        let mut state = self.ledger()?;
        state.check_unique(hash)?;
        state.push(file_name, hash, previous_hash);
        Ok(())
    }

    async fn list_applied(&self) -> DbResult<Vec<MigrationRecord>> {
        Ok(self.ledger()?.records.clone())
    }

    async fn remove_last(&self) -> DbResult<MigrationRecord> {
        self.ledger()?
            .records
            .pop()
            .ok_or(DbError::NoMigrationsApplied)
    }

    async fn apply_migration(
        &self,
        sql: &str,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        let mut state = self.ledger()?;
        state.check_unique(hash)?;
        state.run(sql)?;
        state.push(file_name, hash, previous_hash);
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
