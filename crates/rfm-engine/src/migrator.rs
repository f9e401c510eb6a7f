//! Migration lifecycle.
//!
//! The staging file is applied repeatedly while it is being written, then
//! committed into an immutable, timestamped migration file whose digest is
//! chained onto the ledger tail. `migrate` replays committed files that the
//! target database has not seen, and `uncommit` moves the newest migration
//! back into staging.

use crate::error::{io_err, store_err, MigrateError, MigrateResult};
use crate::status::MigrationStatus;
use crate::watcher::ChangeWatcher;
use chrono::Utc;
use rfm_core::{
    chain_tail, compute_checksum, list_migration_files, migration_file_name, verify_chain,
    MigrationLayout, MigrationRecord,
};
use rfm_db::{DbError, MigrationStore};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;

/// Result of [`Migrator::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Staged SQL was executed
    Applied { bytes: usize },
    /// Staging file held no SQL
    Empty,
}

/// A migration created by [`Migrator::commit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedMigration {
    pub file_name: String,
    pub hash: String,
    pub previous_hash: Option<String>,
}

/// Files applied by one [`Migrator::migrate`] run, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateSummary {
    pub applied: Vec<String>,
}

impl MigrateSummary {
    pub fn count(&self) -> usize {
        self.applied.len()
    }
}

/// Counters reported when [`Migrator::watch`] returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Successful reapplies after a change notification
    pub reapplied: usize,
    /// Reapplies that failed and were reported
    pub failed: usize,
    /// Errors delivered by the watcher itself
    pub watcher_errors: usize,
}

/// Drives the migration lifecycle against one store and one directory
pub struct Migrator {
    store: Arc<dyn MigrationStore>,
    layout: MigrationLayout,
}

impl Migrator {
    /// Provision the ledger and the on-disk layout.
    ///
    /// Fails with whatever the store reports when the ledger cannot be
    /// created.
    pub async fn new(
        store: Arc<dyn MigrationStore>,
        layout: MigrationLayout,
    ) -> MigrateResult<Self> {
        store
            .ensure_schema()
            .await
            .map_err(store_err("failed to provision migration ledger"))?;
        layout.ensure()?;
        log::debug!(
            "Using {} store with migrations in {}",
            store.store_type(),
            layout.root().display()
        );
        Ok(Self { store, layout })
    }

    pub fn layout(&self) -> &MigrationLayout {
        &self.layout
    }

    /// Execute the staged SQL without recording it.
    ///
    /// An empty staging file is a no-op.
    pub async fn apply(&self) -> MigrateResult<ApplyOutcome> {
        let sql = self.read_staging()?;
        if sql.is_empty() {
            log::debug!("{} is empty, nothing to apply", self.staging_display());
            return Ok(ApplyOutcome::Empty);
        }

        self.store
            .execute(&sql)
            .await
            .map_err(store_err(format!("failed to apply {}", self.staging_display())))?;
        log::info!("Applied {} ({} bytes)", self.staging_display(), sql.len());
        Ok(ApplyOutcome::Applied { bytes: sql.len() })
    }

    /// Freeze the staged SQL into a new migration chained onto the ledger tail.
    ///
    /// The migration file is written before the SQL runs. If the store then
    /// rejects the migration the file stays on disk, unrecorded, and the
    /// staging file is left as it was.
    pub async fn commit(&self, name: &str) -> MigrateResult<CommittedMigration> {
        if name.trim().is_empty() {
            return Err(MigrateError::InvalidArgument {
                message: "migration name must not be blank".to_string(),
            });
        }
        if name.contains(|c: char| c == '/' || c == '\\') {
            return Err(MigrateError::InvalidArgument {
                message: format!("migration name '{name}' must not contain path separators"),
            });
        }

        let sql = self.read_staging()?;
        if sql.is_empty() {
            return Err(MigrateError::NothingToCommit {
                path: self.staging_display(),
            });
        }

        let file_name = migration_file_name(Utc::now(), name);
        let hash = compute_checksum(sql.as_bytes());
        log::debug!("Computed hash {hash} for {file_name}");

        let applied = self
            .store
            .list_applied()
            .await
            .map_err(store_err("failed to read migration ledger"))?;
        let previous_hash = chain_tail(&applied).map(String::from);

        let path = self.layout.migration_path(&file_name);
        write_new_file(&path, &sql)?;

        if let Err(source) = self
            .store
            .apply_migration(&sql, &file_name, &hash, previous_hash.as_deref())
            .await
        {
            log::warn!(
                "{} was written but not recorded; remove it or commit again after fixing the SQL",
                path.display()
            );
            return Err(MigrateError::Store {
                context: format!("failed to apply migration {file_name}"),
                source,
            });
        }

        self.write_staging("")?;
        log::info!("Committed migration {file_name}");
        Ok(CommittedMigration {
            file_name,
            hash,
            previous_hash,
        })
    }

    /// Apply every migration file the ledger has not recorded, in catalog order.
    ///
    /// Each file is applied and recorded on its own, so a failure keeps
    /// everything applied earlier in the run and stops at the failing file.
    pub async fn migrate(&self) -> MigrateResult<MigrateSummary> {
        let records = self
            .store
            .list_applied()
            .await
            .map_err(store_err("failed to read migration ledger"))?;
        let recorded: HashSet<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
        let mut last_hash = chain_tail(&records).map(String::from);

        let files = list_migration_files(self.layout.migrations_dir())?;
        let mut summary = MigrateSummary::default();

        for file_name in files.iter().filter(|f| !recorded.contains(f.as_str())) {
            let path = self.layout.migration_path(file_name);
            let sql = fs::read_to_string(&path).map_err(io_err("read migration file", &path))?;
            let hash = compute_checksum(sql.as_bytes());

            self.store
                .apply_migration(&sql, file_name, &hash, last_hash.as_deref())
                .await
                .map_err(store_err(format!("failed to apply migration {file_name}")))?;
            log::info!("Applied migration {file_name}");

            last_hash = Some(hash);
            summary.applied.push(file_name.clone());
        }

        Ok(summary)
    }

    /// Move the newest migration back into staging.
    ///
    /// The migration's SQL is placed before whatever is currently staged.
    /// Its ledger row and file are removed; effects already applied to the
    /// database are not reverted.
    pub async fn uncommit(&self) -> MigrateResult<MigrationRecord> {
        let records = self
            .store
            .list_applied()
            .await
            .map_err(store_err("failed to read migration ledger"))?;
        let Some(tail) = records.last() else {
            return Err(MigrateError::Store {
                context: "nothing to uncommit".to_string(),
                source: DbError::NoMigrationsApplied,
            });
        };

        let path = self.layout.migration_path(&tail.file_name);
        let restored = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MigrateError::MigrationFileMissing {
                path: path.display().to_string(),
            },
            _ => io_err("read migration file", &path)(e),
        })?;
        let staged = self.read_staging()?;

        let removed = self
            .store
            .remove_last()
            .await
            .map_err(store_err(format!(
                "failed to remove {} from the ledger",
                tail.file_name
            )))?;
        if removed.hash != tail.hash {
            return Err(MigrateError::LedgerDiverged {
                expected: tail.file_name.clone(),
                found: removed.file_name,
            });
        }

        self.write_staging(&format!("{restored}{staged}"))?;
        fs::remove_file(&path).map_err(io_err("delete migration file", &path))?;
        log::info!("Uncommitted migration {}", removed.file_name);
        Ok(removed)
    }

    /// Apply the staging file, then reapply it on every change notification.
    ///
    /// Reapply failures and watcher errors are logged and counted but never
    /// end the loop. Returns once both notification streams have closed or
    /// the subscription handle is closed.
    pub async fn watch(&self, watcher: &dyn ChangeWatcher) -> MigrateResult<WatchStats> {
        let mut subscription = watcher.subscribe(self.layout.staging_file())?;
        let handle = subscription.handle();
        self.apply().await?;
        log::info!("Watching {} for changes", self.staging_display());

        let mut stats = WatchStats::default();
        let mut changes_open = true;
        let mut errors_open = true;

        while (changes_open || errors_open) && !handle.is_closed() {
            tokio::select! {
                _ = handle.closed() => break,
                change = subscription.changes.recv(), if changes_open => match change {
                    Some(change) => {
                        // Coalesce a burst of writes into one reapply
                        while subscription.changes.try_recv().is_ok() {}
                        log::info!("{} modified, reapplying", change.path.display());
                        match self.apply().await {
                            Ok(_) => stats.reapplied += 1,
                            Err(e) => {
                                stats.failed += 1;
                                log::error!("Error reapplying: {e}");
                            }
                        }
                    }
                    None => changes_open = false,
                },
                error = subscription.errors.recv(), if errors_open => match error {
                    Some(message) => {
                        stats.watcher_errors += 1;
                        log::warn!("Watcher error: {message}");
                    }
                    None => errors_open = false,
                },
            }
        }

        log::debug!(
            "Watch ended: {} reapplied, {} failed, {} watcher errors",
            stats.reapplied,
            stats.failed,
            stats.watcher_errors
        );
        Ok(stats)
    }

    /// Compare the ledger with the migrations directory without changing either.
    ///
    /// Committed files whose digest no longer matches the ledger are reported
    /// as drifted; nothing verifies digests when replaying or uncommitting.
    pub async fn status(&self) -> MigrateResult<MigrationStatus> {
        let applied = self
            .store
            .list_applied()
            .await
            .map_err(store_err("failed to read migration ledger"))?;
        let files = list_migration_files(self.layout.migrations_dir())?;

        let recorded: HashSet<&str> = applied.iter().map(|r| r.file_name.as_str()).collect();
        let pending: Vec<String> = files
            .into_iter()
            .filter(|f| !recorded.contains(f.as_str()))
            .collect();

        let mut missing_files = Vec::new();
        let mut drifted = Vec::new();
        for record in &applied {
            let path = self.layout.migration_path(&record.file_name);
            match fs::read(&path) {
                Ok(content) => {
                    if compute_checksum(&content) != record.hash {
                        drifted.push(record.file_name.clone());
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    missing_files.push(record.file_name.clone());
                }
                Err(e) => return Err(io_err("read migration file", &path)(e)),
            }
        }

        let chain_break = verify_chain(&applied).err();
        let staged = !self.read_staging()?.is_empty();

        Ok(MigrationStatus {
            applied,
            pending,
            missing_files,
            drifted,
            chain_break,
            staged,
        })
    }

    fn read_staging(&self) -> MigrateResult<String> {
        let path = self.layout.staging_file();
        fs::read_to_string(path).map_err(io_err("read staging file", path))
    }

    fn write_staging(&self, content: &str) -> MigrateResult<()> {
        let path = self.layout.staging_file();
        fs::write(path, content).map_err(io_err("write staging file", path))
    }

    fn staging_display(&self) -> String {
        self.layout.staging_file().display().to_string()
    }
}

/// Write `content` to a file that must not exist yet
fn write_new_file(path: &Path, content: &str) -> MigrateResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err("create migration file", path))?;
    file.write_all(content.as_bytes())
        .map_err(io_err("write migration file", path))
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
