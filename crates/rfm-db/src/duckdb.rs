//! DuckDB migration store implementation

use crate::error::{is_duplicate_key, is_nested_transaction, DbError, DbResult};
use crate::traits::MigrationStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::Connection;
use rfm_core::MigrationRecord;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Schema holding the ledger table
pub const LEDGER_SCHEMA: &str = "rf_migrate";

/// URL prefix accepted in front of a DuckDB path
pub const URL_PREFIX: &str = "duckdb://";

/// `seq` breaks ties between rows stamped within the same clock tick.
const ENSURE_LEDGER_SQL: &str = "
    CREATE SCHEMA IF NOT EXISTS rf_migrate;
    CREATE SEQUENCE IF NOT EXISTS rf_migrate.migrations_seq;
    CREATE TABLE IF NOT EXISTS rf_migrate.migrations (
        hash          VARCHAR PRIMARY KEY,
        previous_hash VARCHAR,
        file_name     VARCHAR NOT NULL,
        date          TIMESTAMP NOT NULL DEFAULT now(),
        seq           BIGINT NOT NULL DEFAULT nextval('rf_migrate.migrations_seq')
    );";

const INSERT_RECORD_SQL: &str =
    "INSERT INTO rf_migrate.migrations (hash, previous_hash, file_name) VALUES (?, ?, ?)";

const SELECT_RECORDS_SQL: &str = "
    SELECT hash, previous_hash, file_name, epoch_us(date)
    FROM rf_migrate.migrations
    ORDER BY date ASC, seq ASC";

const SELECT_LAST_RECORD_SQL: &str = "
    SELECT hash, previous_hash, file_name, epoch_us(date)
    FROM rf_migrate.migrations
    ORDER BY date DESC, seq DESC
    LIMIT 1";

const DELETE_RECORD_SQL: &str = "DELETE FROM rf_migrate.migrations WHERE hash = ?";

/// Ledger row as read from DuckDB: hash, previous_hash, file_name, epoch micros
type RawRecord = (String, Option<String>, String, i64);

/// DuckDB migration store
pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::StoreUnavailable(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::StoreUnavailable(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from a database URL (`:memory:`, a path, or `duckdb://<path>`)
    pub fn new(url: &str) -> DbResult<Self> {
        let target = url.strip_prefix(URL_PREFIX).unwrap_or(url);
        if target.is_empty() {
            return Err(DbError::StoreUnavailable(format!(
                "database URL '{url}' names no database"
            )));
        }
        if target == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(target))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn ensure_schema_sync(&self) -> DbResult<()> {
        let conn = self.lock()?;
        log::debug!("Ensuring ledger table {LEDGER_SCHEMA}.migrations");
        conn.execute_batch(ENSURE_LEDGER_SQL).map_err(|e| {
            DbError::StoreUnavailable(format!("failed to create migrations table: {e}"))
        })
    }

    fn execute_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionFailed(e.to_string()))
    }

    fn record_applied_sync(
        &self,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        let conn = self.lock()?;
        with_transaction(&conn, |tx| {
            insert_record(tx, file_name, hash, previous_hash)
        })
    }

    fn apply_migration_sync(
        &self,
        sql: &str,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        let conn = self.lock()?;
        if manages_own_transaction(sql) {
            log::debug!("{file_name} controls its own transaction; recording it separately");
            return apply_then_record(&conn, sql, file_name, hash, previous_hash);
        }

        let mut nested = false;
        let result = with_transaction(&conn, |tx| {
            if let Err(e) = tx.execute_batch(sql) {
                nested = is_nested_transaction(&e);
                return Err(DbError::ExecutionFailed(e.to_string()));
            }
            insert_record(tx, file_name, hash, previous_hash)
        });
        if !nested {
            return result;
        }
        log::debug!("{file_name} opened a transaction; recording it separately");
        apply_then_record(&conn, sql, file_name, hash, previous_hash)
    }

    fn list_applied_sync(&self) -> DbResult<Vec<MigrationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(SELECT_RECORDS_SQL)
            .map_err(|e| DbError::QueryFailed(format!("failed to query migrations: {e}")))?;
        let raw: Vec<RawRecord> = stmt
            .query_map([], read_raw_record)
            .map_err(|e| DbError::QueryFailed(format!("failed to query migrations: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::QueryFailed(format!("failed to scan migration row: {e}")))?;
        raw.into_iter().map(to_record).collect()
    }

    fn remove_last_sync(&self) -> DbResult<MigrationRecord> {
        let conn = self.lock()?;
        let raw = with_transaction(&conn, |tx| {
            let last = {
                let mut stmt = tx.prepare(SELECT_LAST_RECORD_SQL).map_err(|e| {
                    DbError::QueryFailed(format!("failed to get last migration: {e}"))
                })?;
                let mut rows = stmt.query_map([], read_raw_record).map_err(|e| {
                    DbError::QueryFailed(format!("failed to get last migration: {e}"))
                })?;
                rows.next().transpose().map_err(|e| {
                    DbError::QueryFailed(format!("failed to scan migration row: {e}"))
                })?
            };
            let last = last.ok_or(DbError::NoMigrationsApplied)?;

            tx.execute(DELETE_RECORD_SQL, duckdb::params![last.0])
                .map_err(|e| DbError::QueryFailed(format!("failed to delete migration: {e}")))?;
            Ok(last)
        })?;
        to_record(raw)
    }
}

/// Run `body` inside `BEGIN` / `COMMIT`, rolling back on error
fn with_transaction<T, F>(conn: &Connection, body: F) -> DbResult<T>
where
    F: FnOnce(&Connection) -> DbResult<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::TransactionFailed(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(DbError::TransactionFailed(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

/// Run `sql` as-is, then insert its ledger row in a transaction of its own
fn apply_then_record(
    conn: &Connection,
    sql: &str,
    file_name: &str,
    hash: &str,
    previous_hash: Option<&str>,
) -> DbResult<()> {
    conn.execute_batch(sql)
        .map_err(|e| DbError::ExecutionFailed(e.to_string()))?;
    with_transaction(conn, |tx| insert_record(tx, file_name, hash, previous_hash))
}

/// Whether any statement in `sql` starts, ends or aborts a transaction.
///
/// Statements are split on `;` and leading `--` comment lines are skipped.
pub(crate) fn manages_own_transaction(sql: &str) -> bool {
    sql.split(';').any(|statement| {
        let keyword = statement
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with("--"))
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_ascii_uppercase();
        matches!(
            keyword.as_str(),
            "BEGIN" | "START" | "COMMIT" | "END" | "ROLLBACK" | "ABORT"
        )
    })
}

fn insert_record(
    conn: &Connection,
    file_name: &str,
    hash: &str,
    previous_hash: Option<&str>,
) -> DbResult<()> {
    conn.execute(
        INSERT_RECORD_SQL,
        duckdb::params![hash, previous_hash, file_name],
    )
    .map_err(|e| {
        if is_duplicate_key(&e) {
            DbError::DuplicateMigration {
                hash: hash.to_string(),
            }
        } else {
            DbError::QueryFailed(format!("failed to insert migration record: {e}"))
        }
    })?;
    Ok(())
}

fn read_raw_record(row: &duckdb::Row<'_>) -> duckdb::Result<RawRecord> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn to_record((hash, previous_hash, file_name, micros): RawRecord) -> DbResult<MigrationRecord> {
    let applied_at = DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| {
        DbError::QueryFailed(format!("invalid timestamp {micros} for {file_name}"))
    })?;
    Ok(MigrationRecord {
        hash,
        previous_hash,
        file_name,
        applied_at,
    })
}

#[async_trait]
impl MigrationStore for DuckDbStore {
    async fn ensure_schema(&self) -> DbResult<()> {
        self.ensure_schema_sync()
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        self.execute_sync(sql)
    }

    async fn record_applied(
        &self,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        self.record_applied_sync(file_name, hash, previous_hash)
    }

    async fn list_applied(&self) -> DbResult<Vec<MigrationRecord>> {
        self.list_applied_sync()
    }

    async fn remove_last(&self) -> DbResult<MigrationRecord> {
        self.remove_last_sync()
    }

    async fn apply_migration(
        &self,
        sql: &str,
        file_name: &str,
        hash: &str,
        previous_hash: Option<&str>,
    ) -> DbResult<()> {
        self.apply_migration_sync(sql, file_name, hash, previous_hash)
    }

    fn store_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
