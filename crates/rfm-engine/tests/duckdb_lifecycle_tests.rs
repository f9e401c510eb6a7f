//! End-to-end lifecycle against a real DuckDB store

use rfm_core::{list_migration_files, verify_chain, MigrationLayout};
use rfm_db::{DbError, DuckDbStore, MigrationStore};
use rfm_engine::{ApplyOutcome, MigrateError, Migrator};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

async fn open(db_path: &Path, root: &Path) -> (Arc<DuckDbStore>, Migrator) {
    let store = Arc::new(DuckDbStore::from_path(db_path).unwrap());
    let migrator = Migrator::new(store.clone(), MigrationLayout::new(root))
        .await
        .unwrap();
    (store, migrator)
}

fn stage(migrator: &Migrator, sql: &str) {
    fs::write(migrator.layout().staging_file(), sql).unwrap();
}

#[tokio::test]
async fn test_full_lifecycle() {
    let temp = tempdir().unwrap();
    let (store, migrator) = open(&temp.path().join("dev.duckdb"), temp.path()).await;

    stage(&migrator, "create table users(id int);");
    assert!(matches!(
        migrator.apply().await.unwrap(),
        ApplyOutcome::Applied { .. }
    ));
    // Apply left the table behind; drop it so the commit can create it again
    store.execute("drop table users;").await.unwrap();

    let first = migrator.commit("create users").await.unwrap();
    stage(&migrator, "alter table users add column email varchar;");
    let second = migrator.commit("add email").await.unwrap();
    assert_eq!(second.previous_hash.as_deref(), Some(first.hash.as_str()));

    store
        .execute("insert into users (id, email) values (1, 'a@example.com');")
        .await
        .unwrap();

    let records = store.list_applied().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(verify_chain(&records).is_ok());

    let removed = migrator.uncommit().await.unwrap();
    assert_eq!(removed.file_name, second.file_name);
    assert_eq!(
        fs::read_to_string(migrator.layout().staging_file()).unwrap(),
        "alter table users add column email varchar;"
    );
    assert_eq!(
        list_migration_files(migrator.layout().migrations_dir()).unwrap(),
        vec![first.file_name]
    );
    assert_eq!(store.list_applied().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_migrate_onto_fresh_database() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");

    {
        let (_, migrator) = open(&temp.path().join("dev.duckdb"), &root).await;
        stage(&migrator, "create table a(id int);");
        migrator.commit("a").await.unwrap();
        stage(&migrator, "create table b(id int);");
        migrator.commit("b").await.unwrap();
    }

    let (store, migrator) = open(&temp.path().join("ci.duckdb"), &root).await;
    let summary = migrator.migrate().await.unwrap();
    assert_eq!(summary.count(), 2);
    store.execute("insert into a values (1);").await.unwrap();
    store.execute("insert into b values (1);").await.unwrap();

    let records = store.list_applied().await.unwrap();
    assert!(verify_chain(&records).is_ok());
    assert_eq!(migrator.migrate().await.unwrap().count(), 0);
    assert!(migrator.status().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_failed_commit_is_not_recorded() {
    let temp = tempdir().unwrap();
    let (store, migrator) = open(&temp.path().join("dev.duckdb"), temp.path()).await;

    stage(&migrator, "create table ok(id int); create tabel broken(id int);");
    let err = migrator.commit("broken").await.unwrap_err();
    assert!(matches!(
        err.store_error(),
        Some(DbError::ExecutionFailed(_))
    ));

    assert!(store.list_applied().await.unwrap().is_empty());
    // The statement before the syntax error was rolled back with the batch
    assert!(store.execute("select * from ok;").await.is_err());
    assert_eq!(
        list_migration_files(migrator.layout().migrations_dir())
            .unwrap()
            .len(),
        1
    );

    let status = migrator.status().await.unwrap();
    assert_eq!(status.pending.len(), 1);
    assert!(status.staged);
}

#[tokio::test]
async fn test_uncommit_on_fresh_database() {
    let temp = tempdir().unwrap();
    let (_, migrator) = open(&temp.path().join("dev.duckdb"), temp.path()).await;

    let err = migrator.uncommit().await.unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Store {
            source: DbError::NoMigrationsApplied,
            ..
        }
    ));
}

#[tokio::test]
async fn test_self_transactional_sql_commits_and_migrates() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("project");
    let sql = "BEGIN; create table t(id int); COMMIT;";

    {
        let (store, migrator) = open(&temp.path().join("dev.duckdb"), &root).await;
        stage(&migrator, sql);
        migrator.apply().await.unwrap();
        store.execute("drop table t;").await.unwrap();

        let committed = migrator.commit("txn").await.unwrap();
        assert_eq!(store.list_applied().await.unwrap().len(), 1);
        assert_eq!(
            fs::read_to_string(migrator.layout().migration_path(&committed.file_name)).unwrap(),
            sql
        );
        assert_eq!(fs::read_to_string(migrator.layout().staging_file()).unwrap(), "");
    }

    let (store, migrator) = open(&temp.path().join("ci.duckdb"), &root).await;
    assert_eq!(migrator.migrate().await.unwrap().count(), 1);
    store.execute("insert into t values (1);").await.unwrap();
    assert!(migrator.status().await.unwrap().is_clean());
}
