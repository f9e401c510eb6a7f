use super::*;
use crate::cli::{CommitArgs, GlobalArgs, StatusArgs};
use crate::context::RuntimeContext;
use rfm_core::list_migration_files;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

struct Workspace {
    temp: TempDir,
    global: GlobalArgs,
}

impl Workspace {
    fn migration_dir(&self) -> PathBuf {
        self.temp.path().join("db")
    }

    fn stage(&self, sql: &str) {
        fs::write(self.migration_dir().join("current.sql"), sql).unwrap();
    }

    fn staged(&self) -> String {
        fs::read_to_string(self.migration_dir().join("current.sql")).unwrap()
    }

    fn migrations(&self) -> Vec<String> {
        list_migration_files(&self.migration_dir().join("migrations")).unwrap()
    }

    fn with_database(&self, file_name: &str) -> GlobalArgs {
        GlobalArgs {
            database_url: Some(format!(
                "duckdb://{}",
                self.temp.path().join(file_name).display()
            )),
            ..self.global.clone()
        }
    }
}

/// Isolated config file, database and migration directory
fn workspace() -> Workspace {
    let temp = tempdir().unwrap();
    let config = temp.path().join("rfmigrate.yaml");
    fs::write(&config, "").unwrap();

    let global = GlobalArgs {
        verbose: false,
        config: Some(config),
        database_url: Some(format!(
            "duckdb://{}",
            temp.path().join("dev.duckdb").display()
        )),
        migration_dir: Some(temp.path().join("db")),
    };
    Workspace { temp, global }
}

#[test]
fn test_config_provisions_layout() {
    let ws = workspace();
    config::execute(&ws.global).unwrap();

    assert!(ws.migration_dir().join("current.sql").is_file());
    assert!(ws.migration_dir().join("migrations").is_dir());
}

#[test]
fn test_config_missing_file_fails() {
    let ws = workspace();
    let global = GlobalArgs {
        config: Some(ws.temp.path().join("absent.yaml")),
        ..ws.global.clone()
    };

    let err = config::execute(&global).unwrap_err();
    assert!(format!("{err:#}").contains("[E001]"));
}

#[tokio::test]
async fn test_apply_empty_staging_succeeds() {
    let ws = workspace();
    apply::execute(&ws.global).await.unwrap();
    assert_eq!(ws.staged(), "");
}

#[tokio::test]
async fn test_commit_and_uncommit() {
    let ws = workspace();
    config::execute(&ws.global).unwrap();
    ws.stage("create table t(id int);");

    let args = CommitArgs {
        name: "init".to_string(),
    };
    commit::execute(&args, &ws.global).await.unwrap();

    let files = ws.migrations();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_init.sql"));
    assert_eq!(ws.staged(), "");

    uncommit::execute(&ws.global).await.unwrap();
    assert!(ws.migrations().is_empty());
    assert_eq!(ws.staged(), "create table t(id int);");
}

#[tokio::test]
async fn test_commit_empty_staging_reports_code() {
    let ws = workspace();
    let args = CommitArgs {
        name: "init".to_string(),
    };

    let err = commit::execute(&args, &ws.global).await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to commit migration 'init'"));
    assert!(message.contains("[M002]"));
}

#[tokio::test]
async fn test_migrate_onto_second_database() {
    let ws = workspace();
    config::execute(&ws.global).unwrap();
    for (name, sql) in [("a", "create table a(id int);"), ("b", "create table b(id int);")] {
        ws.stage(sql);
        let args = CommitArgs {
            name: name.to_string(),
        };
        commit::execute(&args, &ws.global).await.unwrap();
    }

    let ci = ws.with_database("ci.duckdb");
    migrate::execute(&ci).await.unwrap();

    let ctx = RuntimeContext::new(&ci).await.unwrap();
    let status = ctx.migrator.status().await.unwrap();
    assert_eq!(status.applied.len(), 2);
    assert!(status.is_clean());
}

#[tokio::test]
async fn test_status_output() {
    let ws = workspace();
    config::execute(&ws.global).unwrap();
    ws.stage("create table a(id int);");
    let args = CommitArgs {
        name: "a".to_string(),
    };
    commit::execute(&args, &ws.global).await.unwrap();

    status::execute(&StatusArgs { json: true }, &ws.global)
        .await
        .unwrap();

    let ctx = RuntimeContext::new(&ws.global).await.unwrap();
    let rendered = status::render_status(&ctx.migrator.status().await.unwrap());
    assert!(rendered.contains("Applied migrations (1):"));
    assert!(rendered.contains("_a.sql"));
    assert!(rendered.contains("Up to date"));
    drop(ctx);

    fs::write(
        ws.migration_dir()
            .join("migrations")
            .join("29990101000000_late.sql"),
        "create table late(id int);",
    )
    .unwrap();
    ws.stage("select 1;");

    let ctx = RuntimeContext::new(&ws.global).await.unwrap();
    let rendered = status::render_status(&ctx.migrator.status().await.unwrap());
    assert!(rendered.contains("Pending migrations (1):"));
    assert!(rendered.contains("29990101000000_late.sql"));
    assert!(rendered.contains("current.sql has uncommitted changes"));
    assert!(!rendered.contains("Up to date"));
}
