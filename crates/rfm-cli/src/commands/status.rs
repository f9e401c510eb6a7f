//! Status command implementation

use anyhow::{Context, Result};
use rfm_engine::MigrationStatus;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::context::RuntimeContext;

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let status = ctx
        .migrator
        .status()
        .await
        .context("Failed to read migration status")?;

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .context("Failed to serialize migration status")?;
        println!("{json}");
    } else {
        print!("{}", render_status(&status));
    }
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

pub(crate) fn render_status(status: &MigrationStatus) -> String {
    let mut out = String::new();

    out.push_str(&format!("Applied migrations ({}):\n", status.applied.len()));
    for record in &status.applied {
        out.push_str(&format!(
            "  {}  {}  {}\n",
            record.applied_at.format("%Y-%m-%d %H:%M:%S"),
            short_hash(&record.hash),
            record.file_name
        ));
    }

    if !status.pending.is_empty() {
        out.push_str(&format!("Pending migrations ({}):\n", status.pending.len()));
        for file_name in &status.pending {
            out.push_str(&format!("  {file_name}\n"));
        }
    }
    for file_name in &status.missing_files {
        out.push_str(&format!("Missing file: {file_name}\n"));
    }
    for file_name in &status.drifted {
        out.push_str(&format!(
            "Modified since commit: {file_name} (content no longer matches the ledger)\n"
        ));
    }
    if let Some(chain_break) = &status.chain_break {
        out.push_str(&format!("Broken chain: {chain_break}\n"));
    }

    if status.staged {
        out.push_str("current.sql has uncommitted changes\n");
    }
    if status.is_clean() {
        out.push_str("Up to date\n");
    }
    out
}
