//! Uncommit command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the uncommit command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;

    println!("Uncommitting the last migration...");
    let removed = ctx
        .migrator
        .uncommit()
        .await
        .context("Failed to uncommit the last migration")?;
    println!("Uncommitted migration: {}", removed.file_name);
    println!(
        "Its SQL is back in {}; changes already applied to the database were not reverted",
        ctx.migrator.layout().staging_file().display()
    );
    Ok(())
}
