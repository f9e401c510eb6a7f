//! Migrate command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the migrate command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;

    let summary = ctx.migrator.migrate().await.context("Migrate failed")?;
    for file_name in &summary.applied {
        println!("Applied migration: {file_name}");
    }
    println!("Applied {} migrations", summary.count());
    Ok(())
}
