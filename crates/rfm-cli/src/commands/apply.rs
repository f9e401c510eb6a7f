//! Apply command implementation

use anyhow::{Context, Result};
use rfm_engine::ApplyOutcome;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the apply command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let staging = ctx.migrator.layout().staging_file().display().to_string();

    println!("Applying {staging}...");
    match ctx.migrator.apply().await.context("Apply failed")? {
        ApplyOutcome::Applied { bytes } => {
            println!("Successfully applied {staging} ({bytes} bytes)")
        }
        ApplyOutcome::Empty => println!("{staging} is empty, nothing to apply"),
    }
    Ok(())
}
