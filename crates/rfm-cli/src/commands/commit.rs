//! Commit command implementation

use anyhow::{Context, Result};

use crate::cli::{CommitArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the commit command
pub async fn execute(args: &CommitArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;

    let committed = ctx
        .migrator
        .commit(&args.name)
        .await
        .with_context(|| format!("Failed to commit migration '{}'", args.name))?;

    println!("Committed migration: {}", committed.file_name);
    if global.verbose {
        println!("  hash:     {}", committed.hash);
        println!(
            "  previous: {}",
            committed.previous_hash.as_deref().unwrap_or("(none)")
        );
    }
    Ok(())
}
