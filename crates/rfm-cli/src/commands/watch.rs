//! Watch command implementation

use anyhow::{Context, Result};
use rfm_engine::{ChangeWatcher, NotifyWatcher};

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the watch command; runs until Ctrl-C
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global).await?;
    let watcher = NotifyWatcher::new();

    let handle = watcher.handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupted, stopping watch");
                handle.close();
            }
            Err(e) => log::warn!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    println!(
        "Watching {} for changes (Ctrl-C to stop)...",
        ctx.migrator.layout().staging_file().display()
    );
    let stats = ctx.migrator.watch(&watcher).await.context("Watch failed")?;

    println!(
        "Stopped watching: {} reapplied, {} failed, {} watcher errors",
        stats.reapplied, stats.failed, stats.watcher_errors
    );
    Ok(())
}
