//! Config command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::context::resolve_config;

/// Execute the config command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global)?;

    println!("Current Configuration:");
    println!("----------------------");
    println!("Database URL: {}", config.database_url);
    println!("Migration Directory: {}", config.migration_dir.display());
    Ok(())
}
