//! Runtime context for CLI commands

use anyhow::{Context, Result};
use rfm_core::{Config, ConfigOverrides};
use rfm_db::DuckDbStore;
use rfm_engine::Migrator;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Resolved configuration plus a migrator bound to its database
pub struct RuntimeContext {
    pub config: Config,
    pub migrator: Migrator,
}

impl RuntimeContext {
    /// Resolve configuration, open the database and provision the ledger
    pub async fn new(args: &GlobalArgs) -> Result<Self> {
        let config = resolve_config(args)?;

        let store = DuckDbStore::new(&config.database_url)
            .with_context(|| format!("Failed to open database '{}'", config.database_url))?;
        let migrator = Migrator::new(Arc::new(store), config.layout())
            .await
            .context("Failed to initialize migrator")?;

        log::debug!(
            "Database {} with migrations in {}",
            config.database_url,
            config.migration_dir.display()
        );
        Ok(Self { config, migrator })
    }
}

/// Layer defaults, config file, environment and command-line flags
pub fn resolve_config(args: &GlobalArgs) -> Result<Config> {
    let overrides = ConfigOverrides {
        config_file: args.config.clone(),
        database_url: args.database_url.clone(),
        migration_dir: args.migration_dir.clone(),
    };
    Config::resolve(&overrides).context("Failed to load configuration")
}
