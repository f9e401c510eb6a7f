//! Configuration types and resolution for rfmigrate.yaml
//!
//! Sources are layered lowest to highest: built-in defaults, the config file,
//! environment variables, then command-line overrides.

use crate::error::{CoreError, CoreResult};
use crate::layout::MigrationLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `databaseUrl`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable overriding `migrationDir`
pub const MIGRATION_DIR_ENV: &str = "RF_MIGRATION_DIR";

/// Config file names probed in each search directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["rfmigrate.yaml", "rfmigrate.yml"];

/// Resolved tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Target database (`:memory:`, a file path, or `duckdb://<path>`)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Directory holding `current.sql` and `migrations/`
    #[serde(default = "default_migration_dir")]
    pub migration_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            migration_dir: default_migration_dir(),
        }
    }
}

fn default_database_url() -> String {
    "rfmigrate.duckdb".to_string()
}

fn default_migration_dir() -> PathBuf {
    PathBuf::from("./migrations")
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file; must exist when given
    pub config_file: Option<PathBuf>,

    /// `--database-url`
    pub database_url: Option<String>,

    /// `--migration-dir`
    pub migration_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        // An empty file is a valid config that keeps every default
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Find the first `rfmigrate.yaml`/`rfmigrate.yml` across `search_dirs`
    pub fn discover(search_dirs: &[PathBuf]) -> Option<PathBuf> {
        search_dirs
            .iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    /// Resolve configuration from every source and provision the migration layout
    pub fn resolve(overrides: &ConfigOverrides) -> CoreResult<Self> {
        let config = Self::resolve_with(
            overrides,
            |key| std::env::var(key).ok(),
            &default_search_dirs(),
        )?;
        config.layout().ensure()?;
        Ok(config)
    }

    /// Layer defaults, file, environment (via `env`) and overrides.
    ///
    /// Does not touch the migration directory.
    pub fn resolve_with<F>(
        overrides: &ConfigOverrides,
        env: F,
        search_dirs: &[PathBuf],
    ) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &overrides.config_file {
            Some(path) => Self::load(path)?,
            None => match Self::discover(search_dirs) {
                Some(path) => {
                    log::debug!("Using config file {}", path.display());
                    Self::load(&path)?
                }
                None => Self::default(),
            },
        };

        if let Some(url) = env(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
            config.database_url = url;
        }
        if let Some(dir) = env(MIGRATION_DIR_ENV).filter(|v| !v.is_empty()) {
            config.migration_dir = PathBuf::from(dir);
        }

        if let Some(url) = overrides.database_url.as_ref().filter(|v| !v.is_empty()) {
            config.database_url = url.clone();
        }
        if let Some(dir) = &overrides.migration_dir {
            config.migration_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Paths of the configured migration directory
    pub fn layout(&self) -> MigrationLayout {
        MigrationLayout::new(&self.migration_dir)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "databaseUrl cannot be empty".to_string(),
            });
        }
        if self.migration_dir.as_os_str().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrationDir cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Current directory, then `$HOME`
fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home));
    }
    dirs
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
