//! On-disk layout of a migration directory.
//!
//! ```text
//! <root>/current.sql                        staging buffer
//! <root>/migrations/<YYYYMMDDHHMMSS>_<name>.sql   committed migrations
//! ```

use crate::error::{CoreError, CoreResult};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// File name of the staging buffer
pub const STAGING_FILE_NAME: &str = "current.sql";

/// Subdirectory holding committed migration files
pub const MIGRATIONS_DIR_NAME: &str = "migrations";

/// Resolved paths of a migration directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationLayout {
    root: PathBuf,
    staging_file: PathBuf,
    migrations_dir: PathBuf,
}

impl MigrationLayout {
    /// Derive the layout rooted at `root` without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            staging_file: root.join(STAGING_FILE_NAME),
            migrations_dir: root.join(MIGRATIONS_DIR_NAME),
            root,
        }
    }

    /// The migration directory itself
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `current.sql`
    pub fn staging_file(&self) -> &Path {
        &self.staging_file
    }

    /// Directory of committed migration files
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Path of a committed migration file
    pub fn migration_path(&self, file_name: &str) -> PathBuf {
        self.migrations_dir.join(file_name)
    }

    /// Create the root, the migrations subdirectory and an empty staging file.
    ///
    /// Idempotent: an existing `current.sql` keeps its content.
    pub fn ensure(&self) -> CoreResult<()> {
        for dir in [&self.root, &self.migrations_dir] {
            fs::create_dir_all(dir).map_err(|e| CoreError::LayoutError {
                path: dir.display().to_string(),
                source: e,
            })?;
        }

        if !self.staging_file.exists() {
            log::debug!("Creating empty {}", self.staging_file.display());
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.staging_file)
            .map_err(|e| CoreError::LayoutError {
                path: self.staging_file.display().to_string(),
                source: e,
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
