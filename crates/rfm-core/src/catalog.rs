//! Discovery and naming of committed migration files

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Suffix recognized as a migration file
pub const MIGRATION_SUFFIX: &str = ".sql";

/// Timestamp prefix format: `YYYYMMDDHHMMSS`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// List migration files in `dir`, sorted by name.
///
/// The timestamp prefix makes name order equal to creation order.
/// Subdirectories and files without the `.sql` suffix are ignored.
pub fn list_migration_files(dir: &Path) -> CoreResult<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::DirectoryUnreadable {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::DirectoryUnreadable {
            path: dir.display().to_string(),
            source: e,
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            log::warn!(
                "Skipping migration file with non UTF-8 name: {}",
                entry.path().display()
            );
            continue;
        };
        if name.ends_with(MIGRATION_SUFFIX) {
            files.push(name);
        }
    }

    files.sort();
    Ok(files)
}

/// Replace spaces with underscores so the name is usable in a file name
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Build `<YYYYMMDDHHMMSS>_<sanitized name>.sql` for a migration committed at `at`
pub fn migration_file_name(at: DateTime<Utc>, name: &str) -> String {
    format!(
        "{}_{}{}",
        at.format(TIMESTAMP_FORMAT),
        sanitize_name(name),
        MIGRATION_SUFFIX
    )
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
