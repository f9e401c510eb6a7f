use super::*;
use tempfile::tempdir;

#[test]
fn test_paths_derive_from_root() {
    let layout = MigrationLayout::new("/tmp/db");
    assert_eq!(layout.root(), Path::new("/tmp/db"));
    assert_eq!(layout.staging_file(), Path::new("/tmp/db/current.sql"));
    assert_eq!(layout.migrations_dir(), Path::new("/tmp/db/migrations"));
    assert_eq!(
        layout.migration_path("20240101000000_init.sql"),
        Path::new("/tmp/db/migrations/20240101000000_init.sql")
    );
}

#[test]
fn test_ensure_creates_structure() {
    let temp = tempdir().unwrap();
    let layout = MigrationLayout::new(temp.path().join("nested").join("db"));

    layout.ensure().unwrap();

    assert!(layout.root().is_dir());
    assert!(layout.migrations_dir().is_dir());
    assert_eq!(fs::read_to_string(layout.staging_file()).unwrap(), "");
}

#[test]
fn test_ensure_preserves_staged_content() {
    let temp = tempdir().unwrap();
    let layout = MigrationLayout::new(temp.path());
    layout.ensure().unwrap();
    fs::write(layout.staging_file(), "create table t(id int);").unwrap();

    layout.ensure().unwrap();

    assert_eq!(
        fs::read_to_string(layout.staging_file()).unwrap(),
        "create table t(id int);"
    );
}

#[test]
fn test_ensure_fails_when_root_is_a_file() {
    let temp = tempdir().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let err = MigrationLayout::new(&blocker).ensure().unwrap_err();
    assert!(matches!(err, CoreError::LayoutError { .. }));
}
