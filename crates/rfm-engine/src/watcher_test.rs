use super::*;
use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
use std::time::Duration;
use tempfile::tempdir;

fn event(kind: EventKind, path: &str) -> Event {
    Event::new(kind).add_path(PathBuf::from(path))
}

#[test]
fn test_content_change_filter() {
    let name = OsString::from("current.sql");

    assert!(is_content_change(
        &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/db/current.sql"),
        &name
    ));
    assert!(is_content_change(
        &event(EventKind::Create(CreateKind::File), "/db/current.sql"),
        &name
    ));
    assert!(!is_content_change(
        &event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), "/db/current.sql"),
        &name
    ));
    assert!(!is_content_change(
        &event(EventKind::Access(AccessKind::Any), "/db/current.sql"),
        &name
    ));
    assert!(!is_content_change(
        &event(EventKind::Remove(RemoveKind::File), "/db/current.sql"),
        &name
    ));
    assert!(!is_content_change(
        &event(EventKind::Modify(ModifyKind::Any), "/db/other.sql"),
        &name
    ));
}

#[test]
fn test_handle_close_is_idempotent() {
    let handle = SubscriptionHandle::new();
    assert!(!handle.is_closed());
    handle.close();
    handle.close();
    assert!(handle.is_closed());
    assert!(!handle.attach(Box::new(())));
}

#[tokio::test]
async fn test_closed_resolves_after_close() {
    let handle = SubscriptionHandle::new();
    let waiter = handle.clone();
    handle.close();
    tokio::time::timeout(Duration::from_secs(1), waiter.closed())
        .await
        .expect("closed() should resolve once the handle is closed");
}

#[tokio::test]
async fn test_channel_watcher_delivers_and_closes() {
    let (watcher, feed) = ChannelWatcher::new();
    let mut subscription = watcher.subscribe(Path::new("current.sql")).unwrap();

    assert!(feed.file_changed("current.sql"));
    assert!(feed.error("disk on fire"));
    drop(feed);

    assert_eq!(
        subscription.changes.recv().await,
        Some(FileChanged {
            path: PathBuf::from("current.sql")
        })
    );
    assert_eq!(subscription.changes.recv().await, None);
    assert_eq!(
        subscription.errors.recv().await.as_deref(),
        Some("disk on fire")
    );
    assert_eq!(subscription.errors.recv().await, None);
}

#[test]
fn test_channel_watcher_is_not_restartable() {
    let (watcher, _feed) = ChannelWatcher::new();
    let _first = watcher.subscribe(Path::new("current.sql")).unwrap();
    let err = watcher.subscribe(Path::new("current.sql")).err().unwrap();
    assert!(matches!(err, MigrateError::Watch { .. }));
}

#[tokio::test]
async fn test_notify_watcher_reports_writes() {
    let temp = tempdir().unwrap();
    let staging = temp.path().join("current.sql");
    std::fs::write(&staging, "").unwrap();

    let watcher = NotifyWatcher::new();
    let mut subscription = watcher.subscribe(&staging).unwrap();

    std::fs::write(&staging, "create table t(id int);").unwrap();

    let change = tokio::time::timeout(Duration::from_secs(10), subscription.changes.recv())
        .await
        .expect("no change notification within timeout")
        .expect("change stream closed unexpectedly");
    assert_eq!(change.path, staging);

    watcher.handle().close();
    assert!(subscription.handle().is_closed());
}

#[test]
fn test_notify_watcher_rejects_missing_directory() {
    let temp = tempdir().unwrap();
    let staging = temp.path().join("missing").join("current.sql");
    let err = NotifyWatcher::new().subscribe(&staging).err().unwrap();
    assert!(matches!(err, MigrateError::Watch { .. }));
}
