//! File-change subscriptions feeding [`Migrator::watch`](crate::Migrator::watch).
//!
//! A [`Subscription`] yields two streams, change notifications and watcher
//! errors. The consumer stops when both streams have closed or when the
//! subscription's [`SubscriptionHandle`] is closed.

use crate::error::{MigrateError, MigrateResult};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;

/// The watched file's contents changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChanged {
    pub path: PathBuf,
}

/// Source of change notifications for a single file
pub trait ChangeWatcher: Send + Sync {
    /// Start delivering notifications for `path`
    fn subscribe(&self, path: &Path) -> MigrateResult<Subscription>;

    /// Handle that cancels subscriptions made through this watcher
    fn handle(&self) -> SubscriptionHandle;
}

#[derive(Default)]
struct HandleInner {
    closed: AtomicBool,
    wake: Notify,
    source: Mutex<Option<Box<dyn Send>>>,
}

/// Cloneable cancellation handle for a subscription.
///
/// Closing drops the event source, so no further notifications arrive, and
/// wakes the consumer so it returns without waiting for the streams to drain.
#[derive(Clone, Default)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
    /// Create an open handle with no source attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the subscription; idempotent
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        if let Ok(mut source) = self.inner.source.lock() {
            source.take();
        }
        self.inner.wake.notify_one();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Keep `source` alive until the handle is closed
    fn attach(&self, source: Box<dyn Send>) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.inner.source.lock() {
            Ok(mut slot) => {
                *slot = Some(source);
                true
            }
            Err(_) => false,
        }
    }

    /// Resolves once the handle is closed
    pub(crate) async fn closed(&self) {
        if self.is_closed() {
            return;
        }
        self.inner.wake.notified().await;
    }
}

/// A live stream of change and error notifications
pub struct Subscription {
    pub(crate) changes: UnboundedReceiver<FileChanged>,
    pub(crate) errors: UnboundedReceiver<String>,
    pub(crate) handle: SubscriptionHandle,
}

impl Subscription {
    /// Build a subscription from raw receivers
    pub fn new(
        changes: UnboundedReceiver<FileChanged>,
        errors: UnboundedReceiver<String>,
        handle: SubscriptionHandle,
    ) -> Self {
        Self {
            changes,
            errors,
            handle,
        }
    }

    /// Cancellation handle for this subscription
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }
}

/// Watches the filesystem with the `notify` crate.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by writing a temporary file and renaming it over the
/// original keep producing notifications.
#[derive(Default)]
pub struct NotifyWatcher {
    handle: SubscriptionHandle,
}

impl NotifyWatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeWatcher for NotifyWatcher {
    fn subscribe(&self, path: &Path) -> MigrateResult<Subscription> {
        let watch_error = |message: String| MigrateError::Watch {
            path: path.display().to_string(),
            message,
        };

        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| watch_error("path has no file name".to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (change_tx, change_rx) = unbounded_channel();
        let (error_tx, error_rx) = unbounded_channel();
        let target = path.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                forward(res, &file_name, &target, &change_tx, &error_tx)
            },
            Config::default(),
        )
        .map_err(|e| watch_error(e.to_string()))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(e.to_string()))?;

        if !self.handle.attach(Box::new(watcher)) {
            return Err(watch_error("subscription already closed".to_string()));
        }
        Ok(Subscription::new(change_rx, error_rx, self.handle.clone()))
    }

    fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }
}

fn forward(
    res: notify::Result<Event>,
    file_name: &OsString,
    target: &Path,
    changes: &UnboundedSender<FileChanged>,
    errors: &UnboundedSender<String>,
) {
    match res {
        Ok(event) => {
            if is_content_change(&event, file_name) {
                let _ = changes.send(FileChanged {
                    path: target.to_path_buf(),
                });
            }
        }
        Err(e) => {
            let _ = errors.send(e.to_string());
        }
    }
}

/// Whether `event` created or modified the contents of `file_name`
pub(crate) fn is_content_change(event: &Event, file_name: &OsString) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

/// In-process watcher driven by a [`ChannelFeed`].
///
/// Delivers exactly the notifications pushed into the feed; dropping the
/// feed closes both streams. Subscribes at most once.
pub struct ChannelWatcher {
    handle: SubscriptionHandle,
    pending: Mutex<Option<(UnboundedReceiver<FileChanged>, UnboundedReceiver<String>)>>,
}

/// Sending half of a [`ChannelWatcher`]
pub struct ChannelFeed {
    changes: UnboundedSender<FileChanged>,
    errors: UnboundedSender<String>,
}

impl ChannelWatcher {
    pub fn new() -> (Self, ChannelFeed) {
        let (change_tx, change_rx) = unbounded_channel();
        let (error_tx, error_rx) = unbounded_channel();
        let watcher = Self {
            handle: SubscriptionHandle::new(),
            pending: Mutex::new(Some((change_rx, error_rx))),
        };
        let feed = ChannelFeed {
            changes: change_tx,
            errors: error_tx,
        };
        (watcher, feed)
    }
}

impl ChangeWatcher for ChannelWatcher {
    fn subscribe(&self, path: &Path) -> MigrateResult<Subscription> {
        let taken = self.pending.lock().ok().and_then(|mut p| p.take());
        match taken {
            Some((changes, errors)) if !self.handle.is_closed() => {
                Ok(Subscription::new(changes, errors, self.handle.clone()))
            }
            _ => Err(MigrateError::Watch {
                path: path.display().to_string(),
                message: "subscription already consumed".to_string(),
            }),
        }
    }

    fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }
}

impl ChannelFeed {
    /// Report a change to `path`; false once the subscriber is gone
    pub fn file_changed(&self, path: impl Into<PathBuf>) -> bool {
        self.changes
            .send(FileChanged { path: path.into() })
            .is_ok()
    }

    /// Report a watcher-level error; false once the subscriber is gone
    pub fn error(&self, message: impl Into<String>) -> bool {
        self.errors.send(message.into()).is_ok()
    }
}

#[cfg(test)]
#[path = "watcher_test.rs"]
mod tests;
