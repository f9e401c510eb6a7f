//! rfm-engine - Migration lifecycle engine for rf-migrate
//!
//! [`Migrator`] owns the staging file (`current.sql`) and turns it into
//! committed, hash-chained migrations recorded through a
//! [`MigrationStore`](rfm_db::MigrationStore). The [`watcher`] module adapts
//! file-change notifications for [`Migrator::watch`].

pub mod error;
pub mod migrator;
pub mod status;
pub mod watcher;

pub use error::{MigrateError, MigrateResult};
pub use migrator::{ApplyOutcome, CommittedMigration, MigrateSummary, Migrator, WatchStats};
pub use status::MigrationStatus;
pub use watcher::{
    ChangeWatcher, ChannelFeed, ChannelWatcher, FileChanged, NotifyWatcher, Subscription,
    SubscriptionHandle,
};
