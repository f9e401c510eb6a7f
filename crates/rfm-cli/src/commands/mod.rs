//! CLI command implementations

pub(crate) mod apply;
pub(crate) mod commit;
pub(crate) mod config;
pub(crate) mod migrate;
pub(crate) mod status;
pub(crate) mod uncommit;
pub(crate) mod watch;

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;
