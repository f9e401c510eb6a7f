//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rf-migrate - Hash-chained SQL migrations built from a single staging file
#[derive(Parser, Debug)]
#[command(name = "rf-migrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./rfmigrate.yaml, then ~/rfmigrate.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL, overriding the config file and DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Directory holding current.sql and migrations/
    #[arg(long, global = true)]
    pub migration_dir: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply current.sql to the database without recording it
    Apply,

    /// Commit current.sql as a new migration
    Commit(CommitArgs),

    /// Apply every migration the database has not recorded
    Migrate,

    /// Move the last migration back into current.sql
    Uncommit,

    /// Reapply current.sql whenever it changes
    Watch,

    /// Show the resolved configuration
    Config,

    /// Compare the ledger with the migrations directory
    Status(StatusArgs),
}

/// Arguments for the commit command
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Migration name; spaces become underscores in the file name
    #[arg(short, long)]
    pub name: String,
}

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
