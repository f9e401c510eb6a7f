//! rf-migrate CLI - hash-chained SQL migrations built from a single staging file

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::{apply, commit, config, migrate, status, uncommit, watch};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match &cli.command {
        Commands::Apply => apply::execute(&cli.global).await,
        Commands::Commit(args) => commit::execute(args, &cli.global).await,
        Commands::Migrate => migrate::execute(&cli.global).await,
        Commands::Uncommit => uncommit::execute(&cli.global).await,
        Commands::Watch => watch::execute(&cli.global).await,
        Commands::Config => config::execute(&cli.global),
        Commands::Status(args) => status::execute(args, &cli.global).await,
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
