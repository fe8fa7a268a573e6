//! # archiver CLI entry point
//!
//! Parses command-line arguments, opens the archive store and dispatches to
//! subcommand handlers.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use archiver_cli::commit::{run_commit, CommitArgs};
use archiver_cli::inspect::{run_show, run_verify, ShowArgs, VerifyArgs};
use archiver_cli::run::{run_archive, RunArgs};
use archiver_store::{ArchiveStore, StoreConfig};

/// Crawl archiver: record fetched resources with content digests and report
/// completed runs to the identity service.
#[derive(Parser, Debug)]
#[command(name = "archiver", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// SQLite database URL. Overrides `ARCHIVER_DATABASE_URL`.
    #[arg(long, global = true, value_name = "URL")]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a URL and archive it as a new run.
    Run(RunArgs),

    /// Re-hash a stored run and its files against their recorded digests.
    Verify(VerifyArgs),

    /// Print a stored run, its child URLs and its files as JSON.
    Show(ShowArgs),

    /// Report a stored run as complete to the identity service.
    Commit(CommitArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    let mut config = StoreConfig::from_env();
    if let Some(url) = cli.database {
        config.database_url = url;
    }
    tracing::debug!(database = %config.database_url, "opening archive store");

    let store = ArchiveStore::open(&config)
        .await
        .with_context(|| format!("opening archive store at {}", config.database_url))?;

    let result = match &cli.command {
        Commands::Run(args) => run_archive(args, &store).await,
        Commands::Verify(args) => run_verify(args, &store).await,
        Commands::Show(args) => run_show(args, &store).await,
        Commands::Commit(args) => run_commit(args, &store).await,
    };

    store.close().await;
    result
}
