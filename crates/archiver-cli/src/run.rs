//! # Run Subcommand
//!
//! Fetches one URL, archives the response as a new run, records the child
//! links and local files the caller supplies, and optionally performs the
//! completion handshake.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use archiver_client::{CompletionNotifier, CompletionReceipt, HttpFetcher, NotifierConfig};
use archiver_core::{ContentDigest, ExternalUuid, FileId, RunId, DEFAULT_CHUNK_SIZE};
use archiver_store::{ArchiveStore, RunRecord};

/// Arguments for the `archiver run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// URL to fetch and archive.
    #[arg(long)]
    pub url: String,

    /// External identifier for this run, assigned by the crawl coordinator.
    /// Stored verbatim.
    #[arg(long, value_name = "UUID")]
    pub uuid: String,

    /// Link discovered in the fetched resource. Repeatable.
    #[arg(long = "child-url", value_name = "URL")]
    pub child_urls: Vec<String>,

    /// Local file produced while processing the resource. Repeatable.
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Free-text comment attached to every archived file.
    #[arg(long)]
    pub comments: Option<String>,

    /// Hashing chunk size in bytes; 0 hashes each file in one read.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Report the run to the identity service once archived.
    #[arg(long)]
    pub commit: bool,

    /// Fetch timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// What `archiver run` did, printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub url: String,
    pub status: u16,
    pub digest: ContentDigest,
    pub child_urls_inserted: usize,
    pub child_urls_existing: usize,
    pub files: Vec<FileId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<CompletionReceipt>,
}

/// Execute the run subcommand.
pub async fn run_archive(args: &RunArgs, store: &ArchiveStore) -> Result<u8> {
    let fetcher = HttpFetcher::new(args.timeout_secs).context("building HTTP client")?;
    let notifier = if args.commit {
        let config = NotifierConfig::from_env().context("loading notifier configuration")?;
        Some(CompletionNotifier::new(config).context("building notifier")?)
    } else {
        None
    };

    let summary = archive(args, store, &fetcher, notifier.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}

/// Fetch, archive and (when a notifier is given) commit one run.
///
/// The run row is written before any child URL or file; if a later step
/// fails, what was already recorded stays recorded.
pub async fn archive(
    args: &RunArgs,
    store: &ArchiveStore,
    fetcher: &HttpFetcher,
    notifier: Option<&CompletionNotifier>,
) -> Result<RunSummary> {
    let external_uuid = ExternalUuid::from(args.uuid.as_str());

    let fetch = fetcher
        .fetch(&args.url)
        .await
        .with_context(|| format!("fetching {}", args.url))?;

    let record = RunRecord::begin(store, &args.url, external_uuid, fetch)
        .await
        .context("recording run")?;

    let mut inserted = 0;
    let mut existing = 0;
    for url in &args.child_urls {
        let outcome = record
            .add_child_url(url)
            .await
            .with_context(|| format!("recording child URL {url}"))?;
        if outcome.is_inserted() {
            inserted += 1;
        } else {
            existing += 1;
        }
    }

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let file_id = record
            .add_file_chunked(path, args.comments.as_deref(), args.chunk_size)
            .await
            .with_context(|| format!("archiving file {}", path.display()))?;
        files.push(file_id);
    }

    let receipt = match notifier {
        Some(notifier) => Some(
            notifier
                .notify(record.run_id())
                .await
                .with_context(|| format!("committing run {}", record.run_id()))?,
        ),
        None => None,
    };

    Ok(RunSummary {
        run_id: record.run_id(),
        url: record.source_url().to_string(),
        status: record.status(),
        digest: record.content_digest().clone(),
        child_urls_inserted: inserted,
        child_urls_existing: existing,
        files,
        receipt,
    })
}
