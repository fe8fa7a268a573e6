//! Read-only subcommands: `verify` and `show`.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use archiver_core::RunId;
use archiver_store::{ArchiveStore, ChildUrl, IntegrityReport, StoredFile, StoredRun};

/// Exit code when a stored run no longer matches its digests.
pub const EXIT_DAMAGED: u8 = 2;

/// Arguments for `archiver verify`.
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Run to verify.
    #[arg(long)]
    pub run_id: i64,
}

/// Arguments for `archiver show`.
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Run to print.
    #[arg(long)]
    pub run_id: i64,
}

/// A stored run with everything recorded against it.
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    pub run: StoredRun,
    pub body_len: usize,
    pub child_urls: Vec<ChildUrl>,
    pub files: Vec<StoredFile>,
}

/// Execute `archiver verify`. Exits with [`EXIT_DAMAGED`] on mismatch.
pub async fn run_verify(args: &VerifyArgs, store: &ArchiveStore) -> Result<u8> {
    let report = verify(store, RunId(args.run_id)).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_intact() {
        Ok(0)
    } else {
        for file in report.damaged_files() {
            tracing::warn!(file_id = %file.file_id, filename = %file.filename, "file digest mismatch");
        }
        if !report.body_intact() {
            tracing::warn!(run_id = args.run_id, "body digest mismatch");
        }
        Ok(EXIT_DAMAGED)
    }
}

pub async fn verify(store: &ArchiveStore, run_id: RunId) -> Result<IntegrityReport> {
    store
        .verify_run(run_id)
        .await
        .with_context(|| format!("verifying {run_id}"))
}

/// Execute `archiver show`.
pub async fn run_show(args: &ShowArgs, store: &ArchiveStore) -> Result<u8> {
    let view = show(store, RunId(args.run_id)).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(0)
}

pub async fn show(store: &ArchiveStore, run_id: RunId) -> Result<RunView> {
    let run = store
        .get_run(run_id)
        .await?
        .with_context(|| format!("{run_id} not found"))?;
    let child_urls = store.child_urls(run_id).await?;
    let files = store.files(run_id).await?;
    Ok(RunView {
        body_len: run.body.len(),
        run,
        child_urls,
        files,
    })
}
