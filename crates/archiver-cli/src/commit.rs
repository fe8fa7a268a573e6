//! `archiver commit`: report an already archived run as complete.

use anyhow::{bail, Context, Result};
use clap::Args;

use archiver_client::{CompletionNotifier, CompletionReceipt, NotifierConfig};
use archiver_core::RunId;
use archiver_store::ArchiveStore;

/// Arguments for `archiver commit`.
#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
    /// Run to report.
    #[arg(long)]
    pub run_id: i64,
}

/// Execute `archiver commit`.
pub async fn run_commit(args: &CommitArgs, store: &ArchiveStore) -> Result<u8> {
    let config = NotifierConfig::from_env().context("loading notifier configuration")?;
    let notifier = CompletionNotifier::new(config).context("building notifier")?;

    let receipt = commit(store, &notifier, RunId(args.run_id)).await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(0)
}

/// Report `run_id` after checking that it exists locally.
pub async fn commit(
    store: &ArchiveStore,
    notifier: &CompletionNotifier,
    run_id: RunId,
) -> Result<CompletionReceipt> {
    if store.get_run(run_id).await?.is_none() {
        bail!("{run_id} not found; nothing to commit");
    }
    let receipt = notifier
        .notify(run_id)
        .await
        .with_context(|| format!("committing {run_id}"))?;
    Ok(receipt)
}
