//! Run-completion notifier: drives one [`Handshake`] per call.

use std::time::Duration;

use archiver_core::RunId;
use serde::Serialize;

use crate::config::NotifierConfig;
use crate::error::NotifyError;
use crate::handshake::Handshake;

/// Proof that a run was reported and accepted.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReceipt {
    pub run_id: RunId,
    /// HTTP status returned by the report endpoint.
    pub status: u16,
    /// Claims of the verified token used for the report.
    pub claims: serde_json::Value,
}

/// Reports finished runs to the identity service.
///
/// Holds no per-run state; concurrent `notify` calls for different runs are
/// independent handshakes sharing one connection pool.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    http: reqwest::Client,
    config: NotifierConfig,
}

impl CompletionNotifier {
    pub fn new(config: NotifierConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| NotifyError::Transport {
                endpoint: "client_init".into(),
                source,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Run the full handshake for `run_id`. A failure at any step ends the
    /// handshake; nothing is retried.
    pub async fn notify(&self, run_id: RunId) -> Result<CompletionReceipt, NotifyError> {
        let reported = Handshake::new(&self.http, &self.config, run_id)
            .request_token()
            .await?
            .verify()?
            .report()
            .await?;

        Ok(CompletionReceipt {
            run_id,
            status: reported.status(),
            claims: reported.claims().clone(),
        })
    }
}
