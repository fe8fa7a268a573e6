//! # archiver-client — HTTP Boundary of the Crawl Archiver
//!
//! Two outbound concerns live here:
//!
//! - **Fetch** ([`HttpFetcher`]): one GET per run, no retry, producing the
//!   [`FetchResult`](archiver_core::FetchResult) a run is recorded from.
//! - **Completion handshake** ([`CompletionNotifier`]): authenticate to the
//!   identity service and report a finished run.
//!
//! ## Handshake Protocol
//!
//! ```text
//! Idle ──request_token()──▶ TokenRequested ──verify()──▶ TokenVerified ──report()──▶ Reported
//!   │                             │                           │
//!   └─────────────────────────────┴───────────────────────────┴──────▶ Failed (Err)
//! ```
//!
//! | Step | Call | Auth |
//! |------|------|------|
//! | token | `POST {ident}/jwt` | `access_token: <credential>` header |
//! | key | `GET {ident}/publickey` | none |
//! | report | `GET {ident}/session?run_id=N` | `Authorization: Bearer <jwt>` |
//!
//! The token is an RS256 JWT checked against the fetched public key. A token
//! that fails verification is never presented to the report endpoint.
//!
//! No step is retried. Retrying a report after an ambiguous network failure
//! could register the same run twice, so that decision belongs to the caller.

pub mod config;
pub mod error;
pub mod fetch;
pub mod handshake;
pub mod notifier;

pub use config::{ConfigError, CredentialSource, NotifierConfig};
pub use error::{FailureKind, FetchError, NotifyError};
pub use fetch::HttpFetcher;
pub use handshake::{Handshake, HandshakeState, Idle, Reported, TokenRequested, TokenVerified};
pub use notifier::{CompletionNotifier, CompletionReceipt};
