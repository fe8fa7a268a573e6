//! Identity-service client configuration.
//!
//! The base URL defaults to the production identity service. Override via
//! environment variables or explicit construction for staging and tests.

use url::Url;
use zeroize::Zeroizing;

/// Production identity service.
pub const DEFAULT_IDENT_URL: &str = "https://ident.archivers.space";

/// Environment variable holding the producer's API key.
pub const DEFAULT_CREDENTIAL_VAR: &str = "MORPH_DT_API_KEY";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the handshake obtains its secret credential.
///
/// The secret is resolved when a handshake starts, not when the
/// configuration is built, so a notifier can be constructed in an
/// environment that does not (yet) carry the key.
#[derive(Clone)]
pub enum CredentialSource {
    /// Read the named environment variable.
    Env { var: String },
    /// A credential supplied directly by the caller.
    Inline(Zeroizing<String>),
}

impl CredentialSource {
    /// Credential read from `MORPH_DT_API_KEY`.
    pub fn default_env() -> Self {
        Self::Env {
            var: DEFAULT_CREDENTIAL_VAR.to_string(),
        }
    }

    /// Human-readable origin, safe to log.
    pub fn origin(&self) -> &str {
        match self {
            Self::Env { var } => var,
            Self::Inline(_) => "<inline>",
        }
    }

    /// Resolve the secret with surrounding whitespace removed. `None` when
    /// the variable is unset, not valid unicode, or blank.
    pub(crate) fn resolve(&self) -> Option<Zeroizing<String>> {
        let raw = match self {
            Self::Env { var } => Zeroizing::new(std::env::var(var).ok()?),
            Self::Inline(secret) => secret.clone(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Zeroizing::new(trimmed.to_string()))
        }
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env { var } => f.debug_struct("Env").field("var", var).finish(),
            Self::Inline(_) => f.debug_tuple("Inline").field(&"[REDACTED]").finish(),
        }
    }
}

/// Configuration for the completion handshake.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Base URL of the identity service. `jwt`, `publickey` and `session`
    /// are resolved relative to it.
    pub ident_base_url: Url,
    /// Source of the secret presented to the token endpoint.
    pub credential: CredentialSource,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl NotifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ARCHIVER_IDENT_URL` (default: `https://ident.archivers.space`)
    /// - `ARCHIVER_TIMEOUT_SECS` (default: 30)
    ///
    /// The credential is read from `MORPH_DT_API_KEY` when a handshake
    /// starts.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            ident_base_url: env_url("ARCHIVER_IDENT_URL", DEFAULT_IDENT_URL)?,
            credential: CredentialSource::default_env(),
            timeout_secs: std::env::var("ARCHIVER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Configuration pointing at a local mock server with an inline
    /// credential (for testing).
    pub fn local_mock(base_url: &str, credential: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            ident_base_url: parse_url("ident base url", base_url)?,
            credential: CredentialSource::Inline(Zeroizing::new(credential.to_string())),
            timeout_secs: 5,
        })
    }

    /// Replace the credential source.
    pub fn with_credential(mut self, credential: CredentialSource) -> Self {
        self.credential = credential;
        self
    }

    /// Resolve `path` against the base URL, treating the base as a
    /// directory even when it lacks a trailing slash.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let mut base = self.ident_base_url.clone();
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        base.join(path)
            .map_err(|e| ConfigError::InvalidUrl(path.to_string(), e.to_string()))
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn parse_url(what: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(what.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
