//! Client error types.

use crate::config::ConfigError;

/// Errors from the single-attempt resource fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The target could not be parsed as a URL.
    #[error("invalid fetch URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Transport failure: DNS, connect, TLS, timeout.
    #[error("HTTP error fetching {url}: {source}")]
    Http { url: String, source: reqwest::Error },
    /// The response body could not be read to completion.
    #[error("failed to read response body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Failure classes of the completion handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No usable credential, or invalid configuration. Operator action
    /// required.
    MissingCredential,
    /// The identity or report service could not be reached.
    Transport,
    /// The token or public-key endpoint answered with a non-success status,
    /// or with a body that cannot be used.
    IdentityRejected,
    /// The issued token failed signature or claim validation.
    SignatureInvalid,
    /// The report endpoint answered with a non-success status.
    ReportRejected,
}

/// Errors from the completion handshake. Each one is terminal: the
/// handshake is in its failed state once one is returned.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("credential {var} is not set in the environment")]
    MissingCredential { var: String },

    #[error("credential {var} is set but is not a valid HTTP header value")]
    InvalidCredential { var: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("identity service {endpoint} returned {status}: {body}")]
    IdentityRejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("token signature invalid: {reason}")]
    SignatureInvalid { reason: String },

    #[error("report for run {run_id} rejected with {status}: {body}")]
    ReportRejected {
        run_id: i64,
        status: u16,
        body: String,
    },
}

impl NotifyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingCredential { .. } | Self::InvalidCredential { .. } | Self::Config(_) => {
                FailureKind::MissingCredential
            }
            Self::Transport { .. } => FailureKind::Transport,
            Self::IdentityRejected { .. } => FailureKind::IdentityRejected,
            Self::SignatureInvalid { .. } => FailureKind::SignatureInvalid,
            Self::ReportRejected { .. } => FailureKind::ReportRejected,
        }
    }

    pub(crate) fn transport(endpoint: &url::Url) -> impl FnOnce(reqwest::Error) -> Self + '_ {
        move |source| Self::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        let missing = NotifyError::MissingCredential {
            var: "MORPH_DT_API_KEY".into(),
        };
        assert_eq!(missing.kind(), FailureKind::MissingCredential);
        assert!(missing.to_string().contains("MORPH_DT_API_KEY"));

        let sig = NotifyError::SignatureInvalid {
            reason: "InvalidSignature".into(),
        };
        assert_eq!(sig.kind(), FailureKind::SignatureInvalid);

        let report = NotifyError::ReportRejected {
            run_id: 7,
            status: 401,
            body: "nope".into(),
        };
        assert_eq!(report.kind(), FailureKind::ReportRejected);
        assert_eq!(report.to_string(), "report for run 7 rejected with 401: nope");

        let invalid = NotifyError::InvalidCredential {
            var: "MORPH_DT_API_KEY".into(),
        };
        assert_eq!(invalid.kind(), FailureKind::MissingCredential);
        assert!(!invalid.to_string().contains("not set"));

        let config = NotifyError::from(ConfigError::InvalidUrl("x".into(), "bad".into()));
        assert_eq!(config.kind(), FailureKind::MissingCredential);
    }
}
