//! # Completion Handshake Typestate
//!
//! Each handshake step consumes the previous state and returns the next,
//! so a token can only be presented to the report endpoint after it has
//! passed verification. There is no `Failed` type: every transition
//! returns `Result`, and the `Err` arm is the terminal failure state.
//!
//! ```rust,no_run
//! # use archiver_client::{Handshake, NotifierConfig};
//! # use archiver_core::RunId;
//! # async fn demo(http: reqwest::Client, config: NotifierConfig) -> Result<(), archiver_client::NotifyError> {
//! let reported = Handshake::new(&http, &config, RunId(1))
//!     .request_token()
//!     .await?
//!     .verify()?
//!     .report()
//!     .await?;
//! assert_eq!(reported.state_name(), "REPORTED");
//! # Ok(())
//! # }
//! ```

use archiver_core::RunId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use zeroize::Zeroizing;

use crate::config::NotifierConfig;
use crate::error::NotifyError;

/// Header carrying the producer credential on the token request.
const CREDENTIAL_HEADER: &str = "access_token";

// ─── State Types ─────────────────────────────────────────────────────

/// Handshake state: nothing requested yet.
#[derive(Debug, Clone, Copy)]
pub struct Idle;

/// Handshake state: token and public key fetched, token not yet trusted.
pub struct TokenRequested {
    token: Zeroizing<String>,
    public_key_pem: String,
}

/// Handshake state: token signature and time claims verified.
pub struct TokenVerified {
    token: Zeroizing<String>,
    claims: serde_json::Value,
}

/// Handshake state: report accepted (terminal).
#[derive(Debug, Clone)]
pub struct Reported {
    status: u16,
    claims: serde_json::Value,
}

impl std::fmt::Debug for TokenRequested {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequested")
            .field("token", &"[REDACTED]")
            .field("public_key_pem", &self.public_key_pem)
            .finish()
    }
}

impl std::fmt::Debug for TokenVerified {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerified")
            .field("token", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Idle {}
    impl Sealed for super::TokenRequested {}
    impl Sealed for super::TokenVerified {}
    impl Sealed for super::Reported {}
}

/// Marker trait for the handshake states. Sealed.
pub trait HandshakeState: private::Sealed + std::fmt::Debug {
    /// Canonical state name (e.g. "TOKEN_VERIFIED").
    fn name() -> &'static str;

    fn is_terminal() -> bool {
        false
    }
}

impl HandshakeState for Idle {
    fn name() -> &'static str {
        "IDLE"
    }
}

impl HandshakeState for TokenRequested {
    fn name() -> &'static str {
        "TOKEN_REQUESTED"
    }
}

impl HandshakeState for TokenVerified {
    fn name() -> &'static str {
        "TOKEN_VERIFIED"
    }
}

impl HandshakeState for Reported {
    fn name() -> &'static str {
        "REPORTED"
    }

    fn is_terminal() -> bool {
        true
    }
}

// ─── Handshake ───────────────────────────────────────────────────────

/// One completion handshake for one run.
#[derive(Debug)]
pub struct Handshake<'a, S: HandshakeState> {
    http: &'a reqwest::Client,
    config: &'a NotifierConfig,
    run_id: RunId,
    state: S,
}

impl<'a, S: HandshakeState> Handshake<'a, S> {
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    pub fn is_terminal(&self) -> bool {
        S::is_terminal()
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    fn advance<T: HandshakeState>(self, state: T) -> Handshake<'a, T> {
        tracing::debug!(
            run_id = self.run_id.get(),
            from = S::name(),
            to = T::name(),
            "handshake transition"
        );
        Handshake {
            http: self.http,
            config: self.config,
            run_id: self.run_id,
            state,
        }
    }
}

impl<'a> Handshake<'a, Idle> {
    pub fn new(http: &'a reqwest::Client, config: &'a NotifierConfig, run_id: RunId) -> Self {
        Self {
            http,
            config,
            run_id,
            state: Idle,
        }
    }

    /// IDLE → TOKEN_REQUESTED.
    ///
    /// Resolves the credential first; a missing credential fails before any
    /// request is sent. Then requests a token and fetches the service's
    /// current public key.
    pub async fn request_token(self) -> Result<Handshake<'a, TokenRequested>, NotifyError> {
        let credential = self.config.credential.resolve().ok_or_else(|| {
            let var = self.config.credential.origin().to_string();
            tracing::error!(run_id = self.run_id.get(), credential = %var, "completion credential missing");
            NotifyError::MissingCredential { var }
        })?;
        let mut credential_value = HeaderValue::from_str(credential.as_str()).map_err(|_| {
            let var = self.config.credential.origin().to_string();
            tracing::error!(run_id = self.run_id.get(), credential = %var, "completion credential is not a valid header value");
            NotifyError::InvalidCredential { var }
        })?;
        credential_value.set_sensitive(true);

        let jwt_url = self.config.endpoint("jwt")?;
        let resp = self
            .http
            .post(jwt_url.clone())
            .header(CREDENTIAL_HEADER, credential_value)
            .send()
            .await
            .map_err(NotifyError::transport(&jwt_url))?;
        let token = Zeroizing::new(read_success_body(resp, &jwt_url).await?.trim().to_string());
        if token.is_empty() {
            return Err(NotifyError::IdentityRejected {
                endpoint: jwt_url.to_string(),
                status: 200,
                body: "empty token".into(),
            });
        }

        let key_url = self.config.endpoint("publickey")?;
        let resp = self
            .http
            .get(key_url.clone())
            .send()
            .await
            .map_err(NotifyError::transport(&key_url))?;
        let public_key_pem = read_success_body(resp, &key_url).await?;

        Ok(self.advance(TokenRequested {
            token,
            public_key_pem,
        }))
    }
}

impl<'a> Handshake<'a, TokenRequested> {
    /// TOKEN_REQUESTED → TOKEN_VERIFIED.
    ///
    /// RS256 only. `exp` and `nbf` are enforced when present; no claim is
    /// required and the audience is not checked.
    pub fn verify(self) -> Result<Handshake<'a, TokenVerified>, NotifyError> {
        let run_id = self.run_id.get();
        let claims = verify_rs256(&self.state.token, &self.state.public_key_pem).map_err(|e| {
            tracing::error!(run_id, error = %e, "completion token failed verification");
            e
        })?;
        let token = self.state.token.clone();
        Ok(self.advance(TokenVerified { token, claims }))
    }
}

impl<'a> Handshake<'a, TokenVerified> {
    pub fn claims(&self) -> &serde_json::Value {
        &self.state.claims
    }

    /// TOKEN_VERIFIED → REPORTED.
    ///
    /// Presents the verified token as a bearer credential. Any non-success
    /// status is a rejection; nothing is retried.
    pub async fn report(self) -> Result<Handshake<'a, Reported>, NotifyError> {
        let run_id = self.run_id.get();
        let mut url = self.config.endpoint("session")?;
        url.query_pairs_mut()
            .append_pair("run_id", &run_id.to_string());

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", self.state.token.as_str()))
            .map_err(|_| NotifyError::SignatureInvalid {
                reason: "token is not a valid header value".into(),
            })?;
        bearer.set_sensitive(true);

        let resp = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, bearer)
            .send()
            .await
            .map_err(NotifyError::transport(&url))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(run_id, status, "completion report rejected");
            return Err(NotifyError::ReportRejected {
                run_id,
                status,
                body,
            });
        }

        tracing::info!(run_id, status, "run reported complete");
        let claims = self.state.claims.clone();
        Ok(self.advance(Reported { status, claims }))
    }
}

impl Handshake<'_, Reported> {
    pub fn status(&self) -> u16 {
        self.state.status
    }

    pub fn claims(&self) -> &serde_json::Value {
        &self.state.claims
    }
}

/// Read a response body, rejecting non-success statuses as identity
/// failures.
async fn read_success_body(resp: reqwest::Response, endpoint: &url::Url) -> Result<String, NotifyError> {
    let status = resp.status();
    let body = resp.text().await.map_err(NotifyError::transport(endpoint))?;
    if !status.is_success() {
        tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "identity service rejected request");
        return Err(NotifyError::IdentityRejected {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn verify_rs256(token: &str, public_key_pem: &str) -> Result<serde_json::Value, NotifyError> {
    let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes()).map_err(|e| {
        NotifyError::SignatureInvalid {
            reason: format!("unusable public key: {e}"),
        }
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.required_spec_claims.clear();
    validation.validate_aud = false;
    validation.validate_nbf = true;

    decode::<serde_json::Value>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| NotifyError::SignatureInvalid {
            reason: e.to_string(),
        })
}
