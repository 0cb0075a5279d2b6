//! HTTP adapter for an identity provider relay.
//!
//! # Endpoints
//! ```text
//! GET  /v1/session        → { loggedIn }
//! GET  /v1/user/metadata  → { email, publicAddress }
//! POST /v1/auth/login     { email } → { sessionToken }   (long-poll until verified)
//! POST /v1/auth/logout
//! POST /v1/solana/sign    { transaction, requireAllSignatures, verifySignatures }
//!                         → { rawTransaction }           (base64 wire bytes)
//! ```
//!
//! # Security
//! - The publishable key goes in `Authorization: Bearer`
//! - The session token lives only in memory and is never logged

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::IdentityConfig;
use crate::error::{AuthError, SigningError, WalletError, WalletResult};
use crate::identity::provider::IdentityProvider;
use crate::identity::types::{SignOptions, SignedPayload, UserMetadata};

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "X-Session-Token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    logged_in: bool,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    session_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    transaction: String,
    #[serde(flatten)]
    options: SignOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    raw_transaction: String,
}

/// Identity provider reached over HTTP.
pub struct RelayIdentityProvider {
    http: reqwest::Client,
    base_url: url::Url,
    publishable_key: String,
    short_timeout: Duration,
    session_token: ArcSwapOption<String>,
}

impl RelayIdentityProvider {
    pub fn new(config: &IdentityConfig) -> WalletResult<Self> {
        let base_url = config.api_url.parse::<url::Url>().map_err(|e| {
            AuthError::Provider(format!("Invalid identity API URL '{}': {}", config.api_url, e))
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            publishable_key: config.publishable_key.clone(),
            short_timeout: Duration::from_secs(config.request_timeout_secs),
            session_token: ArcSwapOption::empty(),
        })
    }

    fn endpoint(&self, path: &str) -> WalletResult<url::Url> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Provider(format!("bad endpoint {}: {}", path, e)).into())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.bearer_auth(&self.publishable_key);
        match self.session_token.load_full() {
            Some(token) => request.header(SESSION_HEADER, token.as_str()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> WalletResult<reqwest::Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()).into())
    }
}

async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Status mapping for login, logout and session calls.
fn auth_error(status: StatusCode, body: String) -> WalletError {
    let err = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AuthError::Rejected(body),
        StatusCode::UNAUTHORIZED => AuthError::NotAuthenticated,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AuthError::VerificationTimeout,
        StatusCode::CONFLICT => AuthError::Cancelled,
        other => AuthError::Provider(format!("HTTP {}: {}", other, body)),
    };
    err.into()
}

/// Status mapping for the signing call.
fn signing_error(status: StatusCode, body: String) -> WalletError {
    match status {
        StatusCode::UNAUTHORIZED => AuthError::NotAuthenticated.into(),
        StatusCode::FORBIDDEN | StatusCode::CONFLICT => SigningError::UserRejected.into(),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => SigningError::Timeout.into(),
        other => SigningError::Failed(format!("HTTP {}: {}", other, body)).into(),
    }
}

#[async_trait]
impl IdentityProvider for RelayIdentityProvider {
    async fn is_logged_in(&self) -> WalletResult<bool> {
        let request = self.http.get(self.endpoint("v1/session")?).timeout(self.short_timeout);
        let response = self.send(request).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(auth_error(status, error_body(response).await));
        }
        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("session response: {}", e)))?;
        Ok(session.logged_in)
    }

    async fn get_metadata(&self) -> WalletResult<UserMetadata> {
        let request = self.http.get(self.endpoint("v1/user/metadata")?).timeout(self.short_timeout);
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(auth_error(status, error_body(response).await));
        }
        response
            .json()
            .await
            .map_err(|e| AuthError::MalformedMetadata(e.to_string()).into())
    }

    async fn login_with_email(&self, email: &str) -> WalletResult<()> {
        // No client-side deadline: the provider decides when verification expires
        let request = self.http.post(self.endpoint("v1/auth/login")?).json(&LoginRequest { email });
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(auth_error(status, error_body(response).await));
        }
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("login response: {}", e)))?;
        self.session_token.store(Some(Arc::new(login.session_token)));
        Ok(())
    }

    async fn logout(&self) -> WalletResult<()> {
        let request = self.http.post(self.endpoint("v1/auth/logout")?).timeout(self.short_timeout);
        let result = self.send(request).await;
        // The local token is gone whatever the relay says
        let previous = self.session_token.swap(None);
        let response = result?;
        let status = response.status();
        if !status.is_success() && !(status == StatusCode::UNAUTHORIZED && previous.is_none()) {
            return Err(auth_error(status, error_body(response).await));
        }
        Ok(())
    }

    async fn sign_transaction(
        &self,
        unsigned_tx: &[u8],
        options: SignOptions,
    ) -> WalletResult<SignedPayload> {
        let body = SignRequest {
            transaction: BASE64.encode(unsigned_tx),
            options,
        };
        let request = self.http.post(self.endpoint("v1/solana/sign")?).json(&body);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| SigningError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(signing_error(status, error_body(response).await));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| SigningError::Failed(format!("sign response: {}", e)))?;
        let raw_transaction = BASE64
            .decode(signed.raw_transaction.as_bytes())
            .map_err(|e| SigningError::PayloadMismatch(format!("rawTransaction is not base64: {}", e)))?;

        Ok(SignedPayload { raw_transaction })
    }
}

impl std::fmt::Debug for RelayIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayIdentityProvider")
            .field("base_url", &self.base_url.as_str())
            .field("has_session", &self.session_token.load().is_some())
            .finish()
    }
}
