//! Hosted identity service client — password sign-in, sign-out, session lookup.
//!
//! DESIGN
//! ======
//! The guard only sees the `IdentityService` trait. `HostedIdentity` speaks the
//! GoTrue-compatible REST API exposed by the hosted project. Response parsing
//! lives in pure functions for testability.

use std::time::Duration;

use uuid::Uuid;

use crate::config::ServiceConfig;

/// Proof of identity returned by a successful credential exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The identity service refused the email/password pair.
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("identity request failed: {0}")]
    Request(String),

    #[error("identity response error: status {status}")]
    Response { status: u16, body: String },

    #[error("identity response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Identity operations consumed by the auth guard.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchange an email/password pair for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Resolve a stored access token to its session. `Ok(None)` means the
    /// token is unknown or expired.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HostedIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HostedIdentity {
    /// Build a client for the project described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ServiceConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), api_key: config.api_key.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }
}

#[async_trait::async_trait]
impl IdentityService for HostedIdentity {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.url("token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        match status {
            200 => parse_token_response(&text),
            400 | 401 | 422 => Err(IdentityError::InvalidCredentials),
            _ => Err(IdentityError::Response { status, body: text }),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status();
        // An already-revoked token is as signed out as it gets.
        if status.is_success() || matches!(status.as_u16(), 401 | 403 | 404) {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(IdentityError::Response { status: status.as_u16(), body })
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, IdentityError> {
        let response = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        match status {
            200 => parse_user_response(access_token, &text).map(Some),
            401 | 403 => Ok(None),
            _ => Err(IdentityError::Response { status, body: text }),
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    user: ApiUser,
}

#[derive(serde::Deserialize)]
struct ApiUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_token_response(json: &str) -> Result<Session, IdentityError> {
    let token: TokenResponse = serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;
    if token.access_token.is_empty() {
        return Err(IdentityError::Parse("empty access token".into()));
    }
    Ok(Session { access_token: token.access_token, user_id: token.user.id, email: token.user.email.unwrap_or_default() })
}

fn parse_user_response(access_token: &str, json: &str) -> Result<Session, IdentityError> {
    let user: ApiUser = serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;
    Ok(Session { access_token: access_token.to_owned(), user_id: user.id, email: user.email.unwrap_or_default() })
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
