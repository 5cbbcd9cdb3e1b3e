//! Auth guard — role-gated login, logout and session restore.
//!
//! ARCHITECTURE
//! ============
//! The identity service proves who the caller is; the account directory says
//! whether that identity may use the dashboard. A guard is built per request
//! from the caller's stored access token and owns the resulting `AuthState`.
//!
//! Every collaborator failure is folded into an `AuthFailure` and then into a
//! plain boolean (`login`) or the signed-out state (`initialize`). Callers
//! never learn which factor failed.
//!
//! TRADE-OFFS
//! ==========
//! A refused login always revokes the session it just created, even when the
//! refusal came from a transient directory error. The admin retries the login
//! instead of inheriting a half-authorized session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::config::RoleLookup;
use crate::services::directory::{AccountDirectory, AccountRecord, DirectoryError, is_admin_role};
use crate::services::identity::{IdentityError, IdentityService, Session};

// =============================================================================
// STATE
// =============================================================================

/// Admin account cached by the guard after a successful role check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<AccountRecord> for AdminUser {
    fn from(record: AccountRecord) -> Self {
        Self { id: record.id, email: record.email, name: record.name, role: record.role }
    }
}

/// Authentication state observed by route gates.
///
/// Fields are private so `is_authenticated` can only be set together with an
/// admin role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthState {
    is_authenticated: bool,
    role: Option<String>,
    is_loading: bool,
    user: Option<AdminUser>,
}

impl AuthState {
    /// Unresolved state: the identity check has not completed yet.
    #[must_use]
    pub fn loading() -> Self {
        Self { is_authenticated: false, role: None, is_loading: true, user: None }
    }

    /// Resolved, no admin session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self { is_authenticated: false, role: None, is_loading: false, user: None }
    }

    /// Resolved with an admin session. Returns `None` when the user's role is
    /// not admin.
    #[must_use]
    pub fn signed_in(user: AdminUser) -> Option<Self> {
        if !is_admin_role(&user.role) {
            return None;
        }
        Some(Self { is_authenticated: true, role: Some(user.role.clone()), is_loading: false, user: Some(user) })
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&AdminUser> {
        self.user.as_ref()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::loading()
    }
}

// =============================================================================
// FAILURES
// =============================================================================

/// Why a login or restore did not produce an admin session. Logged, never
/// returned to clients.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("credentials rejected")]
    CredentialRejected,
    #[error("authorization denied: {0}")]
    AuthorizationDenied(&'static str),
    #[error("service failure: {0}")]
    TransientServiceFailure(String),
}

impl AuthFailure {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialRejected => "credential_rejected",
            Self::AuthorizationDenied(_) => "authorization_denied",
            Self::TransientServiceFailure(_) => "transient_service_failure",
        }
    }
}

impl From<IdentityError> for AuthFailure {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => Self::CredentialRejected,
            other => Self::TransientServiceFailure(other.to_string()),
        }
    }
}

impl From<DirectoryError> for AuthFailure {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Ambiguous(_) => Self::AuthorizationDenied("ambiguous account"),
            DirectoryError::Db(e) => Self::TransientServiceFailure(e.to_string()),
        }
    }
}

// =============================================================================
// GUARD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardSettings {
    pub lookup: RoleLookup,
    /// Upper bound on each identity or directory call.
    pub timeout: Duration,
}

pub struct AuthGuard {
    identity: Arc<dyn IdentityService>,
    directory: Arc<dyn AccountDirectory>,
    settings: GuardSettings,
    stored_token: Option<String>,
    session: Option<Session>,
    state: AuthState,
}

impl AuthGuard {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        directory: Arc<dyn AccountDirectory>,
        settings: GuardSettings,
        stored_token: Option<String>,
    ) -> Self {
        Self { identity, directory, settings, stored_token, session: None, state: AuthState::loading() }
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Access token of the live session, if login or restore produced one.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// Restore the admin session behind the stored token, if any.
    pub async fn initialize(&mut self) {
        self.state = AuthState::loading();
        self.session = None;

        match self.restore().await {
            Ok(Some((session, state))) => {
                self.session = Some(session);
                self.state = state;
            }
            Ok(None) => self.state = AuthState::signed_out(),
            Err(failure) => {
                tracing::debug!(reason = failure.kind(), error = %failure, "session restore refused");
                self.state = AuthState::signed_out();
            }
        }
    }

    /// Exchange credentials and admit the caller only if their account is an
    /// admin. State is left untouched on any failure. A different session
    /// already held by this guard is revoked once the new one is admitted.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        match self.attempt_login(email, password).await {
            Ok((session, state)) => {
                if let Some(user) = state.user() {
                    tracing::info!(user_id = %user.id, "admin signed in");
                }
                let previous = self.stored_token.replace(session.access_token.clone());
                if let Some(previous) = previous.filter(|t| *t != session.access_token) {
                    self.release(&previous).await;
                }
                self.session = Some(session);
                self.state = state;
                true
            }
            Err(failure) => {
                tracing::info!(reason = failure.kind(), "admin login refused");
                false
            }
        }
    }

    /// Sign out of the identity service and reset to the signed-out state.
    pub async fn logout(&mut self) {
        let session_token = self.session.take().map(|s| s.access_token);
        let stored_token = self.stored_token.take();

        if let Some(token) = session_token.or(stored_token) {
            if let Err(failure) = self.bounded(self.identity.sign_out(&token)).await {
                tracing::warn!(error = %failure, "identity sign-out failed during logout");
            }
        }

        self.state = AuthState::signed_out();
    }

    async fn restore(&self) -> Result<Option<(Session, AuthState)>, AuthFailure> {
        let Some(token) = self.stored_token.as_deref() else {
            return Ok(None);
        };
        let Some(session) = self.bounded(self.identity.get_session(token)).await? else {
            return Ok(None);
        };
        let state = self.authorize(&session, &session.email).await?;
        Ok(Some((session, state)))
    }

    async fn attempt_login(&self, email: &str, password: &str) -> Result<(Session, AuthState), AuthFailure> {
        let session = self
            .bounded(self.identity.sign_in_with_password(email, password))
            .await?;

        match self.authorize(&session, email).await {
            Ok(state) => Ok((session, state)),
            Err(failure) => {
                self.release(&session.access_token).await;
                Err(failure)
            }
        }
    }

    /// Look up the account behind `session` and require the admin role.
    async fn authorize(&self, session: &Session, email: &str) -> Result<AuthState, AuthFailure> {
        let record = match self.settings.lookup {
            RoleLookup::ById => self.bounded(self.directory.find_by_id(session.user_id)).await?,
            RoleLookup::ByEmail => self.bounded(self.directory.find_by_email(email)).await?,
        };
        let record = record.ok_or(AuthFailure::AuthorizationDenied("no account"))?;
        AuthState::signed_in(record.into()).ok_or(AuthFailure::AuthorizationDenied("not an admin"))
    }

    /// Revoke a session that failed authorization or was superseded.
    async fn release(&self, access_token: &str) {
        if let Err(failure) = self.bounded(self.identity.sign_out(access_token)).await {
            tracing::warn!(error = %failure, "identity sign-out of released session failed");
        }
    }

    async fn bounded<T, E, F>(&self, call: F) -> Result<T, AuthFailure>
    where
        F: Future<Output = Result<T, E>>,
        AuthFailure: From<E>,
    {
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result.map_err(AuthFailure::from),
            Err(_) => Err(AuthFailure::TransientServiceFailure(format!(
                "no response within {}ms",
                self.settings.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
