//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the database pool and the collaborator clients. Authentication state
//! is not stored here: each request builds its own `AuthGuard` from the
//! caller's session cookie.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::directory::AccountDirectory;
use crate::services::guard::{AuthGuard, GuardSettings};
use crate::services::identity::IdentityService;
use crate::services::storage::ObjectStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub identity: Arc<dyn IdentityService>,
    pub directory: Arc<dyn AccountDirectory>,
    pub storage: Arc<dyn ObjectStore>,
    pub guard_settings: GuardSettings,
    pub cookie_secure: bool,
}

impl AppState {
    /// Build a guard for one request, seeded with the caller's stored token.
    #[must_use]
    pub fn auth_guard(&self, stored_token: Option<String>) -> AuthGuard {
        AuthGuard::new(self.identity.clone(), self.directory.clone(), self.guard_settings, stored_token)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
