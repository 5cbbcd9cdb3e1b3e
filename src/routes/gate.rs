//! Route gate for dashboard pages.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every `/dashboard` route sits behind `require_admin`. The middleware builds
//! an auth guard from the session cookie, initializes it once, and lets the
//! request through only when the guard resolved to an admin session. The
//! admitted `AdminUser` rides along in request extensions.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use super::auth::{clear_session_cookie, session_token};
use crate::services::guard::AuthState;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Identity check still running: show a neutral indicator, do not navigate.
    Wait,
    RedirectToLogin,
    Render,
}

#[must_use]
pub fn evaluate(state: &AuthState) -> GateDecision {
    if state.is_loading() {
        GateDecision::Wait
    } else if state.is_authenticated() {
        GateDecision::Render
    } else {
        GateDecision::RedirectToLogin
    }
}

fn waiting_response() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, [(RETRY_AFTER, "1")], Html("<p>Loading...</p>")).into_response()
}

/// Middleware: admit admins, send everyone else to the login page.
pub async fn require_admin(State(state): State<AppState>, jar: CookieJar, mut request: Request, next: Next) -> Response {
    let stored = session_token(&jar);
    let had_cookie = stored.is_some();
    let mut guard = state.auth_guard(stored);
    guard.initialize().await;

    match evaluate(guard.state()) {
        GateDecision::Wait => waiting_response(),
        GateDecision::Render => {
            let Some(user) = guard.state().user().cloned() else {
                return Redirect::to(LOGIN_PATH).into_response();
            };
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        GateDecision::RedirectToLogin if had_cookie => {
            // Stale or non-admin session: drop it so the login page starts clean.
            (clear_session_cookie(jar, state.cookie_secure), Redirect::to(LOGIN_PATH)).into_response()
        }
        GateDecision::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
