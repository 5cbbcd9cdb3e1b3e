//! Auth routes — login page, password login, logout, session probe.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use super::gate::{DASHBOARD_PATH, LOGIN_PATH};
use crate::services::guard::AuthState;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");

// =============================================================================
// COOKIES
// =============================================================================

/// Access token carried by the session cookie, if any.
pub(crate) fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

pub(crate) fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub(crate) fn clear_session_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    let cookie = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO);
    jar.add(cookie)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /`: send the caller to the dashboard or the login page.
pub async fn root(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    let mut guard = state.auth_guard(session_token(&jar));
    guard.initialize().await;
    if guard.state().is_authenticated() {
        Redirect::to(DASHBOARD_PATH)
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

/// `GET /login`: static login form.
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_TEMPLATE)
}

#[derive(Deserialize)]
pub struct LoginBody {
    email: String,
    password: String,
}

/// `POST /api/auth/login`: admit admins only; failures carry no reason.
/// A session cookie already present is revoked once the new login succeeds.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(body): Json<LoginBody>) -> Response {
    let mut guard = state.auth_guard(session_token(&jar));
    if !guard.login(&body.email, &body.password).await {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "ok": false }))).into_response();
    }

    let Some(token) = guard.access_token().map(str::to_owned) else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let jar = jar.add(session_cookie(token, state.cookie_secure));
    let role = guard.state().role().map(str::to_owned);
    (jar, Json(serde_json::json!({ "ok": true, "role": role }))).into_response()
}

/// `POST /api/auth/logout`: revoke the identity session, clear the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let mut guard = state.auth_guard(session_token(&jar));
    guard.logout().await;
    (clear_session_cookie(jar, state.cookie_secure), StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`: resolved auth state for the caller's cookie.
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Json<AuthState> {
    let mut guard = state.auth_guard(session_token(&jar));
    guard.initialize().await;
    Json(guard.state().clone())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
