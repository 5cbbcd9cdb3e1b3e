use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{self, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::*;
use crate::services::directory::AccountRecord;
use crate::state::test_helpers::{FakeDirectory, FakeIdentity, PASSWORD, account, test_app_state};

struct Fixture {
    app: Router,
    identity: Arc<FakeIdentity>,
    account: AccountRecord,
}

fn fixture(role: &str) -> Fixture {
    let account = account("admin@site.com", role);
    let identity = Arc::new(FakeIdentity::default());
    identity.register(&account.email, account.id);
    let state = test_app_state(identity.clone(), Arc::new(FakeDirectory::with(vec![account.clone()])));
    Fixture { app: crate::routes::app(state), identity, account }
}

fn login_request(email: &str, password: &str) -> http::Request<Body> {
    http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "email": email, "password": password }).to_string()))
        .unwrap()
}

fn request_with_cookie(method: &str, uri: &str, token: Option<&str>) -> http::Request<Body> {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{COOKIE_NAME}={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Token value from a `session_token=<value>; ...` header.
fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("session_token="))
        .unwrap_or_default()
        .to_owned()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// cookies
// =============================================================================

#[test]
fn session_token_reads_cookie() {
    let jar = CookieJar::new().add(Cookie::new(COOKIE_NAME, "abc"));
    assert_eq!(session_token(&jar), Some("abc".to_owned()));
}

#[test]
fn session_token_ignores_empty_or_missing_cookie() {
    assert_eq!(session_token(&CookieJar::new()), None);
    let jar = CookieJar::new().add(Cookie::new(COOKIE_NAME, ""));
    assert_eq!(session_token(&jar), None);
}

#[test]
fn session_cookie_is_http_only_and_site_wide() {
    let cookie = session_cookie("tok".into(), true);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_admin_sets_session_cookie() {
    let f = fixture("Admin");
    let response = f
        .app
        .oneshot(login_request("admin@site.com", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie_value(&cookie).is_empty());

    let body = json_body(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["role"], "Admin");
}

#[tokio::test]
async fn login_wrong_password_is_opaque_401() {
    let f = fixture("admin");
    let response = f
        .app
        .oneshot(login_request("admin@site.com", "nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    assert_eq!(json_body(response).await, serde_json::json!({ "ok": false }));
}

#[tokio::test]
async fn login_non_admin_is_same_opaque_401_and_revoked() {
    let f = fixture("user");
    let response = f
        .app
        .oneshot(login_request("admin@site.com", PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    assert_eq!(json_body(response).await, serde_json::json!({ "ok": false }));
    assert_eq!(f.identity.sign_outs().len(), 1);
    assert_eq!(f.identity.live_sessions(), 0);
}

#[tokio::test]
async fn login_over_existing_cookie_revokes_old_session() {
    let f = fixture("admin");
    let old = f.identity.issue(&f.account.email, f.account.id);
    let mut request = login_request("admin@site.com", PASSWORD);
    request
        .headers_mut()
        .insert(header::COOKIE, format!("{COOKIE_NAME}={old}").parse().unwrap());

    let response = f.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fresh = cookie_value(&set_cookie(&response).unwrap());
    assert_ne!(fresh, old);
    assert_eq!(f.identity.sign_outs(), vec![old]);
    assert_eq!(f.identity.live_sessions(), 1);
}

// =============================================================================
// session round trip
// =============================================================================

#[tokio::test]
async fn login_then_me_then_logout() {
    let f = fixture("admin");
    let response = f
        .app
        .clone()
        .oneshot(login_request("admin@site.com", PASSWORD))
        .await
        .unwrap();
    let token = cookie_value(&set_cookie(&response).unwrap());

    let me = f
        .app
        .clone()
        .oneshot(request_with_cookie("GET", "/api/auth/me", Some(&token)))
        .await
        .unwrap();
    let state = json_body(me).await;
    assert_eq!(state["is_authenticated"], true);
    assert_eq!(state["is_loading"], false);
    assert_eq!(state["user"]["id"], f.account.id.to_string());

    let logout = f
        .app
        .clone()
        .oneshot(request_with_cookie("POST", "/api/auth/logout", Some(&token)))
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&logout).unwrap().contains("Max-Age=0"));
    assert_eq!(f.identity.sign_outs(), vec![token.clone()]);

    let after = f
        .app
        .oneshot(request_with_cookie("GET", "/api/auth/me", Some(&token)))
        .await
        .unwrap();
    let state = json_body(after).await;
    assert_eq!(state["is_authenticated"], false);
    assert_eq!(state["role"], serde_json::Value::Null);
}

#[tokio::test]
async fn me_without_cookie_is_resolved_signed_out() {
    let f = fixture("admin");
    let response = f
        .app
        .oneshot(request_with_cookie("GET", "/api/auth/me", None))
        .await
        .unwrap();
    let state = json_body(response).await;
    assert_eq!(state["is_authenticated"], false);
    assert_eq!(state["is_loading"], false);
}

#[tokio::test]
async fn logout_without_cookie_still_clears() {
    let f = fixture("admin");
    let response = f
        .app
        .oneshot(request_with_cookie("POST", "/api/auth/logout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(f.identity.sign_outs().is_empty());
}

// =============================================================================
// root + login page
// =============================================================================

#[tokio::test]
async fn root_redirects_by_session() {
    let f = fixture("admin");
    let anonymous = f
        .app
        .clone()
        .oneshot(request_with_cookie("GET", "/", None))
        .await
        .unwrap();
    assert_eq!(anonymous.headers()[header::LOCATION], LOGIN_PATH);

    let token = f.identity.issue(&f.account.email, f.account.id);
    let admin = f
        .app
        .oneshot(request_with_cookie("GET", "/", Some(&token)))
        .await
        .unwrap();
    assert_eq!(admin.headers()[header::LOCATION], DASHBOARD_PATH);
}

#[tokio::test]
async fn login_page_serves_form() {
    let Html(page) = login_page().await;
    assert!(page.contains("<form"));
    assert!(page.contains("/api/auth/login"));
}
