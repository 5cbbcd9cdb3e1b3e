//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Public routes (root redirect, login page, auth API, health) sit beside the
//! `/dashboard` tree, which is wrapped in the admin route gate.

pub mod auth;
pub mod categories;
pub mod gate;
pub mod overview;
pub mod users;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Routes behind the admin gate.
fn dashboard_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(overview::overview))
        .route("/dashboard/users", get(users::list_users))
        .route("/dashboard/users/{id}", delete(users::delete_user))
        .route(
            "/dashboard/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/dashboard/categories/{id}",
            patch(categories::update_category).delete(categories::delete_category),
        )
        .layer(DefaultBodyLimit::max(categories::CATEGORY_BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(state, gate::require_admin))
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(auth::root))
        .route("/login", get(auth::login_page))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/healthz", get(healthz))
        .merge(dashboard_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
