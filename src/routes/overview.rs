//! Dashboard landing route — totals plus the newest users and categories.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use crate::services::categories::{self, CategoryRow};
use crate::services::users::{self, UserRow};
use crate::state::AppState;

const LATEST_LIMIT: i64 = 10;

#[derive(Serialize)]
pub struct Overview {
    pub total_users: i64,
    pub total_categories: i64,
    pub latest_users: Vec<UserRow>,
    pub latest_categories: Vec<CategoryRow>,
}

/// `GET /dashboard`
pub async fn overview(State(state): State<AppState>) -> Result<Json<Overview>, StatusCode> {
    let pool = &state.pool;
    let (total_users, total_categories, latest_users, latest_categories) = tokio::try_join!(
        users::count_users(pool),
        categories::count_categories(pool),
        users::latest_users(pool, LATEST_LIMIT),
        categories::latest_categories(pool, LATEST_LIMIT),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "overview query failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(Overview { total_users, total_categories, latest_users, latest_categories }))
}
