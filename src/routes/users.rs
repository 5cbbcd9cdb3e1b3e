//! Users page routes.

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::guard::AdminUser;
use crate::services::users::{self, UserError, UserPage};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
}

pub(crate) fn user_error_to_status(err: &UserError) -> StatusCode {
    match err {
        UserError::NotFound(_) => StatusCode::NOT_FOUND,
        UserError::SelfDelete => StatusCode::CONFLICT,
        UserError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `GET /dashboard/users?page=N`: ten users per page, ordered by name.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPage>, StatusCode> {
    let page = users::normalize_page(query.page);
    users::list_users_page(&state.pool, admin.id, page)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "user listing failed");
            user_error_to_status(&e)
        })
}

/// `DELETE /dashboard/users/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(user_id): Path<Uuid>,
) -> StatusCode {
    match users::delete_user(&state.pool, admin.id, user_id).await {
        Ok(()) => {
            tracing::info!(admin = %admin.id, %user_id, "user deleted");
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            if matches!(e, UserError::Database(_)) {
                tracing::error!(error = %e, %user_id, "user delete failed");
            }
            user_error_to_status(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_statuses() {
        assert_eq!(user_error_to_status(&UserError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
        assert_eq!(user_error_to_status(&UserError::SelfDelete), StatusCode::CONFLICT);
        assert_eq!(
            user_error_to_status(&UserError::Database(sqlx::Error::PoolClosed)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
