//! Categories page routes — list, multipart create/edit, delete.

use axum::Extension;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use uuid::Uuid;

use crate::services::categories::{self, CategoryError, CategoryRow, ImageUpload};
use crate::services::guard::AdminUser;
use crate::services::storage::{ImageError, MAX_IMAGE_BYTES};
use crate::state::AppState;

/// Request body ceiling for category uploads: one image plus form overhead.
pub const CATEGORY_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

#[derive(Debug, Default)]
pub(crate) struct CategoryForm {
    pub name: String,
    pub image: Option<ImageUpload>,
}

/// Collect the `name` and `image` parts. An empty file part counts as no image.
async fn read_form(mut multipart: Multipart) -> Result<CategoryForm, StatusCode> {
    let mut form = CategoryForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.status())? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => form.name = field.text().await.map_err(|e| e.status())?,
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| e.status())?;
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

pub(crate) fn category_error_to_status(err: &CategoryError) -> StatusCode {
    match err {
        CategoryError::NameRequired | CategoryError::Image(ImageError::Missing | ImageError::NotAnImage) => {
            StatusCode::BAD_REQUEST
        }
        CategoryError::Image(ImageError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
        CategoryError::NotFound(_) => StatusCode::NOT_FOUND,
        CategoryError::Storage(_) => StatusCode::BAD_GATEWAY,
        CategoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn category_error_response(err: CategoryError) -> Response {
    let status = category_error_to_status(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "category operation failed");
        return status.into_response();
    }
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

/// `GET /dashboard/categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryRow>>, StatusCode> {
    categories::list_categories(&state.pool)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "category listing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// `POST /dashboard/categories`: multipart `name` + `image`.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(status) => return status.into_response(),
    };
    match categories::create_category(&state.pool, state.storage.as_ref(), &form.name, form.image).await {
        Ok(row) => {
            tracing::info!(admin = %admin.id, category = %row.id, "category created");
            (StatusCode::CREATED, Json(row)).into_response()
        }
        Err(e) => category_error_response(e),
    }
}

/// `PATCH /dashboard/categories/:id`: multipart `name` + optional `image`.
pub async fn update_category(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(status) => return status.into_response(),
    };
    match categories::update_category(&state.pool, state.storage.as_ref(), id, &form.name, form.image).await {
        Ok(row) => {
            tracing::info!(admin = %admin.id, category = %id, "category updated");
            Json(row).into_response()
        }
        Err(e) => category_error_response(e),
    }
}

/// `DELETE /dashboard/categories/:id`
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<Uuid>,
) -> Response {
    match categories::delete_category(&state.pool, state.storage.as_ref(), id).await {
        Ok(()) => {
            tracing::info!(admin = %admin.id, category = %id, "category deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => category_error_response(e),
    }
}
