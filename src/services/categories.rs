//! Category CRUD with image storage.
//!
//! Every category carries one image in the object store. Creating uploads the
//! image first and inserts the row with its public URL. Editing uploads the
//! replacement first and drops the old object once the row has moved over.

use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::storage::{self, ImageError, ObjectStore, StorageError};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub user_count: i32,
    pub created_at: String,
}

/// Image payload taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("name is required")]
    NameRequired,
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("category not found: {0}")]
    NotFound(Uuid),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

const CATEGORY_COLUMNS: &str = r"id, name, icon, image_url, user_count,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS created_at";

fn category_from_row(row: &sqlx::postgres::PgRow) -> CategoryRow {
    CategoryRow {
        id: row.get("id"),
        name: row.get("name"),
        icon: row.get("icon"),
        image_url: row.get("image_url"),
        user_count: row.get("user_count"),
        created_at: row.get("created_at"),
    }
}

/// Trimmed, non-empty category name.
///
/// # Errors
///
/// Returns [`CategoryError::NameRequired`] for blank names.
pub fn normalize_name(name: &str) -> Result<String, CategoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryError::NameRequired);
    }
    Ok(name.to_owned())
}

/// Validate and upload an image, returning its public URL.
async fn store_image(store: &dyn ObjectStore, image: ImageUpload) -> Result<String, CategoryError> {
    storage::validate_image(image.content_type.as_deref(), image.bytes.len())?;
    let object_name = storage::generate_object_name(&image.file_name);
    let content_type = image.content_type.unwrap_or_default();
    store.upload(&object_name, image.bytes, &content_type).await?;
    Ok(store.public_url(&object_name))
}

/// Best-effort removal of the object behind a public URL.
async fn discard_image(store: &dyn ObjectStore, image_url: Option<&str>) {
    let Some(name) = image_url.and_then(storage::object_name_from_url) else {
        return;
    };
    if let Err(e) = store.remove(&[name.to_owned()]).await {
        tracing::warn!(error = %e, object = name, "failed to remove category image");
    }
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, sqlx::Error> {
    let rows = sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name, id"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(category_from_row).collect())
}

pub async fn latest_categories(pool: &PgPool, limit: i64) -> Result<Vec<CategoryRow>, sqlx::Error> {
    let rows = sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY created_at DESC LIMIT $1"))
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(category_from_row).collect())
}

pub async fn count_categories(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await
}

/// Create a category. The image is mandatory.
pub async fn create_category(
    pool: &PgPool,
    store: &dyn ObjectStore,
    name: &str,
    image: Option<ImageUpload>,
) -> Result<CategoryRow, CategoryError> {
    let name = normalize_name(name)?;
    let image = image.ok_or(ImageError::Missing)?;
    let image_url = store_image(store, image).await?;

    let inserted = sqlx::query(&format!(
        "INSERT INTO categories (name, image_url) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(&name)
    .bind(&image_url)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(row) => Ok(category_from_row(&row)),
        Err(e) => {
            discard_image(store, Some(&image_url)).await;
            Err(e.into())
        }
    }
}

/// Rename in place; with a new image, the old URL comes back as
/// `previous_image_url`.
const UPDATE_CATEGORY: &str = r"UPDATE categories AS c
    SET name = $2, image_url = COALESCE($3, c.image_url)
    FROM (SELECT id, image_url FROM categories WHERE id = $1 FOR UPDATE) AS prev
    WHERE c.id = prev.id
    RETURNING c.id, c.name, c.icon, c.image_url, c.user_count,
        to_char(c.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS created_at,
        prev.image_url AS previous_image_url";

/// Rename a category and optionally replace its image.
///
/// The replacement is uploaded before the row changes and the old object is
/// removed only once the row points at the new one. A failed write discards
/// the fresh upload instead.
pub async fn update_category(
    pool: &PgPool,
    store: &dyn ObjectStore,
    id: Uuid,
    name: &str,
    image: Option<ImageUpload>,
) -> Result<CategoryRow, CategoryError> {
    let name = normalize_name(name)?;
    let new_url = match image {
        Some(image) => Some(store_image(store, image).await?),
        None => None,
    };

    let updated = sqlx::query(UPDATE_CATEGORY)
        .bind(id)
        .bind(&name)
        .bind(&new_url)
        .fetch_optional(pool)
        .await;

    let row = match updated {
        Ok(Some(row)) => row,
        Ok(None) => {
            discard_image(store, new_url.as_deref()).await;
            return Err(CategoryError::NotFound(id));
        }
        Err(e) => {
            discard_image(store, new_url.as_deref()).await;
            return Err(e.into());
        }
    };

    if new_url.is_some() {
        let previous: Option<String> = row.get("previous_image_url");
        discard_image(store, previous.as_deref()).await;
    }
    Ok(category_from_row(&row))
}

/// Delete a category and its stored image.
pub async fn delete_category(pool: &PgPool, store: &dyn ObjectStore, id: Uuid) -> Result<(), CategoryError> {
    let row = sqlx::query("DELETE FROM categories WHERE id = $1 RETURNING image_url")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(CategoryError::NotFound(id))?;
    let image_url: Option<String> = row.get("image_url");
    discard_image(store, image_url.as_deref()).await;
    Ok(())
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
