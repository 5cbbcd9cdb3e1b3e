//! User listing and removal for the users page.

use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub const USERS_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
    pub last_active: String,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserRow>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("admins cannot delete their own account")]
    SelfDelete,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Clamp a requested page number to the first page.
#[must_use]
pub fn normalize_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Row offset of the first item on `page` (1-based).
#[must_use]
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

#[must_use]
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

const USER_COLUMNS: &str = r"id, name, email, role,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS created_at,
    to_char(last_active AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS last_active";

pub(crate) fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRow {
    UserRow {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
        created_at: row.get("created_at"),
        last_active: row.get("last_active"),
    }
}

/// One page of users ordered by name, leaving out the signed-in admin.
pub async fn list_users_page(pool: &PgPool, viewer: Uuid, page: i64) -> Result<UserPage, UserError> {
    let page = page.max(1);
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id <> $1")
        .bind(viewer)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id <> $1 ORDER BY name, id LIMIT $2 OFFSET $3"
    ))
    .bind(viewer)
    .bind(USERS_PER_PAGE)
    .bind(page_offset(page, USERS_PER_PAGE))
    .fetch_all(pool)
    .await?;

    Ok(UserPage {
        users: rows.iter().map(user_from_row).collect(),
        page,
        per_page: USERS_PER_PAGE,
        total,
        total_pages: total_pages(total, USERS_PER_PAGE),
    })
}

/// Delete a user row. The caller's own row is refused.
pub async fn delete_user(pool: &PgPool, viewer: Uuid, user_id: Uuid) -> Result<(), UserError> {
    if viewer == user_id {
        return Err(UserError::SelfDelete);
    }
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(UserError::NotFound(user_id));
    }
    Ok(())
}

/// Most recently created users, newest first.
pub async fn latest_users(pool: &PgPool, limit: i64) -> Result<Vec<UserRow>, sqlx::Error> {
    let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1"))
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(user_from_row).collect())
}

pub async fn count_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
