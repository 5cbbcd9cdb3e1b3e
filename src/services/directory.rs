//! Account directory — role lookups against the `users` table.

use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Directory row consulted to authorize a verified identity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("more than one account matches {0}")]
    Ambiguous(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, DirectoryError>;

    /// Case-insensitive email match. Zero rows is `Ok(None)`; several rows is
    /// an error.
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountRecord>, DirectoryError>;
}

pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &sqlx::postgres::PgRow) -> AccountRecord {
    AccountRecord { id: row.get("id"), email: row.get("email"), name: row.get("name"), role: row.get("role") }
}

#[async_trait::async_trait]
impl AccountDirectory for PgDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRecord>, DirectoryError> {
        let row = sqlx::query("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountRecord>, DirectoryError> {
        let rows = sqlx::query("SELECT id, email, name, role FROM users WHERE lower(email) = lower($1) LIMIT 2")
            .bind(email.trim())
            .fetch_all(&self.pool)
            .await?;

        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(record_from_row(row))),
            _ => Err(DirectoryError::Ambiguous(email.to_owned())),
        }
    }
}

/// Role check applied to every directory row: case-insensitive `"admin"`.
#[must_use]
pub fn is_admin_role(role: &str) -> bool {
    role.to_lowercase() == "admin"
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;
