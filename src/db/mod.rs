//! Pool setup and embedded schema migrations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect a pool of at most `max_connections` and bring the schema up to date.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    tracing::debug!(max_connections, "database pool ready");

    Ok(pool)
}
