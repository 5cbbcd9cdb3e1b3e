mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use config::DashboardConfig;
use services::directory::PgDirectory;
use services::guard::GuardSettings;
use services::identity::HostedIdentity;
use services::storage::HostedStorage;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = DashboardConfig::from_env().expect("invalid dashboard configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");
    let identity = HostedIdentity::new(&config.service).expect("identity client init failed");
    let storage = HostedStorage::new(&config.service).expect("storage client init failed");

    tracing::info!(
        service = %config.service.base_url,
        bucket = %config.service.bucket,
        lookup = ?config.role_lookup,
        "collaborators configured"
    );

    let state = state::AppState {
        directory: Arc::new(PgDirectory::new(pool.clone())),
        pool,
        identity: Arc::new(identity),
        storage: Arc::new(storage),
        guard_settings: GuardSettings { lookup: config.role_lookup, timeout: config.auth_timeout },
        cookie_secure: config.cookie_secure,
    };

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "admin dashboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
