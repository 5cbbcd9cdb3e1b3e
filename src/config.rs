//! Dashboard configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing goes through a key lookup closure so tests can feed a plain map
//! instead of mutating the process environment.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STORAGE_BUCKET: &str = "category-images";
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SERVICE_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SERVICE_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// How the guard resolves the account row after a credential exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleLookup {
    /// Match `users.id` against the identifier in the identity session.
    ById,
    /// Match `users.email` case-insensitively. Legacy behavior.
    ByEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Connection details for the hosted identity + storage project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub api_key: String,
    pub role_key: String,
    pub bucket: String,
    pub timeouts: ServiceTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub service: ServiceConfig,
    pub role_lookup: RoleLookup,
    pub auth_timeout: Duration,
    pub cookie_secure: bool,
}

impl DashboardConfig {
    /// Build typed config from the process environment.
    ///
    /// Required: `DATABASE_URL`, `SERVICE_URL`, `SERVICE_API_KEY`.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: pool size, default 5
    /// - `SERVICE_ROLE_KEY`: storage write key, defaults to `SERVICE_API_KEY`
    /// - `STORAGE_BUCKET`: default `category-images`
    /// - `AUTH_ROLE_LOOKUP`: `id` (default) or `email`
    /// - `AUTH_TIMEOUT_SECS`: default 10
    /// - `SERVICE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SERVICE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `COOKIE_SECURE`: default false
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`DashboardConfig::from_env`].
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required("DATABASE_URL")?;
        let base_url = required("SERVICE_URL")?.trim_end_matches('/').to_owned();
        let api_key = required("SERVICE_API_KEY")?;
        let role_key = var("SERVICE_ROLE_KEY")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| api_key.clone());
        let bucket = var("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_owned());

        let port = parse_number(&var, "PORT", DEFAULT_PORT)?;
        let db_max_connections = parse_number(&var, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", value: "0".into() });
        }
        let role_lookup = parse_role_lookup(var("AUTH_ROLE_LOOKUP").as_deref())?;
        let auth_timeout = Duration::from_secs(parse_number(&var, "AUTH_TIMEOUT_SECS", DEFAULT_AUTH_TIMEOUT_SECS)?);
        let timeouts = ServiceTimeouts {
            request_secs: parse_number(&var, "SERVICE_REQUEST_TIMEOUT_SECS", DEFAULT_SERVICE_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_number(&var, "SERVICE_CONNECT_TIMEOUT_SECS", DEFAULT_SERVICE_CONNECT_TIMEOUT_SECS)?,
        };
        let cookie_secure = match var("COOKIE_SECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            port,
            service: ServiceConfig { base_url, api_key, role_key, bucket, timeouts },
            role_lookup,
            auth_timeout,
            cookie_secure,
        })
    }
}

fn parse_number<F, T>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_role_lookup(raw: Option<&str>) -> Result<RoleLookup, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("id") => Ok(RoleLookup::ById),
        Some("email") => Ok(RoleLookup::ByEmail),
        Some(other) => Err(ConfigError::Invalid { key: "AUTH_ROLE_LOOKUP", value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
