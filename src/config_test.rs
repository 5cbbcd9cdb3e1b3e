use std::collections::HashMap;

use super::*;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

const REQUIRED: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/dashboard"),
    ("SERVICE_URL", "https://project.example.test/"),
    ("SERVICE_API_KEY", "anon-key"),
];

#[test]
fn from_vars_applies_defaults() {
    let cfg = DashboardConfig::from_vars(vars(REQUIRED)).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(cfg.service.base_url, "https://project.example.test");
    assert_eq!(cfg.service.role_key, "anon-key");
    assert_eq!(cfg.service.bucket, DEFAULT_STORAGE_BUCKET);
    assert_eq!(cfg.role_lookup, RoleLookup::ById);
    assert_eq!(cfg.auth_timeout, Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS));
    assert_eq!(
        cfg.service.timeouts,
        ServiceTimeouts {
            request_secs: DEFAULT_SERVICE_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_SERVICE_CONNECT_TIMEOUT_SECS
        }
    );
    assert!(!cfg.cookie_secure);
}

#[test]
fn from_vars_parses_overrides() {
    let mut pairs = REQUIRED.to_vec();
    pairs.extend_from_slice(&[
        ("PORT", "8080"),
        ("DB_MAX_CONNECTIONS", "12"),
        ("SERVICE_ROLE_KEY", "service-key"),
        ("STORAGE_BUCKET", "icons"),
        ("AUTH_ROLE_LOOKUP", "Email"),
        ("AUTH_TIMEOUT_SECS", "3"),
        ("SERVICE_REQUEST_TIMEOUT_SECS", "42"),
        ("SERVICE_CONNECT_TIMEOUT_SECS", "7"),
        ("COOKIE_SECURE", "yes"),
    ]);

    let cfg = DashboardConfig::from_vars(vars(&pairs)).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.db_max_connections, 12);
    assert_eq!(cfg.service.role_key, "service-key");
    assert_eq!(cfg.service.bucket, "icons");
    assert_eq!(cfg.role_lookup, RoleLookup::ByEmail);
    assert_eq!(cfg.auth_timeout, Duration::from_secs(3));
    assert_eq!(cfg.service.timeouts, ServiceTimeouts { request_secs: 42, connect_secs: 7 });
    assert!(cfg.cookie_secure);
}

#[test]
fn from_vars_missing_database_url_errors() {
    let err = DashboardConfig::from_vars(vars(&REQUIRED[1..])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
}

#[test]
fn from_vars_blank_api_key_counts_as_missing() {
    let mut pairs = REQUIRED.to_vec();
    pairs[2] = ("SERVICE_API_KEY", "   ");
    let err = DashboardConfig::from_vars(vars(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("SERVICE_API_KEY")));
}

#[test]
fn from_vars_unknown_role_lookup_errors() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("AUTH_ROLE_LOOKUP", "phone"));
    let err = DashboardConfig::from_vars(vars(&pairs)).unwrap_err().to_string();
    assert!(err.contains("AUTH_ROLE_LOOKUP"));
}

#[test]
fn from_vars_bad_port_errors() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("PORT", "eighty"));
    let err = DashboardConfig::from_vars(vars(&pairs)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
}

#[test]
fn parse_bool_variants() {
    for val in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
    for val in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

#[test]
fn from_vars_bad_pool_size_errors() {
    for bad in ["lots", "-1", "0"] {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_MAX_CONNECTIONS", bad));
        let err = DashboardConfig::from_vars(vars(&pairs)).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", .. }),
            "expected invalid pool size for {bad:?}"
        );
    }
}
