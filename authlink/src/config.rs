//! Runtime settings read from the environment.

use std::str::FromStr;

use thiserror::Error;

use crate::session::SessionConfig;
use crate::storage::{CacheStoreKind, DataStoreKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings shared by the library and the axum layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Public origin, used to build provider callback URLs.
    pub origin: String,
    pub port: u16,
    pub data_store_kind: DataStoreKind,
    pub data_store_url: String,
    pub cache_store_kind: CacheStoreKind,
    pub cache_store_url: Option<String>,
    pub table_prefix: String,
    pub session: SessionConfig,
    pub csrf_cookie_name: String,
    pub csrf_cookie_max_age: u64,
    /// Where unauthenticated requests are sent.
    pub login_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            port: 3000,
            data_store_kind: DataStoreKind::Sqlite,
            data_store_url: "sqlite:authlink.db".to_string(),
            cache_store_kind: CacheStoreKind::Memory,
            cache_store_url: None,
            table_prefix: "app_".to_string(),
            session: SessionConfig::default(),
            csrf_cookie_name: "__Host-CsrfId".to_string(),
            csrf_cookie_max_age: 60,
            login_url: "/login".to_string(),
        }
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key/value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(origin) = get("ORIGIN") {
            config.origin = origin.trim_end_matches('/').to_string();
        }
        if let Some(port) = get("PORT") {
            config.port = parse("PORT", port)?;
        }
        if let Some(kind) = get("GENERIC_DATA_STORE_TYPE") {
            config.data_store_kind = parse("GENERIC_DATA_STORE_TYPE", kind)?;
        }
        if let Some(url) = get("GENERIC_DATA_STORE_URL") {
            config.data_store_url = url;
        }
        if let Some(kind) = get("GENERIC_CACHE_STORE_TYPE") {
            config.cache_store_kind = parse("GENERIC_CACHE_STORE_TYPE", kind)?;
        }
        config.cache_store_url = get("GENERIC_CACHE_STORE_URL");
        if let Some(prefix) = get("DB_TABLE_PREFIX") {
            config.table_prefix = prefix;
        }
        if let Some(name) = get("SESSION_COOKIE_NAME") {
            config.session.cookie_name = name;
        }
        if let Some(max_age) = get("SESSION_COOKIE_MAX_AGE") {
            config.session.max_age = parse("SESSION_COOKIE_MAX_AGE", max_age)?;
        }
        if let Some(name) = get("OAUTH2_CSRF_COOKIE_NAME") {
            config.csrf_cookie_name = name;
        }
        if let Some(max_age) = get("OAUTH2_CSRF_COOKIE_MAX_AGE") {
            config.csrf_cookie_max_age = parse("OAUTH2_CSRF_COOKIE_MAX_AGE", max_age)?;
        }
        if let Some(url) = get("AUTHLINK_LOGIN_URL") {
            config.login_url = url;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::env;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AuthConfig::default());
        assert_eq!(config.session.cookie_name, "__Host-SessionId");
        assert_eq!(config.csrf_cookie_max_age, 60);
        assert_eq!(config.table_prefix, "app_");
    }

    #[test]
    fn test_overrides() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            ("ORIGIN", "https://auth.example.com/"),
            ("PORT", "8080"),
            ("GENERIC_DATA_STORE_TYPE", "postgres"),
            ("GENERIC_DATA_STORE_URL", "postgres://db/auth"),
            ("GENERIC_CACHE_STORE_TYPE", "redis"),
            ("GENERIC_CACHE_STORE_URL", "redis://cache"),
            ("SESSION_COOKIE_MAX_AGE", "600"),
            ("AUTHLINK_LOGIN_URL", "/signin"),
        ]))
        .unwrap();

        assert_eq!(config.origin, "https://auth.example.com");
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_store_kind, DataStoreKind::Postgres);
        assert_eq!(config.cache_store_kind, CacheStoreKind::Redis);
        assert_eq!(config.cache_store_url.as_deref(), Some("redis://cache"));
        assert_eq!(config.session.max_age, 600);
        assert_eq!(config.login_url, "/signin");
    }

    #[test]
    fn test_invalid_number() {
        let err = AuthConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for PORT: eighty");
    }

    #[test]
    fn test_blank_value_keeps_default() {
        let config = AuthConfig::from_lookup(lookup_from(&[("DB_TABLE_PREFIX", "  ")])).unwrap();
        assert_eq!(config.table_prefix, "app_");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let original = env::var("DB_TABLE_PREFIX").ok();
        unsafe {
            env::set_var("DB_TABLE_PREFIX", "test_");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.table_prefix, "test_");

        unsafe {
            match original {
                Some(value) => env::set_var("DB_TABLE_PREFIX", value),
                None => env::remove_var("DB_TABLE_PREFIX"),
            }
        }
    }
}
