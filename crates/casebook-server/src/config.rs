//! Server configuration
//!
//! Read once at startup from the environment. `CASEBOOK_*` variables take
//! precedence over the unprefixed `DATABASE_URL`, `BIND_ADDRESS` and
//! `STATIC_DIR`.

use anyhow::{Context, Result};
use ::config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

const UNPREFIXED: [&str; 3] = ["DATABASE_URL", "BIND_ADDRESS", "STATIC_DIR"];

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    /// sqlx SQLite URL; when absent the in-memory backend is used
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Directory holding the built dashboard
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build from an explicit set of environment variables
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let unprefixed: HashMap<String, String> = vars
            .iter()
            .filter(|(key, _)| UNPREFIXED.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let mut config: ServerConfig = Config::builder()
            .set_default("bind_address", "0.0.0.0:4000")?
            .set_default("max_connections", 5)?
            .add_source(Environment::default().source(Some(unprefixed)))
            .add_source(Environment::with_prefix("CASEBOOK").source(Some(vars)))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.database_url = config
            .database_url
            .filter(|url| !url.trim().is_empty());
        config.static_dir = config
            .static_dir
            .filter(|dir| !dir.as_os_str().is_empty());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = assert_ok!(ServerConfig::from_vars(HashMap::new()));
        assert_eq!(config.bind_address, "0.0.0.0:4000");
        assert_eq!(config.max_connections, 5);
        assert!(config.database_url.is_none());
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_unprefixed_variables() {
        let config = ServerConfig::from_vars(vars(&[
            ("DATABASE_URL", "sqlite://data/casebook.db"),
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("STATIC_DIR", "/srv/dashboard"),
        ]))
        .unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite://data/casebook.db")
        );
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/dashboard")));
    }

    #[test]
    fn test_prefixed_variables_win() {
        let config = ServerConfig::from_vars(vars(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("CASEBOOK_BIND_ADDRESS", "127.0.0.1:9090"),
            ("CASEBOOK_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9090");
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_empty_database_url_means_in_memory() {
        let config = ServerConfig::from_vars(vars(&[("DATABASE_URL", "")])).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_unrelated_variables_ignored() {
        let config =
            ServerConfig::from_vars(vars(&[("MAX_CONNECTIONS", "99"), ("PATH", "/usr/bin")]))
                .unwrap();
        assert_eq!(config.max_connections, 5);
    }
}
