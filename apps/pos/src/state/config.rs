//! # Application Configuration
//!
//! Loaded once at startup and read-only afterwards.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`FERRE_*`)
//! 2. Defaults (this file)
//!
//! ## Environment Variables
//! | Variable                   | Default                                   |
//! |----------------------------|-------------------------------------------|
//! | `FERRE_DB_PATH`            | `<data dir>/ferrepos.db`                  |
//! | `FERRE_DB_MAX_CONNECTIONS` | `5`                                       |
//! | `FERRE_STORE_NAME`         | `FerrePOS Hardware`                       |
//! | `FERRE_POS_PREFIX`         | `/pos/`                                   |
//! | `FERRE_OPEN_SESSION_PATH`  | `/pos/open-session/`                      |
//! | `FERRE_DASHBOARD_PATH`     | `/pos/dashboard/`                         |
//! | `FERRE_ALLOW_LIST`         | comma-separated, see [`GatePolicy`]       |
//! | `FERRE_TOP_PRODUCTS`       | `5`                                       |
//! | `FERRE_LOW_STOCK_LIMIT`    | `50`                                      |
//! | `FERRE_SEARCH_LIMIT`       | `20`                                      |
//!
//! A set but unparsable number is an error, not a silent default.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use ferre_core::{GatePolicy, DEFAULT_TOP_PRODUCTS};

const DB_FILE_NAME: &str = "ferrepos.db";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Could not determine app data directory")]
    NoDataDirectory,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// Store name (report titles, operator output)
    pub store_name: String,

    /// Route layout consumed by the access gate.
    pub gate: GatePolicy,

    /// Best sellers shown on the dashboard.
    pub top_products_limit: u32,

    /// Rows in the low-stock alert.
    pub low_stock_limit: u32,

    /// Rows returned by product, client and return searches.
    pub search_limit: u32,
}

impl AppConfig {
    /// Reads `FERRE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match non_blank(&lookup, "FERRE_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let mut gate = GatePolicy::default();
        if let Some(prefix) = non_blank(&lookup, "FERRE_POS_PREFIX") {
            gate.pos_prefix = prefix;
        }
        if let Some(path) = non_blank(&lookup, "FERRE_OPEN_SESSION_PATH") {
            gate.open_session_path = path;
        }
        if let Some(path) = non_blank(&lookup, "FERRE_DASHBOARD_PATH") {
            gate.dashboard_path = path;
        }
        if let Some(list) = non_blank(&lookup, "FERRE_ALLOW_LIST") {
            gate.allow_list = list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(AppConfig {
            database_path,
            max_connections: parse_number(&lookup, "FERRE_DB_MAX_CONNECTIONS", 5)?,
            store_name: non_blank(&lookup, "FERRE_STORE_NAME")
                .unwrap_or_else(|| "FerrePOS Hardware".to_string()),
            gate,
            top_products_limit: parse_number(&lookup, "FERRE_TOP_PRODUCTS", DEFAULT_TOP_PRODUCTS)?,
            low_stock_limit: parse_number(&lookup, "FERRE_LOW_STOCK_LIMIT", 50)?,
            search_limit: parse_number(&lookup, "FERRE_SEARCH_LIMIT", 20)?,
        })
    }

    /// Configuration for tests and tools that bring their own database.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        AppConfig {
            database_path: path.into(),
            max_connections: 5,
            store_name: "FerrePOS Hardware".to_string(),
            gate: GatePolicy::default(),
            top_products_limit: DEFAULT_TOP_PRODUCTS,
            low_stock_limit: 50,
            search_limit: 20,
        }
    }

    /// Creates the directory holding the database file.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

/// Platform data directory.
///
/// - **macOS**: `~/Library/Application Support/com.ferrepos.pos/ferrepos.db`
/// - **Windows**: `%APPDATA%\ferrepos\pos\data\ferrepos.db`
/// - **Linux**: `~/.local/share/pos/ferrepos.db`
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "ferrepos", "pos").ok_or(ConfigError::NoDataDirectory)?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

fn non_blank<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<F>(lookup: &F, var: &str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_blank(lookup, var) else {
        return Ok(default);
    };

    match raw.parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("FERRE_DB_PATH", "/tmp/ferre.db")])).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/ferre.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.top_products_limit, DEFAULT_TOP_PRODUCTS);
        assert_eq!(config.gate, GatePolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FERRE_DB_PATH", "/tmp/ferre.db"),
            ("FERRE_STORE_NAME", "Ferretería Central"),
            ("FERRE_TOP_PRODUCTS", "10"),
            ("FERRE_POS_PREFIX", "/caja/"),
            ("FERRE_ALLOW_LIST", "/caja/abrir/, /caja/salir/,"),
        ]))
        .unwrap();

        assert_eq!(config.store_name, "Ferretería Central");
        assert_eq!(config.top_products_limit, 10);
        assert_eq!(config.gate.pos_prefix, "/caja/");
        assert_eq!(config.gate.allow_list, vec!["/caja/abrir/", "/caja/salir/"]);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[
            ("FERRE_DB_PATH", "/tmp/ferre.db"),
            ("FERRE_DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref var, .. } if var == "FERRE_DB_MAX_CONNECTIONS"));

        let err = AppConfig::from_lookup(lookup(&[
            ("FERRE_DB_PATH", "/tmp/ferre.db"),
            ("FERRE_SEARCH_LIMIT", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("FERRE_DB_PATH", "/tmp/ferre.db"),
            ("FERRE_STORE_NAME", "   "),
            ("FERRE_LOW_STOCK_LIMIT", ""),
        ]))
        .unwrap();

        assert_eq!(config.store_name, "FerrePOS Hardware");
        assert_eq!(config.low_stock_limit, 50);
    }
}
