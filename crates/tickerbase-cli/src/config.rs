//! Application settings, from a JSON file or from flags.

use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tickerbase_warehouse::{StorageLocation, WarehouseConfig};
use tracing::Level;

use crate::cli::SettingsArgs;

const DEFAULT_STOCK: &str = "data/stock.csv";
const DEFAULT_DATA: &str = "data/data.csv";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to open config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file not valid: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("config initialization failed: {0} not found")]
    Missing(String),

    #[error("invalid value '{value}' supplied for appPort: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Settings as written in the JSON file. Every key is optional here;
/// [`AppConfig::from_raw`] decides what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    /// String or number.
    pub app_port: Option<Value>,
    pub api_key: Option<String>,
    pub db_path: Option<String>,
    pub log_path: Option<String>,
    pub log_level: Option<String>,
    pub stock: Option<String>,
    pub data: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub query_timeout_ms: Option<u64>,
}

/// Validated application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub app_port: u16,
    pub api_key: String,
    /// `None` keeps the store in memory.
    pub db_path: Option<PathBuf>,
    /// Directory receiving `tickerbase.log`; `None` logs to stderr.
    pub log_path: Option<PathBuf>,
    pub log_level: Level,
    pub stock: PathBuf,
    pub data: PathBuf,
    pub connect_timeout_ms: u64,
    pub query_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        Self::from_raw(raw)
    }

    pub fn from_settings(settings: &SettingsArgs) -> Result<Self, ConfigError> {
        Self::from_raw(RawConfig {
            app_port: Some(Value::String(settings.app_port.clone())),
            api_key: Some(settings.api_key.clone()),
            db_path: Some(settings.db_path.clone()),
            log_path: Some(settings.log_path.clone()),
            log_level: Some(settings.log_level.clone()),
            stock: Some(settings.stock.clone()),
            data: Some(settings.data.clone()),
            connect_timeout_ms: Some(settings.connect_timeout_ms),
            query_timeout_ms: Some(settings.query_timeout_ms),
        })
    }

    /// Validate raw settings, reporting every missing required key at once.
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let app_port = match raw.app_port {
            Some(Value::String(value)) => value.trim().to_string(),
            Some(Value::Number(value)) => value.to_string(),
            _ => String::new(),
        };

        let mut missing = Vec::new();
        if app_port.is_empty() {
            missing.push("appPort");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }

        let port = app_port
            .parse::<u16>()
            .map_err(|source| ConfigError::InvalidPort {
                value: app_port.clone(),
                source,
            })?;

        Ok(Self {
            app_port: port,
            api_key: raw.api_key.unwrap_or_default(),
            db_path: non_empty_path(raw.db_path),
            log_path: non_empty_path(raw.log_path),
            log_level: parse_level(raw.log_level.as_deref().unwrap_or_default()),
            stock: non_empty_path(raw.stock).unwrap_or_else(|| PathBuf::from(DEFAULT_STOCK)),
            data: non_empty_path(raw.data).unwrap_or_else(|| PathBuf::from(DEFAULT_DATA)),
            connect_timeout_ms: raw
                .connect_timeout_ms
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            query_timeout_ms: raw.query_timeout_ms.unwrap_or(DEFAULT_QUERY_TIMEOUT_MS),
        })
    }

    pub fn warehouse_config(&self) -> WarehouseConfig {
        let location = match &self.db_path {
            Some(path) => StorageLocation::File(path.clone()),
            None => StorageLocation::InMemory,
        };
        WarehouseConfig {
            location,
            connect_timeout_ms: self.connect_timeout_ms,
            query_timeout_ms: self.query_timeout_ms,
            ..WarehouseConfig::default()
        }
    }
}

fn non_empty_path(value: Option<String>) -> Option<PathBuf> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Unknown levels fall back to `info`.
fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}
