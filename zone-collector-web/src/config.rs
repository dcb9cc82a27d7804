//! Service configuration: toml file plus environment overrides.
//!
//! The config file path comes from `ZONE_COLLECTOR_CONFIG` (default
//! `config.toml`); a missing file falls back to defaults so the service can
//! start from environment variables alone. Credentials are taken from
//! `CZDS_USERNAME` / `CZDS_PASSWORD` when set, so they never need to live in
//! the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "ZONE_COLLECTOR_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub czds: CzdsSettings,
    pub sync: SyncSettings,
    pub whois: WhoisSettings,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub bind: String,
    /// Worker count; defaults to the CPU count.
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/zone-collector.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CzdsSettings {
    pub username: String,
    pub password: String,
    pub auth_url: String,
    pub czds_url: String,
    pub zone_files_dir: PathBuf,
}

impl Default for CzdsSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            auth_url: "https://account-api.icann.org".to_string(),
            czds_url: "https://czds-api.icann.org".to_string(),
            zone_files_dir: PathBuf::from("zonefiles"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// UTC hours at which a full sync is triggered.
    pub schedule_hours: Vec<u32>,
    pub max_concurrent_downloads: usize,
    pub chunk_size: usize,
    pub upsert_batch_size: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            schedule_hours: vec![0, 12],
            max_concurrent_downloads: 10,
            chunk_size: 50_000,
            upsert_batch_size: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhoisSettings {
    pub enabled: bool,
    pub rate_limit: u32,
}

impl Default for WhoisSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default tracing filter; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load the configuration file and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from);
        let mut config = Self::from_file(&path)?;

        if let Ok(username) = std::env::var("CZDS_USERNAME") {
            config.czds.username = username;
        }
        if let Ok(password) = std::env::var("CZDS_PASSWORD") {
            config.czds.password = password;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
