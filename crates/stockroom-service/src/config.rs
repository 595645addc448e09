//! # Application Configuration
//!
//! Which storage backend to use and how stock levels are bucketed.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_BACKEND=remote                                           │
//! │     STOCKROOM_DB_PATH=/var/lib/stockroom/stockroom.db                  │
//! │     STOCKROOM_REMOTE_URL=https://docs.example.com/v1                   │
//! │     STOCKROOM_REMOTE_TIMEOUT_SECS=5                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     local backend, thresholds 30 / 10, sample data on                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! backend = "local"          # local | remote
//! path = "stockroom.db"      # local backend; ":memory:" for a throwaway store
//! remote_url = "https://docs.example.com/v1"
//! timeout_secs = 10
//!
//! [stock]
//! high = 30                  # stock above this is "high"
//! medium = 10                # stock above this (up to high) is "medium"
//!
//! [app]
//! seed_sample_data = true
//! event_capacity = 64
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockroom_core::{StockThresholds, HIGH_STOCK_THRESHOLD, MEDIUM_STOCK_THRESHOLD};
use stockroom_db::{DbConfig, RemoteConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::DEFAULT_EVENT_CAPACITY;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "stockroom.toml";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config could not be written: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Storage Backend
// =============================================================================

/// Where products and sales are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite file (or memory) on this machine.
    #[default]
    Local,

    /// HTTP document API.
    Remote,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "sqlite" => Ok(StorageBackend::Local),
            "remote" | "http" => Ok(StorageBackend::Remote),
            other => Err(ConfigError::Invalid(format!(
                "Unknown storage backend: '{}'. Valid options: local, remote",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database file for the local backend.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Base URL of the document API for the remote backend.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Per-request timeout for the remote backend (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "stockroom", "stockroom")
        .map(|dirs| dirs.data_dir().join("stockroom.db"))
        .unwrap_or_else(|| PathBuf::from("stockroom.db"))
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: StorageBackend::default(),
            path: default_db_path(),
            remote_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Stock level boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSettings {
    #[serde(default = "default_high")]
    pub high: i64,

    #[serde(default = "default_medium")]
    pub medium: i64,
}

fn default_high() -> i64 {
    HIGH_STOCK_THRESHOLD
}

fn default_medium() -> i64 {
    MEDIUM_STOCK_THRESHOLD
}

impl Default for StockSettings {
    fn default() -> Self {
        StockSettings {
            high: default_high(),
            medium: default_medium(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Seed the sample catalog and sales into an empty store on open.
    #[serde(default = "default_true")]
    pub seed_sample_data: bool,

    /// Buffered events per subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            seed_sample_data: true,
            event_capacity: default_event_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub stock: StockSettings,

    #[serde(default)]
    pub app: AppSettings,
}

impl AppConfig {
    /// Local SQLite at `path`, everything else default.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.path = path.into();
        config
    }

    /// Throwaway in-memory store without sample data.
    pub fn in_memory() -> Self {
        let mut config = Self::local(":memory:");
        config.app.seed_sample_data = false;
        config
    }

    /// Remote document API at `url`.
    pub fn remote(url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.storage.backend = StorageBackend::Remote;
        config.storage.remote_url = Some(url.into());
        config
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockroom.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.stock.medium < 0 {
            return Err(ConfigError::Invalid(
                "stock.medium must not be negative".into(),
            ));
        }
        if self.stock.high <= self.stock.medium {
            return Err(ConfigError::Invalid(format!(
                "stock.high ({}) must be greater than stock.medium ({})",
                self.stock.high, self.stock.medium
            )));
        }

        if self.storage.backend == StorageBackend::Remote {
            match self.storage.remote_url.as_deref() {
                None | Some("") => {
                    return Err(ConfigError::Invalid(
                        "storage.remote_url is required for the remote backend".into(),
                    ))
                }
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(ConfigError::Invalid(format!(
                        "Remote URL must start with http:// or https://, got: {}",
                        url
                    )))
                }
                Some(_) => {}
            }
        }

        if self.storage.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "storage.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.app.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "app.event_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STOCKROOM_*` overrides looked up through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = var("STOCKROOM_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(_) => warn!(backend = %backend, "Unknown storage backend in environment"),
            }
        }

        if let Some(path) = var("STOCKROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.path = PathBuf::from(path);
        }

        if let Some(url) = var("STOCKROOM_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.storage.remote_url = Some(url);
        }

        if let Some(secs) = var("STOCKROOM_REMOTE_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.storage.timeout_secs = s;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn backend(&self) -> StorageBackend {
        self.storage.backend
    }

    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            high: self.stock.high,
            medium: self.stock.medium,
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.storage.path.clone())
    }

    /// `None` unless a remote URL is configured.
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        self.storage.remote_url.as_ref().map(|url| {
            RemoteConfig::new(url.clone()).timeout(Duration::from_secs(self.storage.timeout_secs))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!(" Remote ".parse::<StorageBackend>().unwrap(), StorageBackend::Remote);
        assert!("cloud".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend(), StorageBackend::Local);
        assert_eq!(config.thresholds(), StockThresholds::default());
        assert!(config.app.seed_sample_data);
        assert!(config.validate().is_ok());
        assert!(config.remote_config().is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [storage]
            backend = "remote"
            remote_url = "http://localhost:9000/api"

            [stock]
            medium = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.backend(), StorageBackend::Remote);
        assert_eq!(config.stock.high, 30);
        assert_eq!(config.stock.medium, 5);
        assert_eq!(config.storage.timeout_secs, 10);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.remote_config().unwrap().timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::remote("");
        assert!(config.validate().is_err());

        config.storage.remote_url = Some("ftp://example.com".into());
        assert!(config.validate().is_err());

        config.storage.remote_url = Some("https://example.com/v1".into());
        assert!(config.validate().is_ok());

        config.stock.high = 10;
        assert!(config.validate().is_err());

        let mut config = AppConfig::in_memory();
        config.app.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STOCKROOM_BACKEND", "remote"),
            ("STOCKROOM_REMOTE_URL", "http://10.0.0.5/api"),
            ("STOCKROOM_REMOTE_TIMEOUT_SECS", "3"),
            ("STOCKROOM_DB_PATH", "/tmp/other.db"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend(), StorageBackend::Remote);
        assert_eq!(config.storage.remote_url.as_deref(), Some("http://10.0.0.5/api"));
        assert_eq!(config.storage.timeout_secs, 3);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/other.db"));

        // Unknown backend is ignored
        config.apply_overrides(|key| (key == "STOCKROOM_BACKEND").then(|| "cloud".to_string()));
        assert_eq!(config.backend(), StorageBackend::Remote);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("stockroom-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE_NAME);
        let mut config = AppConfig::local("/data/stockroom.db");
        config.stock.high = 50;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[storage]"));
        assert!(contents.contains("[stock]"));

        let loaded: AppConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_bad_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("stockroom-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[stock]\nhigh = \"lots\"").unwrap();

        assert!(matches!(
            AppConfig::load(Some(path.clone())),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(AppConfig::load_or_default(Some(path.clone())).stock.high, 30);

        std::fs::remove_file(path).ok();
    }
}
