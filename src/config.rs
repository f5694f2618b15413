use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default lifetime of a cached lookup in seconds (24 hours)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest accepted cache lifetime in seconds (10 years)
pub const MAX_CACHE_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Default age in calendar years after which a plugin counts as stale
pub const DEFAULT_THRESHOLD_YEARS: u32 = 2;

/// Plugin information endpoint of the WordPress.org plugin directory
pub const DEFAULT_REGISTRY_URL: &str = "https://api.wordpress.org/plugins/info/1.2/";

const APP_DIR: &str = "plugin-freshness";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub cache: CacheConfig,
    pub registry: RegistryConfig,
    pub staleness: StalenessConfig,
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Lifetime of a cached lookup in seconds
    pub ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// Cache lifetime, which must be positive and at most `MAX_CACHE_TTL_SECS`
    pub fn ttl(&self) -> Result<TimeDelta, ConfigError> {
        if self.ttl_secs <= 0 || self.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttlSecs must be between 1 and {}, got {}",
                MAX_CACHE_TTL_SECS, self.ttl_secs
            )));
        }

        TimeDelta::try_seconds(self.ttl_secs).ok_or_else(|| {
            ConfigError::Invalid(format!("cache.ttlSecs out of range: {}", self.ttl_secs))
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub base_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StalenessConfig {
    pub threshold_years: u32,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            threshold_years: DEFAULT_THRESHOLD_YEARS,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, `config.json` in the data
    /// directory is used when present and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Reject values the lookup pipeline cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.ttl()?;
        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }
}

/// Returns the path to the data directory for plugin-freshness.
/// Uses $XDG_DATA_HOME/plugin-freshness if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/plugin-freshness,
/// or ./plugin-freshness if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("lookups.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("plugin-freshness.log")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_DIR)
}
