//! Configuration for ipwarm

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV_VAR: &str = "IPWARM_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Warm-up schedule
    pub warmup: WarmupConfig,

    /// Warm-up progress store
    #[serde(default)]
    pub store: StoreConfig,

    /// Mail provider API (IP provisioning and mail send)
    pub provider: ProviderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Warm-up schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupConfig {
    /// Name of the dedicated IP pool used during warm-up
    pub pool_name: String,

    /// Per-IP daily send cap, one entry per warm-up day
    #[serde(default = "default_daily_volumes")]
    pub daily_volume_per_ip_address: Vec<u64>,

    /// Longest gap (in calendar days) that still advances the warm-up day
    #[serde(default = "default_reset_days")]
    pub reset_days: u32,
}

/// Provider-recommended per-IP daily volumes
pub const RECOMMENDED_DAILY_VOLUMES: [u64; 17] = [
    50, 100, 500, 1_000, 5_000, 10_000, 20_000, 40_000, 70_000, 100_000, 150_000, 250_000,
    400_000, 600_000, 1_000_000, 2_000_000, 4_000_000,
];

fn default_daily_volumes() -> Vec<u64> {
    RECOMMENDED_DAILY_VOLUMES.to_vec()
}

fn default_reset_days() -> u32 {
    1
}

/// Progress store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend: "memory", "fs" or "postgres"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Directory for the "fs" backend
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Database URL for the "postgres" backend
    pub url: Option<String>,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_store_backend() -> String {
    "fs".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/var/lib/ipwarm/progress")
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

/// Mail provider API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key (sent as a bearer token)
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.sendgrid.com".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from `IPWARM_CONFIG` or the default locations
    pub fn load() -> crate::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        let paths = [
            PathBuf::from("./ipwarm.toml"),
            PathBuf::from("/etc/ipwarm/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}
