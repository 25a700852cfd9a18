use std::time::Duration;

use common::config::StorageAppConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    20
}
fn default_connect_timeout_secs() -> u64 {
    8
}

/// Inventory defaults applied when a caller leaves a field out.
#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Shelf life for items that carry none. Default: 5.
    #[serde(default = "default_shelf_life_days")]
    pub default_shelf_life_days: i32,
    /// Horizon used by the dashboard and by `/batches/expiring` without `days`.
    /// Default: 3.
    #[serde(default = "default_expiring_horizon_days")]
    pub expiring_horizon_days: i64,
}

fn default_shelf_life_days() -> i32 {
    5
}
fn default_expiring_horizon_days() -> i64 {
    3
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_shelf_life_days: default_shelf_life_days(),
            expiring_horizon_days: default_expiring_horizon_days(),
        }
    }
}

pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 20;

/// Settings for the remote detection service.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HttpVisionConfig {
    /// Unset or blank means the provider reports itself unavailable.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// JSON object of extra request headers, e.g. `{"Authorization": "Bearer x"}`.
    #[serde(default)]
    pub headers_json: Option<String>,
    /// Whole seconds. Kept as text so a malformed value falls back to the
    /// default instead of refusing to start.
    #[serde(default)]
    pub timeout: Option<String>,
}

impl HttpVisionConfig {
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        let secs = self
            .timeout
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|t| t.parse::<u64>().ok())
            .filter(|&t| t > 0)
            .unwrap_or(DEFAULT_VISION_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VisionConfig {
    #[serde(default)]
    pub http: HttpVisionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageAppConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub vision: VisionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://./data/larder.db?mode=rwc")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LARDER__VISION__HTTP__ENDPOINT)
            .add_source(Environment::with_prefix("LARDER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
