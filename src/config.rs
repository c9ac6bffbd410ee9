use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::dashboard::ViewKind;
use crate::settings::JsonFileStore;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub network: NetworkConfig,
    pub polling: PollingConfig,
    pub refresh: RefreshConfig,
    pub display: DisplayConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Base URL of the backend serving `/api/series`, `/api/scrape-status` and `/refresh`.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    pub success_cooldown_ms: u64,
    pub failure_cooldown_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            success_cooldown_ms: 2000,
            failure_cooldown_ms: 3000,
        }
    }
}

impl RefreshConfig {
    pub fn success_cooldown(&self) -> Duration {
        Duration::from_millis(self.success_cooldown_ms)
    }

    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_cooldown_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DisplayConfig {
    pub default_view: ViewKind,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Preference file; `<config dir>/syllabus-dashboard/preferences.json` when unset.
    pub preferences_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_file
            .clone()
            .unwrap_or_else(JsonFileStore::default_path)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present - production uses env vars directly)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("syllabus-dashboard");

        let builder = Config::builder()
            // 1. Load default values
            // Server
            .set_default("server.base_url", "http://localhost:8080")?
            // Network
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            // Polling
            .set_default("polling.interval_ms", 2000)?
            // Refresh trigger
            .set_default("refresh.success_cooldown_ms", 2000)?
            .set_default("refresh.failure_cooldown_ms", 3000)?
            // Display
            .set_default("display.default_view", "table")?
            // Storage
            .set_default("storage.preferences_file", None::<String>)?
            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))
            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))
            // 4. Load from Environment variables (SYLLABUS__SERVER__BASE_URL=...)
            .add_source(Environment::with_prefix("SYLLABUS").separator("__"));

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }
}
