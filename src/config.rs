use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants;
use crate::utils::messages::Language;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Host serving preview images, prepended to the catalog's image paths
    #[serde(default = "default_media_url")]
    pub media_base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_time_update_interval_ms")]
    pub time_update_interval_ms: u64,

    #[serde(default = "default_watching_threshold")]
    pub watching_threshold_seconds: f64,

    #[serde(default = "default_near_end_margin")]
    pub near_end_margin_seconds: f64,

    #[serde(default = "default_back_buffer")]
    pub back_buffer_seconds: u32,

    #[serde(default = "default_true")]
    pub low_latency: bool,

    #[serde(default = "default_true")]
    pub worker_decoding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Defaults to the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,

    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("aniplay").join("config.toml"))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let data_dir = dirs::data_dir().context("Failed to get data directory")?;
                Ok(data_dir.join("aniplay"))
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api
            .auth_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }
}

impl PlaybackConfig {
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            media_base_url: default_media_url(),
            auth_token: None,
            timeout_seconds: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            time_update_interval_ms: default_time_update_interval_ms(),
            watching_threshold_seconds: default_watching_threshold(),
            near_end_margin_seconds: default_near_end_margin(),
            back_buffer_seconds: default_back_buffer(),
            low_latency: default_true(),
            worker_decoding: default_true(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            progress_capacity: default_progress_capacity(),
            expiry_days: default_expiry_days(),
        }
    }
}

// Default value functions
fn default_api_url() -> String { "http://localhost:3000/api".to_string() }
fn default_media_url() -> String { "https://anilibria.top".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_retries() -> u32 { 3 }
fn default_true() -> bool { true }
fn default_time_update_interval_ms() -> u64 { constants::TIME_UPDATE_INTERVAL.as_millis() as u64 }
fn default_watching_threshold() -> f64 { constants::WATCHING_THRESHOLD_SECONDS }
fn default_near_end_margin() -> f64 { constants::NEAR_END_MARGIN_SECONDS }
fn default_back_buffer() -> u32 { constants::BACK_BUFFER_SECONDS }
fn default_progress_capacity() -> usize { constants::PROGRESS_CAPACITY }
fn default_expiry_days() -> i64 { constants::STORAGE_EXPIRY_DAYS }
