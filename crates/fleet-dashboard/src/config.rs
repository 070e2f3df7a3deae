//! Application configuration.

use crate::error::{AppError, AppResult};
use fleet_core::StatusFilter;
use fleet_telemetry::LoggingConfig;
use fleet_ws::PushConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Used when neither `--config` nor `FLEET_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub const CONFIG_PATH_ENV: &str = "FLEET_CONFIG";
pub const API_URL_ENV: &str = "FLEET_API_URL";
pub const WS_URL_ENV: &str = "FLEET_WS_URL";

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:3000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    180
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST base, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Push channel URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Reconciliation poll period.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Filter active when the view opens.
    #[serde(default)]
    pub initial_filter: StatusFilter,
    /// Reconnect policy. Its `url` is taken from `ws_url`.
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_url: default_ws_url(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            initial_filter: StatusFilter::default(),
            push: PushConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Config path: CLI arg > `FLEET_CONFIG` > default. The flag is `true` when
/// the path was given explicitly.
pub fn resolve_config_path(cli: Option<String>, env: Option<String>) -> (String, bool) {
    match cli.or(env) {
        Some(path) => (path, true),
        None => (DEFAULT_CONFIG_PATH.to_string(), false),
    }
}

impl AppConfig {
    /// Load configuration from the resolved path, then apply env overrides.
    ///
    /// A missing default file falls back to built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(cli_path: Option<String>) -> AppResult<Self> {
        let (path, explicit) = resolve_config_path(cli_path, std::env::var(CONFIG_PATH_ENV).ok());

        let mut config = if explicit || Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config {path}: {e}")))
    }

    /// Endpoint overrides from `FLEET_API_URL` / `FLEET_WS_URL`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(WS_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.ws_url = url;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Config("api_base_url must not be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Push settings with the configured `ws_url`.
    pub fn push_config(&self) -> PushConfig {
        PushConfig {
            url: self.ws_url.clone(),
            ..self.push.clone()
        }
    }
}
