// Dashboard configuration, loaded from TOML

use crate::error::RasadError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub tweets: TweetsConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Backend origin; `/api/v1` is appended per request
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Keep the bearer token on disk between runs
    #[serde(default)]
    pub remember_token: bool,

    /// Overrides the default token location in the data dir
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshConfig {
    #[serde(default = "default_services_secs")]
    pub services_secs: u64,

    #[serde(default = "default_dashboard_secs")]
    pub dashboard_secs: u64,

    /// How long toasts stay on screen
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TweetsConfig {
    #[serde(default = "default_tweet_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertsConfig {
    #[serde(default = "default_alert_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log file used while the TUI owns the terminal
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_services_secs() -> u64 {
    30
}

fn default_dashboard_secs() -> u64 {
    60
}

fn default_toast_secs() -> u64 {
    4
}

fn default_tweet_page_size() -> u32 {
    100
}

fn default_alert_page_size() -> u32 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            services_secs: default_services_secs(),
            dashboard_secs: default_dashboard_secs(),
            toast_secs: default_toast_secs(),
        }
    }
}

impl Default for TweetsConfig {
    fn default() -> Self {
        Self {
            page_size: default_tweet_page_size(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            page_size: default_alert_page_size(),
        }
    }
}

impl Config {
    /// Default config location (~/.config/rasad/config.toml on Linux)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rasad").join("config.toml"))
    }

    /// Directory for the log file and the remembered token
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("rasad"))
    }

    /// Load from `path`, or from the default location; a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), RasadError> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(RasadError::Config(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                base
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(RasadError::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.refresh.services_secs == 0 || self.refresh.dashboard_secs == 0 {
            return Err(RasadError::Config(
                "refresh intervals must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn token_path(&self) -> Option<PathBuf> {
        self.session
            .token_file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("token")))
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.logging
            .file
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("rasad.log")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.refresh.services_secs, 30);
        assert_eq!(config.alerts.page_size, 10);
        assert!(!config.session.remember_token);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[api]\nbase_url = \"https://rasad.example.ir\"\n\n[session]\nremember_token = true\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "https://rasad.example.ir");
        assert_eq!(config.api.timeout_secs, 20);
        assert!(config.session.remember_token);
        assert_eq!(config.tweets.page_size, 100);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.refresh.services_secs = 5;
        config.save(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nbase_url = \"localhost:8000\"\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RasadError>(),
            Some(RasadError::Config(_))
        ));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = Config::default();
        config.refresh.dashboard_secs = 0;
        assert!(matches!(config.validate(), Err(RasadError::Config(_))));

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: api.timeout_secs must be greater than zero"
        );
    }
}
