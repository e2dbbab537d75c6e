//! Application configuration: loading, validating and saving `conf.json`.

use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::polling::PollPolicy;

/// Default base URL of the dubbing API
pub const DEFAULT_BASE_URL: &str = "https://api.uniframe.ai";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Remote API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Status polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Default dubbing options
    #[serde(default)]
    pub dubbing: DubbingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Remote API connection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL the dubbing endpoints are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Budget for one API request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Budget for a direct upload in seconds
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Budget for establishing a connection in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Status polling settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollingConfig {
    /// Wait between status checks in milliseconds, also the backoff base
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound of the wait after failed checks in milliseconds
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Consecutive failed checks before giving up
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Total polling time before giving up in seconds
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            max_consecutive_errors: default_max_consecutive_errors(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

impl PollingConfig {
    /// Poll policy described by these settings
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            backoff_cap: Duration::from_millis(self.backoff_cap_ms),
            max_consecutive_errors: self.max_consecutive_errors,
            max_duration: Duration::from_secs(self.max_duration_secs),
        }
    }
}

/// Default dubbing options, overridable from the command line
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DubbingConfig {
    /// Language to dub into (ISO 639)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Language spoken in the source, detected remotely when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,

    /// Voice selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

impl Default for DubbingConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            source_language: None,
            voice_id: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_upload_timeout_secs() -> u64 {
    600 // large payloads
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    3000
}

fn default_backoff_cap_ms() -> u64 {
    30_000
}

fn default_max_consecutive_errors() -> u32 {
    10
}

fn default_max_duration_secs() -> u64 {
    24 * 60 * 60
}

fn default_target_language() -> String {
    "es".to_string()
}

impl Config {
    /// Load the configuration from `path`, writing the defaults there when
    /// the file does not exist yet
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(anyhow!("API base URL must use http or https: {}", self.api.base_url));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be greater than zero"));
        }
        if self.api.upload_timeout_secs == 0 {
            return Err(anyhow!("Upload timeout must be greater than zero"));
        }
        if self.api.connect_timeout_secs == 0 {
            return Err(anyhow!("Connect timeout must be greater than zero"));
        }

        if self.polling.interval_ms == 0 {
            return Err(anyhow!("Polling interval must be greater than zero"));
        }
        if self.polling.backoff_cap_ms < self.polling.interval_ms {
            return Err(anyhow!(
                "Polling backoff cap ({}ms) must not be below the interval ({}ms)",
                self.polling.backoff_cap_ms,
                self.polling.interval_ms
            ));
        }
        if self.polling.max_consecutive_errors == 0 {
            return Err(anyhow!("Polling error cap must be greater than zero"));
        }
        if self.polling.max_duration_secs == 0 {
            return Err(anyhow!("Polling duration ceiling must be greater than zero"));
        }

        crate::language_utils::validate_language_code(&self.dubbing.target_language)
            .context("Invalid target language")?;
        if let Some(source) = &self.dubbing.source_language {
            crate::language_utils::validate_language_code(source)
                .context("Invalid source language")?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            dubbing: DubbingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
