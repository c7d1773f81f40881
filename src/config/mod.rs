//! Configuration management for tourcat
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::scheduler::RefreshIntervals;
use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream catalog API
    pub upstream: UpstreamConfig,

    /// Retry policy for each fetch task
    pub ingest: IngestConfig,

    /// Refresh cadence
    pub refresh: RefreshConfig,

    /// HTTP server
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; resource paths are appended to it
    pub base_url: String,

    /// User agent string
    pub user_agent: String,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://groupietrackers.herokuapp.com"),
            user_agent: format!("tourcat/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 5,
        }
    }
}

/// Ingestion retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Per-attempt deadline in milliseconds
    pub attempt_timeout_ms: u64,

    /// Fixed delay between attempts in milliseconds
    pub backoff_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout_ms: 5_000,
            backoff_ms: 1_000,
        }
    }
}

/// Refresh scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Wait after a successful run, in seconds
    pub loaded_interval_secs: u64,

    /// Wait after a failed run, in milliseconds
    pub failed_interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            loaded_interval_secs: 24 * 60 * 60,
            failed_interval_ms: 1_000,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_address: SocketAddr,

    /// `Refresh` header delay on the loading endpoint, in seconds
    pub loading_refresh_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            loading_refresh_secs: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    /// Apply command-line flags on top of the configured values
    #[must_use]
    pub fn with_overrides(mut self, verbose: bool, format: Option<&str>) -> Self {
        if verbose {
            self.level = String::from("debug");
        }
        if let Some(format) = format {
            self.format = format.to_string();
        }
        self
    }

    /// Filter directives used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        let level = self.level.trim().to_ascii_lowercase();
        format!("tourcat={level},tower_http={level},warn")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {name} ({raw:?}): {e}")),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    ///
    /// `PORT` sets the bind port; `TOURCAT_BIND_ADDRESS` wins over it.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("TOURCAT_UPSTREAM_URL") {
            config.upstream.base_url = base_url;
        }
        if let Ok(user_agent) = std::env::var("TOURCAT_USER_AGENT") {
            config.upstream.user_agent = user_agent;
        }
        if let Some(secs) = env_parse("TOURCAT_CONNECT_TIMEOUT")? {
            config.upstream.connect_timeout_secs = secs;
        }

        if let Some(retries) = env_parse("TOURCAT_MAX_RETRIES")? {
            config.ingest.max_retries = retries;
        }
        if let Some(ms) = env_parse("TOURCAT_ATTEMPT_TIMEOUT_MS")? {
            config.ingest.attempt_timeout_ms = ms;
        }
        if let Some(ms) = env_parse("TOURCAT_BACKOFF_MS")? {
            config.ingest.backoff_ms = ms;
        }

        if let Some(secs) = env_parse("TOURCAT_REFRESH_INTERVAL")? {
            config.refresh.loaded_interval_secs = secs;
        }
        if let Some(ms) = env_parse("TOURCAT_FAILED_REFRESH_MS")? {
            config.refresh.failed_interval_ms = ms;
        }

        if let Some(port) = env_parse::<u16>("PORT")? {
            config.server.bind_address.set_port(port);
        }
        if let Some(addr) = env_parse("TOURCAT_BIND_ADDRESS")? {
            config.server.bind_address = addr;
        }

        if let Ok(level) = std::env::var("TOURCAT_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("TOURCAT_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.upstream.base_url)
            .with_context(|| format!("Invalid upstream base_url: {}", self.upstream.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("upstream base_url must be http or https, got {}", base.scheme());
        }

        if self.ingest.attempt_timeout_ms == 0 {
            anyhow::bail!("attempt_timeout_ms must be greater than 0");
        }

        if self.refresh.loaded_interval_secs == 0 {
            anyhow::bail!("loaded_interval_secs must be greater than 0");
        }

        if self.refresh.failed_interval_ms == 0 {
            anyhow::bail!("failed_interval_ms must be greater than 0");
        }

        self.logging
            .level
            .trim()
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level: {:?}", self.logging.level))?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging format must be 'text' or 'json', got {:?}", self.logging.format);
        }

        Ok(())
    }

    /// Retry policy handed to every fetch task
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_timing(
            self.ingest.max_retries,
            Duration::from_millis(self.ingest.attempt_timeout_ms),
            Duration::from_millis(self.ingest.backoff_ms),
        )
    }

    #[must_use]
    pub fn refresh_intervals(&self) -> RefreshIntervals {
        RefreshIntervals {
            loaded_interval: Duration::from_secs(self.refresh.loaded_interval_secs),
            failed_interval: Duration::from_millis(self.refresh.failed_interval_ms),
        }
    }
}
