//! Configuration management
//!
//! Defaults reproduce the classic snapshot (top 500 coins in USD, two pages of
//! 250). A JSON file and `COINGECKO_*` environment variables can override
//! them; the CLI applies its flags last and then calls [`Config::validated`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::coingecko::{ClientConfig, DEFAULT_BASE_URL, MAX_PER_PAGE};
use crate::common::RetryPolicy;
use crate::error::ConfigError;
use crate::export::MissingValuePolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub export: ExportConfig,
}

/// Market data API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub vs_currency: String,
    pub per_page: u32,
    pub pages: u32,
    pub timeout_secs: u64,
    /// Pause between successive page requests
    pub page_delay_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            per_page: MAX_PER_PAGE,
            pages: 2,
            timeout_secs: 30,
            page_delay_secs: 10,
        }
    }
}

/// Rate-limit retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_secs: u64,
    pub multiplier: f64,
    pub max_backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        RetryConfig {
            max_retries: policy.max_retries,
            initial_backoff_secs: policy.initial_backoff.as_secs(),
            multiplier: policy.multiplier,
            max_backoff_secs: policy.max_backoff.as_secs(),
        }
    }
}

/// CSV output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub missing_values: MissingValuePolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_dir: PathBuf::from("."),
            missing_values: MissingValuePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Defaults (or the given file) with environment overrides applied
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `COINGECKO_*` overrides through the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("COINGECKO_API_BASE") {
            self.api.base_url = v;
        }
        if let Some(v) = get("COINGECKO_VS_CURRENCY") {
            self.api.vs_currency = v;
        }
        if let Some(v) = get("COINGECKO_PAGES") {
            self.api.pages = v.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "COINGECKO_PAGES",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("COINGECKO_PER_PAGE") {
            self.api.per_page = v.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "COINGECKO_PER_PAGE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("COINGECKO_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(v);
        }

        Ok(())
    }

    /// Normalise and check every setting, failing on the first bad one
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.api.base_url = self.api.base_url.trim().trim_end_matches('/').to_string();
        self.api.vs_currency = self.api.vs_currency.trim().to_lowercase();

        let api = &self.api;
        if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(api.base_url.clone()));
        }
        if api.vs_currency.is_empty()
            || !api.vs_currency.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::InvalidCurrency(api.vs_currency.clone()));
        }
        if api.pages == 0 {
            return Err(ConfigError::InvalidPages(api.pages));
        }
        if api.per_page == 0 || api.per_page > MAX_PER_PAGE {
            return Err(ConfigError::InvalidPerPage {
                got: api.per_page,
                max: MAX_PER_PAGE,
            });
        }
        if api.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let retry = &self.retry;
        if retry.multiplier.is_nan() || retry.multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(retry.multiplier));
        }
        if retry.initial_backoff_secs > retry.max_backoff_secs {
            return Err(ConfigError::BackoffRange {
                initial: retry.initial_backoff_secs,
                max: retry.max_backoff_secs,
            });
        }

        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.retry.max_retries)
            .with_initial_backoff(Duration::from_secs(self.retry.initial_backoff_secs))
            .with_multiplier(self.retry.multiplier)
            .with_max_backoff(Duration::from_secs(self.retry.max_backoff_secs))
    }

    /// Settings for [`crate::coingecko::CoinGeckoClient`]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(self.api.base_url.clone())
            .with_vs_currency(self.api.vs_currency.clone())
            .with_per_page(self.api.per_page)
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
            .with_page_delay(Duration::from_secs(self.api.page_delay_secs))
            .with_retry(self.retry_policy())
    }
}
