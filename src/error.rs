//! Error types for fetching and exporting market data

use thiserror::Error;

/// Errors raised while talking to the market data API
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout or any other transport problem. Never retried.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API kept answering 429 after every retry was spent
    #[error("rate limited on {url}, gave up after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    /// Non-success status other than 429
    #[error("API error {status} from {url}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    /// Body was not the JSON shape we expected
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised while writing the CSV table
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("coin '{id}' has no value for '{field}'")]
    MissingValue { id: String, field: &'static str },

    #[error("coin '{id}' has a market cap rank that is not a valid integer: {value}")]
    InvalidRank { id: String, value: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration values rejected at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("pages must be >= 1 (got {0})")]
    InvalidPages(u32),

    #[error("per_page must be between 1 and {max} (got {got})")]
    InvalidPerPage { got: u32, max: u32 },

    #[error("vs_currency must be a non-empty alphanumeric code (got '{0}')")]
    InvalidCurrency(String),

    #[error("base_url must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),

    #[error("retry multiplier must be >= 1.0 (got {0})")]
    InvalidMultiplier(f64),

    #[error("initial backoff ({initial}s) must not exceed max backoff ({max}s)")]
    BackoffRange { initial: u64, max: u64 },

    #[error("timeout must be > 0 seconds")]
    ZeroTimeout,

    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidEnv { key: &'static str, value: String },
}

pub type FetchResult<T> = Result<T, FetchError>;
pub type ExportResult<T> = Result<T, ExportError>;
