//! CoinGecko HTTP client
//!
//! Requests run strictly one after another. A 429 answer is retried with the
//! backoff from [`RetryPolicy`]; transport, status and decode failures end
//! the call straight away.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::types::{coin_list_url, MarketsQuery, DEFAULT_BASE_URL, MAX_PER_PAGE};
use crate::common::RetryPolicy;
use crate::error::{FetchError, FetchResult};
use crate::types::{CoinListing, MarketRecord};

/// How much of the raw catalog body goes to the debug log
const RAW_PREVIEW_CHARS: usize = 500;

/// How much of an error body is kept in [`FetchError::Api`]
const ERROR_BODY_CHARS: usize = 200;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Quote currency for prices and market caps
    pub vs_currency: String,
    pub per_page: u32,
    /// Request timeout duration
    pub timeout: Duration,
    /// Pause between successive page requests
    pub page_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            per_page: MAX_PER_PAGE,
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_vs_currency(mut self, vs_currency: impl Into<String>) -> Self {
        self.vs_currency = vs_currency.into();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// CoinGecko API client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http_client: Client,
    config: ClientConfig,
}

impl CoinGeckoClient {
    /// Create a client against the public API with default settings
    pub fn new() -> FetchResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> FetchResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch one page of coins ranked by market cap.
    ///
    /// Pages are 1-indexed. Callers must pass `page >= 1`; only debug builds
    /// check it.
    pub async fn fetch_market_page(&self, page: u32) -> FetchResult<Vec<MarketRecord>> {
        debug_assert!(page >= 1, "pages are 1-indexed");

        let url = MarketsQuery {
            vs_currency: &self.config.vs_currency,
            per_page: self.config.per_page,
            page,
        }
        .url(&self.config.base_url);

        let body = self.get_with_retry(&url).await?;
        decode(&url, &body)
    }

    /// Fetch pages `1..=pages` and concatenate them in page order.
    ///
    /// Waits `page_delay` between pages. Unlike a plain fixed-count loop, an
    /// empty page is taken to mean the listing is exhausted and the remaining
    /// pages are not requested, so fewer than `pages` requests may be sent.
    /// Any failure discards what was fetched so far.
    pub async fn fetch_markets(&self, pages: u32) -> FetchResult<Vec<MarketRecord>> {
        let mut records = Vec::new();

        for page in 1..=pages {
            if page > 1 && !self.config.page_delay.is_zero() {
                debug!(
                    "Waiting {}s before page {}",
                    self.config.page_delay.as_secs_f64(),
                    page
                );
                sleep(self.config.page_delay).await;
            }

            let batch = self.fetch_market_page(page).await?;
            info!("Fetched page {}/{}: {} coins", page, pages, batch.len());

            if batch.is_empty() {
                info!("Page {} is empty, no more ranked coins", page);
                break;
            }
            records.extend(batch);
        }

        info!("Total coins fetched: {}", records.len());
        Ok(records)
    }

    /// Fetch the full coin catalog in one request
    pub async fn fetch_coin_list(&self) -> FetchResult<Vec<CoinListing>> {
        let url = coin_list_url(&self.config.base_url);
        let body = self.get_with_retry(&url).await?;

        debug!("Raw API response: {}", preview(&body, RAW_PREVIEW_CHARS));

        decode(&url, &body)
    }

    /// Ids of every coin in the catalog
    pub async fn fetch_all_symbols(&self) -> FetchResult<Vec<String>> {
        let ids: Vec<String> = self
            .fetch_coin_list()
            .await?
            .into_iter()
            .map(|coin| coin.id)
            .collect();

        info!("Total symbols fetched: {}", ids.len());
        Ok(ids)
    }

    /// GET `url`, retrying only on 429, and return the body text
    async fn get_with_retry(&self, url: &str) -> FetchResult<String> {
        let policy = &self.config.retry;
        let max_attempts = policy.max_attempts();

        for attempt in 1..=max_attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            let response = self
                .http_client
                .get(url)
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    url: url.to_string(),
                    source,
                })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt == max_attempts {
                    break;
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    "API rate limit hit (attempt {}/{}), retrying in {:.1}s",
                    attempt,
                    max_attempts,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Api {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body: preview(&body, ERROR_BODY_CHARS).to_string(),
                });
            }

            return response.text().await.map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            });
        }

        Err(FetchError::RateLimited {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> FetchResult<T> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

/// First `max_chars` characters of `s`, cut on a char boundary
fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
