//! CoinGecko Market Export
//!
//! Fetches the ranked coin market listing from the CoinGecko public API,
//! page by page, and writes it to a timestamped CSV file.
//!
//! - [`coingecko::CoinGeckoClient`] pages through `/coins/markets` and retries
//!   rate-limited (HTTP 429) requests with exponential backoff.
//! - [`export::TableExporter`] writes the fixed 13-column table.
//!
//! ## Example
//! ```no_run
//! use coingecko_export::coingecko::CoinGeckoClient;
//! use coingecko_export::export::TableExporter;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CoinGeckoClient::new()?;
//!     let records = client.fetch_markets(2).await?;
//!     let summary = TableExporter::default().export(&records, Path::new("."))?;
//!     println!("Data saved to {}", summary.path.display());
//!     Ok(())
//! }
//! ```

pub mod coingecko;
pub mod common;
pub mod config;
pub mod error;
pub mod export;
pub mod snapshot;
pub mod types;

pub use coingecko::CoinGeckoClient;
pub use config::Config;
pub use error::{ConfigError, ExportError, FetchError};
pub use export::{MissingValuePolicy, TableExporter};
pub use types::*;
