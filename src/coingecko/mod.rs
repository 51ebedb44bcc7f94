//! CoinGecko public API client
//!
//! No API key required for the endpoints used here.
//!
//! # Example
//! ```no_run
//! use coingecko_export::coingecko::CoinGeckoClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CoinGeckoClient::new()?;
//!     let coins = client.fetch_markets(2).await?;
//!     println!("Fetched {} coins", coins.len());
//!     Ok(())
//! }
//! ```

mod client;
mod types;

pub use client::{ClientConfig, CoinGeckoClient};
pub use types::*;
