//! Fetch-then-export pipeline

use anyhow::{Context, Result};
use tracing::info;

use crate::coingecko::CoinGeckoClient;
use crate::config::Config;
use crate::export::TableExporter;
use crate::types::ExportSummary;

/// Fetch every configured page and write the snapshot file.
///
/// Nothing is written unless all pages were fetched.
pub async fn run(config: &Config) -> Result<ExportSummary> {
    let client = CoinGeckoClient::with_config(config.client_config())?;

    info!(
        "Fetching {} page(s) of {} coins in {}",
        config.api.pages,
        config.api.per_page,
        config.api.vs_currency.to_uppercase()
    );

    let records = client
        .fetch_markets(config.api.pages)
        .await
        .context("Error fetching market data")?;

    let exporter = TableExporter::new(config.export.missing_values);
    exporter
        .export(&records, &config.export.output_dir)
        .context("Error saving CSV")
}
