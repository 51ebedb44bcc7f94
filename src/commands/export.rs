//! Export command - fetch the ranked market listing and save it as CSV

use anyhow::{Context, Result};
use clap::Args;
use coingecko_export::{snapshot, Config, MissingValuePolicy};
use std::path::PathBuf;
use tracing::info;

/// Flags that override the loaded configuration
#[derive(Args, Debug, Default, Clone)]
pub struct ExportArgs {
    /// Number of pages to fetch
    #[arg(long)]
    pub pages: Option<u32>,

    /// Coins per page (max 250)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Quote currency for prices, e.g. "usd" or "eur"
    #[arg(long)]
    pub vs_currency: Option<String>,

    /// Directory the CSV file is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seconds to wait between page requests
    #[arg(long)]
    pub page_delay_secs: Option<u64>,

    /// Retries after a rate-limited (429) response
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// How to render null numeric fields: "blank" or "error"
    #[arg(long)]
    pub missing_values: Option<MissingValuePolicy>,
}

impl ExportArgs {
    fn apply(self, config: &mut Config) {
        if let Some(pages) = self.pages {
            config.api.pages = pages;
        }
        if let Some(per_page) = self.per_page {
            config.api.per_page = per_page;
        }
        if let Some(vs_currency) = self.vs_currency {
            config.api.vs_currency = vs_currency;
        }
        if let Some(dir) = self.output_dir {
            config.export.output_dir = dir;
        }
        if let Some(delay) = self.page_delay_secs {
            config.api.page_delay_secs = delay;
        }
        if let Some(retries) = self.max_retries {
            config.retry.max_retries = retries;
        }
        if let Some(policy) = self.missing_values {
            config.export.missing_values = policy;
        }
    }
}

pub fn run(config_path: Option<PathBuf>, args: ExportArgs) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    args.apply(&mut config);
    let config = config.validated().context("Invalid configuration")?;

    info!(
        "Exporting top {} coins to {}",
        config.api.pages.saturating_mul(config.api.per_page),
        config.export.output_dir.display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let summary = runtime.block_on(snapshot::run(&config))?;

    println!("Data saved to {} ({} coins)", summary.path.display(), summary.rows);
    Ok(())
}
