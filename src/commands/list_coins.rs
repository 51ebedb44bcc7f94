//! List-coins command - print every coin id in the CoinGecko catalog

use anyhow::{Context, Result};
use coingecko_export::{CoinGeckoClient, Config};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

pub fn run(config_path: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?
        .validated()
        .context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let ids = runtime.block_on(async {
        let client = CoinGeckoClient::with_config(config.client_config())?;
        let ids = client
            .fetch_all_symbols()
            .await
            .context("Error fetching symbols")?;
        Ok::<_, anyhow::Error>(ids)
    })?;

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_ids(BufWriter::new(file), &ids)?;
            info!("Wrote {} ids to {}", ids.len(), path.display());
            println!("Saved {} coin ids to {}", ids.len(), path.display());
        }
        None => write_ids(io::stdout().lock(), &ids)?,
    }

    Ok(())
}

fn write_ids<W: Write>(mut out: W, ids: &[String]) -> Result<()> {
    for id in ids {
        writeln!(out, "{}", id)?;
    }
    out.flush()?;
    Ok(())
}
