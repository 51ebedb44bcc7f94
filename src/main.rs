//! CoinGecko market export - main entry point
//!
//! This binary provides two subcommands:
//! - export: Fetch the ranked market listing and save it as CSV (default)
//! - list-coins: Print every coin id in the CoinGecko catalog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::export::ExportArgs;

#[derive(Parser, Debug)]
#[command(name = "coingecko-export")]
#[command(about = "Snapshot the CoinGecko ranked market listing into a timestamped CSV file", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Export flags, used when no subcommand is given
    #[command(flatten)]
    export: ExportArgs,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log to the console only
    #[arg(long, global = true)]
    no_log_file: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch market data and save it as CSV (default when no command is given)
    Export(ExportArgs),

    /// Print every coin id known to CoinGecko
    ListCoins {
        /// Write ids to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool, command_name: &str, log_to_file: bool) -> Result<()> {
    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Logs go to stderr so list-coins output stays pipeable
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    if !log_to_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return Ok(());
    }

    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);
    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Log file: {}", log_path.display());
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Export(cli.export));

    let command_name = match &command {
        Commands::Export(_) => "export",
        Commands::ListCoins { .. } => "list_coins",
    };

    setup_logging(cli.verbose, command_name, !cli.no_log_file)?;

    match command {
        Commands::Export(args) => commands::export::run(cli.config, args),
        Commands::ListCoins { output } => commands::list_coins::run(cli.config, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_flags_without_subcommand() {
        let cli =
            Cli::try_parse_from(["coingecko-export", "--pages", "3", "--no-log-file"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.no_log_file);
        assert_eq!(cli.export.pages, Some(3));
    }

    #[test]
    fn test_export_subcommand_flags() {
        let cli = Cli::try_parse_from(["coingecko-export", "export", "--pages", "3", "-o", "out"])
            .unwrap();
        match cli.command {
            Some(Commands::Export(args)) => {
                assert_eq!(args.pages, Some(3));
                assert_eq!(args.output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("expected export, got {:?}", other),
        }
        assert_eq!(cli.export.pages, None);
    }

    #[test]
    fn test_list_coins_subcommand() {
        let cli = Cli::try_parse_from(["coingecko-export", "-v", "list-coins", "--output", "ids.txt"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::ListCoins { output: Some(_) })
        ));
    }

    #[test]
    fn test_export_flags_conflict_with_subcommand() {
        assert!(Cli::try_parse_from(["coingecko-export", "--pages", "3", "list-coins"]).is_err());
    }
}
