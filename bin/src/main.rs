//! candela CLI - Dukascopy minute archives to multi-timeframe candles.

use anyhow::Result;
use candela_lib::{Period, PriceType};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;
mod logging;

use display::Format;

#[derive(Parser)]
#[command(name = "candela")]
#[command(about = "Ingest Dukascopy minute archives and fold them into candles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML). Defaults to the platform config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only, no progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Date range and universe selection shared by the pipeline commands.
#[derive(Args, Debug, Clone)]
pub(crate) struct RunArgs {
    /// First day (YYYY-MM-DD). Defaults to --end.
    #[arg(short, long)]
    start: Option<NaiveDate>,

    /// Last day, inclusive (YYYY-MM-DD). Defaults to yesterday (UTC).
    #[arg(short, long)]
    end: Option<NaiveDate>,

    /// Currency pairs, comma separated. Defaults to the configured universe.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Quote sides, comma separated (BID, ASK)
    #[arg(long, value_delimiter = ',')]
    price_types: Vec<PriceType>,

    /// Worker pool size
    #[arg(short, long)]
    workers: Option<usize>,

    /// Archive cache directory
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Bar store directory
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// Keep bars in memory instead of the bar store
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch base bars, then fold every derived tier
    Ingest {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Fetch, decode and store base bars only
    Fetch {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Fold derived tiers from stored bars only
    Aggregate {
        #[command(flatten)]
        run: RunArgs,

        /// Tiers to fold in ascending order, comma separated (e.g. m5,h1).
        /// Defaults to every derived tier of the chain.
        #[arg(short, long, value_delimiter = ',')]
        periods: Vec<Period>,
    },

    /// Export one stored series to a file
    Export {
        /// Currency pair (e.g. EURUSD)
        #[arg(long)]
        symbol: String,

        /// Candle period (m1, m5, m15, m30, h1, h4, d1, w1, mn)
        #[arg(short, long, default_value = "m1")]
        period: Period,

        /// Quote side
        #[arg(long, default_value = "BID")]
        price_type: PriceType,

        /// Provenance tag. Defaults to the configured feed tag.
        #[arg(long)]
        source: Option<String>,

        /// First day (YYYY-MM-DD)
        #[arg(short, long)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(short, long)]
        end: NaiveDate,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Output file path. Defaults to
        /// <SYMBOL>_from_<START>_to_<END>_<PERIOD>_<SIDE>.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include bars without trading volume
        #[arg(long)]
        all_bars: bool,

        /// Bar store directory
        #[arg(long)]
        store_root: Option<PathBuf>,
    },

    /// List the configured instrument universe
    Symbols,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config_path = cli.config.as_deref();

    match command {
        Commands::Ingest { run } => {
            commands::run::run(config_path, &run, commands::run::Phase::All, cli.quiet).await
        }
        Commands::Fetch { run } => {
            commands::run::run(config_path, &run, commands::run::Phase::Base, cli.quiet).await
        }
        Commands::Aggregate { run, periods } => {
            commands::run::run(config_path, &run, commands::run::Phase::Fold(periods), cli.quiet)
                .await
        }
        Commands::Export {
            symbol,
            period,
            price_type,
            source,
            start,
            end,
            format,
            output,
            all_bars,
            store_root,
        } => commands::export::export(
            config_path,
            &commands::export::ExportRequest {
                symbol,
                period,
                price_type,
                source,
                start,
                end,
                format,
                output,
                all_bars,
                store_root,
            },
            cli.quiet,
        ),
        Commands::Symbols => commands::symbols::list_symbols(config_path),
    }
}
