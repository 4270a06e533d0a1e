//! ticker-rating: rank a ticker universe by short-term and long-term score.
//!
//! Usage:
//!   ticker-rating                      # interactive menu
//!   ticker-rating 3                    # big tech list
//!   ticker-rating small-cap --json
//!   ticker-rating --tickers aapl,msft,nvda --concurrency 4

use anyhow::{bail, Context, Result};
use clap::Parser;
use rating_engine::{MetricsAssembler, Ranker, RatingConfig, TickerUniverse};
use std::path::PathBuf;
use std::sync::Arc;
use yahoo_client::YahooFinanceClient;

mod menu;
mod report;

use menu::Selection;

#[derive(Parser)]
#[command(name = "ticker-rating")]
#[command(about = "Rank tickers by heuristic short-term and long-term scores", long_about = None)]
#[command(version)]
struct Cli {
    /// Menu choice (1-5) or list name; prompts when omitted
    choice: Option<String>,

    /// Comma-separated tickers to rate instead of a named list
    #[arg(short, long)]
    tickers: Option<String>,

    /// Tickers evaluated at once (overrides MAX_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Trailing calendar days used for alpha and beta (overrides RISK_WINDOW_DAYS)
    #[arg(long)]
    window_days: Option<u32>,

    /// Benchmark index symbol (overrides BENCHMARK_SYMBOL)
    #[arg(long)]
    benchmark: Option<String>,

    /// JSON file with extra or replacement ticker lists (overrides UNIVERSE_FILE)
    #[arg(long)]
    universe_file: Option<PathBuf>,

    /// Print the ranking as JSON instead of a table
    #[arg(long, default_value = "false")]
    json: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("ticker_rating=info,rating_engine=info,yahoo_client=warn")
    });

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<RatingConfig> {
    let mut config = RatingConfig::from_env().context("Invalid configuration")?;

    if let Some(concurrency) = cli.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(days) = cli.window_days {
        config.risk_window_days = days;
    }
    if let Some(benchmark) = &cli.benchmark {
        config.benchmark_symbol = benchmark.clone();
    }
    if let Some(path) = &cli.universe_file {
        config.universe_file = Some(path.clone());
    }

    config.validate().context("Invalid command-line options")?;
    Ok(config)
}

fn load_universe(config: &RatingConfig) -> Result<TickerUniverse> {
    let universe = TickerUniverse::builtin();
    match &config.universe_file {
        Some(path) => {
            let extra = TickerUniverse::load_file(path)?;
            tracing::info!("Loaded {} ticker lists from {}", extra.lists().len(), path.display());
            Ok(universe.merge(extra))
        }
        None => Ok(universe),
    }
}

fn resolve_tickers(cli: &Cli, universe: &TickerUniverse) -> Result<Option<Vec<String>>> {
    let selection = match (&cli.tickers, &cli.choice) {
        (Some(list), _) => Selection::Custom(rating_engine::parse_custom_list(list)),
        (None, Some(choice)) => match menu::parse_choice(choice, universe) {
            Some(selection) => selection,
            None => bail!("Invalid choice {:?}", choice),
        },
        (None, None) => {
            print!("{}", menu::menu_text(universe));
            let choice = menu::prompt("Your choice: ")?;
            match menu::parse_choice(&choice, universe) {
                Some(selection) => selection,
                None => bail!("Invalid choice {:?}", choice),
            }
        }
    };

    let tickers = match selection {
        Selection::Info => {
            println!();
            println!("{}", report::METRIC_GUIDE);
            return Ok(None);
        }
        Selection::List(key) => universe
            .resolve(&key)
            .map(|list| list.tickers.clone())
            .with_context(|| format!("Unknown ticker list {}", key))?,
        Selection::CustomPrompt => menu::prompt_custom_list()?,
        Selection::Custom(tickers) => tickers,
    };

    if tickers.is_empty() {
        bail!("No tickers to rate");
    }
    Ok(Some(tickers))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let universe = load_universe(&config)?;

    let tickers = match resolve_tickers(&cli, &universe)? {
        Some(tickers) => tickers,
        None => return Ok(()),
    };

    tracing::info!(
        "Benchmark {}, {}-day risk window, {}s fetch timeout",
        config.benchmark_symbol,
        config.risk_window_days,
        config.fetch_timeout_secs
    );

    let provider = Arc::new(
        YahooFinanceClient::with_retries(config.max_retries)
            .with_request_timeout(config.attempt_timeout()),
    );
    let assembler = Arc::new(MetricsAssembler::new(provider, &config));
    let ranker = Ranker::new(assembler, config.max_concurrency);

    let ranking = ranker.evaluate(&tickers).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&ranking)?);
    } else {
        print!("{}", report::render_rankings(&ranking.entries));
    }

    Ok(())
}
