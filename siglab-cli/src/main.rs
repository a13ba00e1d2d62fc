//! siglab CLI — backtest, compare, live and import commands.
//!
//! Commands:
//! - `backtest` — replay a signals CSV over daily prices and print the trade ledger
//! - `compare` — score exit strategies per signal and print the summary
//! - `live` — run one tick of the trading job against a paper account
//! - `import` — append signals from a CSV to the live store as pending
//!
//! Reports go to stdout; logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use siglab_core::data::PriceHistory;
use siglab_core::domain::Signal;
use siglab_core::ledger::{Ledger, LedgerSnapshot};
use siglab_runner::report::{
    export_comparison_csv, export_trades_csv, render_backtest, render_comparison, render_run_report,
};
use siglab_runner::{
    compare_strategies, load_prices, load_signals, run_backtest, run_live, synthetic_history, JsonFileStore,
    LogNotifier, SiglabConfig, SignalStore,
};

/// Days of synthetic history generated before the first buy date, so SMA20
/// is available from the start.
const SYNTHETIC_WARMUP_DAYS: i64 = 40;

#[derive(Parser)]
#[command(name = "siglab", about = "siglab — signal backtester and trading job")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay signals over a price history with weekly deposits.
    Backtest {
        /// Signals CSV (ticker, buy_date, sell_date, allocation_percentage[, status]).
        #[arg(long)]
        signals: PathBuf,

        /// Prices CSV (date, ticker, close).
        #[arg(long, conflicts_with = "synthetic")]
        prices: Option<PathBuf>,

        /// Generate synthetic prices instead of reading a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the trade ledger as CSV to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Compare exit strategies signal by signal.
    Compare {
        /// Signals CSV.
        #[arg(long)]
        signals: PathBuf,

        /// Prices CSV (date, ticker, close).
        #[arg(long, conflicts_with = "synthetic")]
        prices: Option<PathBuf>,

        /// Generate synthetic prices instead of reading a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write every strategy row as CSV to this path.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Run one tick of the trading job against a paper account.
    Live {
        /// Signal store (JSON snapshot).
        #[arg(long)]
        store: PathBuf,

        /// Paper account (JSON ledger snapshot). Created when missing.
        #[arg(long)]
        account: PathBuf,

        /// Prices CSV (date, ticker, close).
        #[arg(long)]
        prices: PathBuf,

        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Opening cash when the account file does not exist yet.
        #[arg(long, default_value = "100000")]
        initial_cash: Decimal,

        /// TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Append signals from a CSV to the live store as pending.
    Import {
        /// Signals CSV.
        #[arg(long)]
        signals: PathBuf,

        /// Signal store (JSON snapshot).
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            signals,
            prices,
            synthetic,
            config,
            export,
        } => run_backtest_cmd(&signals, prices.as_deref(), synthetic, config.as_deref(), export.as_deref()),
        Commands::Compare {
            signals,
            prices,
            synthetic,
            config,
            export,
        } => run_compare_cmd(&signals, prices.as_deref(), synthetic, config.as_deref(), export.as_deref()),
        Commands::Live {
            store,
            account,
            prices,
            date,
            initial_cash,
            config,
        } => run_live_cmd(&store, &account, &prices, date.as_deref(), initial_cash, config.as_deref()),
        Commands::Import { signals, store } => run_import_cmd(&signals, &store),
    }
}

fn run_backtest_cmd(
    signals_path: &Path,
    prices_path: Option<&Path>,
    synthetic: bool,
    config_path: Option<&Path>,
    export: Option<&Path>,
) -> Result<()> {
    let config = SiglabConfig::load(config_path).context("failed to load config")?;
    let signals = load_signals(signals_path)
        .with_context(|| format!("failed to load signals from {}", signals_path.display()))?;
    let prices = price_history(&signals, prices_path, synthetic, &config)?;

    let result = run_backtest(signals, &prices, &config)?;
    print!("{}", render_backtest(&result));

    if let Some(path) = export {
        let csv = export_trades_csv(&result.trade_rows())?;
        std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Trade ledger exported to: {}", path.display());
    }
    Ok(())
}

fn run_compare_cmd(
    signals_path: &Path,
    prices_path: Option<&Path>,
    synthetic: bool,
    config_path: Option<&Path>,
    export: Option<&Path>,
) -> Result<()> {
    let config = SiglabConfig::load(config_path).context("failed to load config")?;
    let signals = load_signals(signals_path)
        .with_context(|| format!("failed to load signals from {}", signals_path.display()))?;
    let prices = price_history(&signals, prices_path, synthetic, &config)?;

    let comparison = compare_strategies(&signals, &prices, &config.exits)?;
    print!("{}", render_comparison(&comparison));

    if let Some(path) = export {
        let csv = export_comparison_csv(&comparison.rows)?;
        std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Comparison exported to: {}", path.display());
    }
    Ok(())
}

fn run_live_cmd(
    store_path: &Path,
    account_path: &Path,
    prices_path: &Path,
    date: Option<&str>,
    initial_cash: Decimal,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = SiglabConfig::load(config_path).context("failed to load config")?;
    let today = match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid --date '{raw}'"))?,
        None => chrono::Local::now().date_naive(),
    };
    let prices = load_prices(prices_path)
        .with_context(|| format!("failed to load prices from {}", prices_path.display()))?;

    let ledger = Ledger::from_snapshot(load_account(account_path, initial_cash)?);
    let store = JsonFileStore::new(store_path);

    // Orders may have filled even when the run aborts, so the account is
    // saved either way.
    let outcome = run_live(&store, &ledger, &prices, &LogNotifier, today, &config);
    save_account(account_path, &ledger.snapshot())?;
    let report = outcome?;

    print!("{}", render_run_report(&report));
    Ok(())
}

fn run_import_cmd(signals_path: &Path, store_path: &Path) -> Result<()> {
    let signals = load_signals(signals_path)
        .with_context(|| format!("failed to load signals from {}", signals_path.display()))?;
    let store = JsonFileStore::new(store_path);

    let mut snapshot = store.load()?;
    let incoming = signals.len();
    let added = snapshot.merge_signals(signals);
    store.save(&snapshot)?;

    info!(added, duplicates = incoming - added, "import finished");
    println!(
        "Imported {added} of {incoming} signals into {} ({} stored)",
        store_path.display(),
        snapshot.signals.len()
    );
    Ok(())
}

/// Read prices from a file, or synthesize them over the signals' date range.
fn price_history(
    signals: &[Signal],
    prices_path: Option<&Path>,
    synthetic: bool,
    config: &SiglabConfig,
) -> Result<PriceHistory> {
    match (prices_path, synthetic) {
        (Some(path), _) => {
            load_prices(path).with_context(|| format!("failed to load prices from {}", path.display()))
        }
        (None, true) => {
            let (Some(first), Some(last)) = (
                signals.iter().map(|s| s.buy_date).min(),
                signals.iter().map(|s| s.sell_date).max(),
            ) else {
                return Ok(PriceHistory::new());
            };
            let start = first - Duration::days(SYNTHETIC_WARMUP_DAYS);
            let end = last + Duration::days(i64::from(config.exits.quote_retry_days));
            let mut tickers: Vec<&str> = signals.iter().map(|s| s.ticker.as_str()).collect();
            tickers.sort_unstable();
            tickers.dedup();
            Ok(synthetic_history(tickers, start, end))
        }
        (None, false) => bail!("one of --prices or --synthetic is required"),
    }
}

fn load_account(path: &Path, initial_cash: Decimal) -> Result<LedgerSnapshot> {
    if !path.exists() {
        info!(path = %path.display(), cash = %initial_cash, "opening new paper account");
        return Ok(LedgerSnapshot {
            cash: initial_cash,
            ..LedgerSnapshot::default()
        });
    }
    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse account {}", path.display()))
}

fn save_account(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("failed to serialize account")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
