//! CSV ingestion of signals and daily closes.
//!
//! Signals file: header-indexed columns `ticker, buy_date, sell_date,
//! allocation_percentage`, plus an optional `status`. Dates are ISO
//! `YYYY-MM-DD`. Rows already sold or completed are skipped; everything else
//! loads as pending.
//!
//! Prices file: long format `date, ticker, close`.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use siglab_core::data::{PriceBar, PriceHistory};
use siglab_core::domain::{Signal, SignalId, SignalStatus};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Column positions resolved from the header row.
struct SignalColumns {
    ticker: usize,
    buy_date: usize,
    sell_date: usize,
    allocation: usize,
    status: Option<usize>,
}

impl SignalColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Ok(Self {
            ticker: find("ticker").ok_or(LoadError::MissingColumn("ticker"))?,
            buy_date: find("buy_date").ok_or(LoadError::MissingColumn("buy_date"))?,
            sell_date: find("sell_date").ok_or(LoadError::MissingColumn("sell_date"))?,
            allocation: find("allocation_percentage")
                .ok_or(LoadError::MissingColumn("allocation_percentage"))?,
            status: find("status"),
        })
    }
}

/// Load signals from a CSV file.
pub fn load_signals(path: &Path) -> Result<Vec<Signal>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_signals(file)
}

/// Parse signals from any CSV reader.
///
/// Ids are derived from the data-row ordinal and row content, so the same
/// file always yields the same ids.
pub fn parse_signals<R: Read>(reader: R) -> Result<Vec<Signal>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = SignalColumns::from_headers(rdr.headers()?)?;

    let mut signals = Vec::new();
    let mut skipped = 0usize;
    for (ordinal, record) in rdr.records().enumerate() {
        let record = record?;
        // header is line 1
        let row = ordinal + 2;
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| LoadError::InvalidRow {
                    row,
                    reason: format!("missing {name}"),
                })
        };

        if let Some(raw) = columns.status.and_then(|i| record.get(i)).filter(|s| !s.is_empty()) {
            match SignalStatus::parse(raw) {
                Some(status) if status.is_terminal() => {
                    debug!(row, status = raw, "skipping finished signal");
                    skipped += 1;
                    continue;
                }
                Some(_) => {}
                None => {
                    return Err(LoadError::InvalidRow {
                        row,
                        reason: format!("unknown status '{raw}'"),
                    })
                }
            }
        }

        let ticker = field(columns.ticker, "ticker")?;
        let buy_date = parse_date(field(columns.buy_date, "buy_date")?, row)?;
        let sell_date = parse_date(field(columns.sell_date, "sell_date")?, row)?;
        let weight = parse_weight(field(columns.allocation, "allocation_percentage")?, row)?;

        let id = SignalId::derive(ordinal, &ticker.to_ascii_uppercase(), buy_date, sell_date);
        let signal = Signal::new(id, ticker, buy_date, sell_date, weight).map_err(|e| LoadError::InvalidRow {
            row,
            reason: e.to_string(),
        })?;
        signals.push(signal);
    }

    info!(loaded = signals.len(), skipped, "signals loaded");
    Ok(signals)
}

fn parse_date(raw: &str, row: usize) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| LoadError::InvalidRow {
        row,
        reason: format!("invalid date '{raw}': {e}"),
    })
}

/// Accepts `50`, `50.5` or `50%`.
fn parse_weight(raw: &str, row: usize) -> Result<Decimal, LoadError> {
    raw.trim_end_matches('%')
        .trim()
        .parse::<Decimal>()
        .map_err(|e| LoadError::InvalidRow {
            row,
            reason: format!("invalid allocation_percentage '{raw}': {e}"),
        })
}

/// Load a long-format price file into a history.
pub fn load_prices(path: &Path) -> Result<PriceHistory, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_prices(file)
}

pub fn parse_prices<R: Read>(reader: R) -> Result<PriceHistory, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut bars = Vec::new();
    for bar in rdr.deserialize::<PriceBar>() {
        bars.push(bar?);
    }
    let history = PriceHistory::from_bars(bars);
    info!(bars = history.bar_count(), "prices loaded");
    Ok(history)
}
