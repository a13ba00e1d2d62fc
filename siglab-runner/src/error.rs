//! Run-level errors: anything that aborts a backtest or a live run.

use chrono::NaiveDate;
use thiserror::Error;

use siglab_core::engine::TickError;
use siglab_core::ledger::LedgerError;
use siglab_core::market::MarketDataError;

use crate::config::ConfigError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("tick on {date} aborted: {source}")]
    Tick {
        date: NaiveDate,
        #[source]
        source: TickError,
    },

    #[error("market calendar failed: {0}")]
    Calendar(#[from] MarketDataError),

    #[error("brokerage failed: {0}")]
    Brokerage(#[from] LedgerError),

    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),
}
