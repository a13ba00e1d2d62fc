//! Collaborator capabilities the core consumes.
//!
//! The engine never talks to a data vendor or a broker directly. It asks a
//! [`QuoteSource`] for prices, a [`MarketCalendar`] whether a day trades, and
//! a [`Brokerage`] to move cash and shares. The in-memory
//! [`PriceHistory`](crate::data::PriceHistory) and
//! [`Ledger`](crate::ledger::Ledger) implement these for backtests and paper
//! trading.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::Quote;
use crate::ledger::{LedgerError, Position};

/// Failure of the market-data collaborator itself.
///
/// A ticker simply having no bar on a date is not an error; sources return
/// `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("market data source unavailable: {0}")]
    Unavailable(String),

    #[error("market data request for {ticker} on {date} failed: {reason}")]
    Request {
        ticker: String,
        date: NaiveDate,
        reason: String,
    },
}

/// Quote lookup.
pub trait QuoteSource {
    /// Quote for `ticker` on `date`, or `Ok(None)` when there is no data.
    fn quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<Quote>, MarketDataError>;
}

/// Market-open predicate.
pub trait MarketCalendar {
    fn is_open(&self, date: NaiveDate) -> Result<bool, MarketDataError>;
}

/// Order execution and account state.
///
/// Methods take `&self`: implementations hold their own lock so one handle
/// can be shared by every stage of a tick.
pub trait Brokerage {
    fn buy(&self, ticker: &str, quantity: Decimal, price: Decimal) -> Result<(), LedgerError>;

    /// Sell and return the proceeds.
    fn sell(&self, ticker: &str, quantity: Decimal, price: Decimal) -> Result<Decimal, LedgerError>;

    fn position(&self, ticker: &str) -> Result<Position, LedgerError>;

    fn cash(&self) -> Result<Decimal, LedgerError>;

    fn account_value(&self) -> Result<Decimal, LedgerError>;

    fn deposit(&self, amount: Decimal) -> Result<(), LedgerError>;
}

impl<T: QuoteSource + ?Sized> QuoteSource for &T {
    fn quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<Quote>, MarketDataError> {
        (**self).quote(ticker, date)
    }
}

impl<T: MarketCalendar + ?Sized> MarketCalendar for &T {
    fn is_open(&self, date: NaiveDate) -> Result<bool, MarketDataError> {
        (**self).is_open(date)
    }
}
