//! Signal — a trading intent and its lifecycle record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::SignalId;
use super::trade::Trade;

/// Lifecycle state shared by both consumers.
///
/// The live job names the last two states `BOUGHT` and `COMPLETED`; both
/// spellings deserialize to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Pending,
    #[serde(alias = "BOUGHT")]
    Active,
    #[serde(alias = "COMPLETED")]
    Sold,
}

impl SignalStatus {
    /// Parse either naming, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "ACTIVE" | "BOUGHT" => Some(Self::Active),
            "SOLD" | "COMPLETED" => Some(Self::Sold),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Sold
    }
}

/// What happens to a signal record once it reaches the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalAction {
    Retain,
    Delete,
}

/// Which consumer drives the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consumer {
    Backtest,
    Live,
}

impl Consumer {
    pub fn status_label(self, status: SignalStatus) -> &'static str {
        match (self, status) {
            (_, SignalStatus::Pending) => "PENDING",
            (Self::Backtest, SignalStatus::Active) => "ACTIVE",
            (Self::Backtest, SignalStatus::Sold) => "SOLD",
            (Self::Live, SignalStatus::Active) => "BOUGHT",
            (Self::Live, SignalStatus::Sold) => "COMPLETED",
        }
    }

    pub fn terminal_action(self) -> TerminalAction {
        match self {
            Self::Backtest => TerminalAction::Retain,
            Self::Live => TerminalAction::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalValidationError {
    #[error("sell date {sell} is before buy date {buy}")]
    SellBeforeBuy { buy: NaiveDate, sell: NaiveDate },

    #[error("allocation weight must be non-negative, got {0}")]
    NegativeWeight(Decimal),

    #[error("ticker must not be empty")]
    EmptyTicker,
}

/// A trading intent plus every lot executed on its behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub ticker: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    /// Target weight in percent (50 means half the account).
    pub allocation_weight: Decimal,
    pub status: SignalStatus,
    #[serde(default)]
    pub initial_trade: Option<Trade>,
    #[serde(default)]
    pub dip_trades: Vec<Trade>,
    /// Highest price seen since the signal became active.
    #[serde(default)]
    pub high_price: Decimal,
}

impl Signal {
    /// A new pending signal.
    pub fn new(
        id: SignalId,
        ticker: impl Into<String>,
        buy_date: NaiveDate,
        sell_date: NaiveDate,
        allocation_weight: Decimal,
    ) -> Result<Self, SignalValidationError> {
        let ticker = ticker.into().trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(SignalValidationError::EmptyTicker);
        }
        if sell_date < buy_date {
            return Err(SignalValidationError::SellBeforeBuy {
                buy: buy_date,
                sell: sell_date,
            });
        }
        if allocation_weight < Decimal::ZERO {
            return Err(SignalValidationError::NegativeWeight(allocation_weight));
        }
        Ok(Self {
            id,
            ticker,
            buy_date,
            sell_date,
            allocation_weight,
            status: SignalStatus::Pending,
            initial_trade: None,
            dip_trades: Vec::new(),
            high_price: Decimal::ZERO,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == SignalStatus::Pending
    }

    pub fn is_active(&self) -> bool {
        self.status == SignalStatus::Active
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pending or active signals compete for capital.
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    /// Initial lot followed by dip lots, in fill order.
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.initial_trade.iter().chain(self.dip_trades.iter())
    }

    pub fn trades_mut(&mut self) -> impl Iterator<Item = &mut Trade> {
        self.initial_trade.iter_mut().chain(self.dip_trades.iter_mut())
    }

    pub fn total_quantity(&self) -> Decimal {
        self.trades().map(|t| t.quantity).sum()
    }

    pub fn total_cost(&self) -> Decimal {
        self.trades().map(|t| t.cost).sum()
    }

    /// Date of the most recent fill.
    pub fn last_fill_date(&self) -> Option<NaiveDate> {
        self.trades().map(|t| t.buy_date).max()
    }

    /// Sum of each lot's own proceeds minus cost. `None` until every lot
    /// has closed.
    pub fn realized_pnl(&self) -> Option<Decimal> {
        if self.initial_trade.is_none() {
            return None;
        }
        self.trades().map(|t| t.profit_loss()).sum()
    }

    /// Raise the running high; it never falls.
    pub fn observe_price(&mut self, price: Decimal) {
        if price > self.high_price {
            self.high_price = price;
        }
    }
}
