//! Ledger — cash and per-ticker positions with weighted average cost.
//!
//! The ledger is the single source of truth for money. Every stage of a tick
//! reaches it through the [`Brokerage`] capability; state sits behind one
//! mutex so concurrent readers see a consistent balance.
//!
//! Account value is marked to model: cash plus, for each position, shares
//! times average buy price. It moves only on deposits and realized sells.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::market::Brokerage;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("insufficient funds: need {need}, have {have}")]
    InsufficientFunds { need: Decimal, have: Decimal },

    #[error("insufficient shares of {ticker}: have {have}, trying to sell {requested}")]
    InsufficientShares {
        ticker: String,
        have: Decimal,
        requested: Decimal,
    },

    #[error("no position found for {0}")]
    NoPosition(String),

    #[error("invalid order for {ticker}: {reason}")]
    InvalidOrder { ticker: String, reason: String },

    #[error("deposit must be positive, got {0}")]
    InvalidDeposit(Decimal),

    #[error("brokerage unavailable: {0}")]
    Unavailable(String),
}

/// Aggregate holding in one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: Decimal,
    pub avg_buy_price: Decimal,
}

impl Position {
    pub fn cost_basis(&self) -> Decimal {
        self.shares * self.avg_buy_price
    }
}

/// Serializable ledger state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub cash: Decimal,
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
}

impl LedgerSnapshot {
    pub fn account_value(&self) -> Decimal {
        self.cash + self.positions.values().map(Position::cost_basis).sum::<Decimal>()
    }
}

/// In-memory brokerage.
#[derive(Debug, Default)]
pub struct Ledger {
    state: Mutex<LedgerSnapshot>,
}

impl Ledger {
    pub fn new(initial_cash: Decimal) -> Self {
        Self::from_snapshot(LedgerSnapshot {
            cash: initial_cash,
            positions: BTreeMap::new(),
        })
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.lock().clone()
    }

    pub fn cash(&self) -> Decimal {
        self.lock().cash
    }

    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.lock().positions.clone()
    }

    pub fn position(&self, ticker: &str) -> Option<Position> {
        self.lock().positions.get(ticker).cloned()
    }

    pub fn account_value(&self) -> Decimal {
        self.lock().account_value()
    }

    pub fn deposit(&self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidDeposit(amount));
        }
        let mut state = self.lock();
        state.cash += amount;
        info!(amount = %amount, cash = %state.cash, "deposit");
        Ok(())
    }

    /// Buy `quantity` shares at `price`, blending into the average cost.
    pub fn buy(&self, ticker: &str, quantity: Decimal, price: Decimal) -> Result<(), LedgerError> {
        validate_order(ticker, quantity, price)?;
        let cost = quantity * price;

        let mut state = self.lock();
        if cost > state.cash {
            return Err(LedgerError::InsufficientFunds {
                need: cost,
                have: state.cash,
            });
        }
        state.cash -= cost;

        let position = state
            .positions
            .entry(ticker.to_string())
            .or_insert(Position {
                shares: Decimal::ZERO,
                avg_buy_price: Decimal::ZERO,
            });
        let total_shares = position.shares + quantity;
        position.avg_buy_price = (position.cost_basis() + cost) / total_shares;
        position.shares = total_shares;

        debug!(
            ticker,
            quantity = %quantity,
            price = %price,
            cost = %cost,
            avg = %position.avg_buy_price,
            "ledger buy"
        );
        Ok(())
    }

    /// Sell `quantity` shares at `price`. The position is removed when its
    /// share count reaches exactly zero.
    pub fn sell(&self, ticker: &str, quantity: Decimal, price: Decimal) -> Result<Decimal, LedgerError> {
        validate_order(ticker, quantity, price)?;

        let mut state = self.lock();
        let position = state
            .positions
            .get_mut(ticker)
            .ok_or_else(|| LedgerError::NoPosition(ticker.to_string()))?;
        if position.shares < quantity {
            return Err(LedgerError::InsufficientShares {
                ticker: ticker.to_string(),
                have: position.shares,
                requested: quantity,
            });
        }
        position.shares -= quantity;
        if position.shares.is_zero() {
            state.positions.remove(ticker);
        }

        let proceeds = quantity * price;
        state.cash += proceeds;
        debug!(ticker, quantity = %quantity, price = %price, proceeds = %proceeds, "ledger sell");
        Ok(proceeds)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_order(ticker: &str, quantity: Decimal, price: Decimal) -> Result<(), LedgerError> {
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidOrder {
            ticker: ticker.to_string(),
            reason: format!("quantity must be positive, got {quantity}"),
        });
    }
    if price <= Decimal::ZERO {
        return Err(LedgerError::InvalidOrder {
            ticker: ticker.to_string(),
            reason: format!("price must be positive, got {price}"),
        });
    }
    Ok(())
}

impl Brokerage for Ledger {
    fn buy(&self, ticker: &str, quantity: Decimal, price: Decimal) -> Result<(), LedgerError> {
        Ledger::buy(self, ticker, quantity, price)
    }

    fn sell(&self, ticker: &str, quantity: Decimal, price: Decimal) -> Result<Decimal, LedgerError> {
        Ledger::sell(self, ticker, quantity, price)
    }

    fn position(&self, ticker: &str) -> Result<Position, LedgerError> {
        Ledger::position(self, ticker).ok_or_else(|| LedgerError::NoPosition(ticker.to_string()))
    }

    fn cash(&self) -> Result<Decimal, LedgerError> {
        Ok(Ledger::cash(self))
    }

    fn account_value(&self) -> Result<Decimal, LedgerError> {
        Ok(Ledger::account_value(self))
    }

    fn deposit(&self, amount: Decimal) -> Result<(), LedgerError> {
        Ledger::deposit(self, amount)
    }
}
