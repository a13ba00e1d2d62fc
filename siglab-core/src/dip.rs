//! Dip-buy trigger.
//!
//! A pure predicate over an active signal and today's quote. Six conditions
//! are checked in a fixed order and the first failure is returned, so logs
//! say exactly why a dip was passed over.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Quote, Signal};

/// Why a dip buy was not taken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DipRejection {
    #[error("signal has no initial trade")]
    NoEntry,

    #[error("price {price} is not below the 20-SMA ({sma:?})")]
    NotBelowSma { price: Decimal, sma: Option<Decimal> },

    #[error("pullback {drop_pct}% from high {high} is under {required}%")]
    ShallowPullback {
        drop_pct: Decimal,
        high: Decimal,
        required: Decimal,
    },

    #[error("20-SMA {sma} is below entry price {entry}")]
    SmaBelowEntry { sma: Decimal, entry: Decimal },

    #[error("only {days} days since last buy, need {required}")]
    TooSoon { days: i64, required: i64 },

    #[error("price {price} is not below entry price {entry}")]
    NotBelowEntry { price: Decimal, entry: Decimal },

    #[error("already {count} dip buys, max {max}")]
    MaxDipBuys { count: usize, max: usize },
}

/// Thresholds for the dip trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipBuyRule {
    /// Minimum drop from the running high, in percent.
    pub min_pullback_pct: Decimal,
    pub min_days_between_buys: i64,
    pub max_dip_buys: usize,
}

impl Default for DipBuyRule {
    fn default() -> Self {
        Self {
            min_pullback_pct: dec!(10),
            min_days_between_buys: 5,
            max_dip_buys: 2,
        }
    }
}

impl DipBuyRule {
    pub fn evaluate(&self, signal: &Signal, quote: &Quote, today: NaiveDate) -> Result<(), DipRejection> {
        let entry = signal.initial_trade.as_ref().ok_or(DipRejection::NoEntry)?;
        let price = quote.price;

        // 1. momentum filter
        let sma = match quote.usable_sma20() {
            Some(sma) if price < sma => sma,
            other => {
                return Err(DipRejection::NotBelowSma { price, sma: other });
            }
        };

        // 2. pullback from high
        let drop_pct = pullback_pct(signal.high_price, price);
        if drop_pct < self.min_pullback_pct {
            return Err(DipRejection::ShallowPullback {
                drop_pct,
                high: signal.high_price,
                required: self.min_pullback_pct,
            });
        }

        // 3. uptrend relative to entry
        if sma < entry.buy_price {
            return Err(DipRejection::SmaBelowEntry {
                sma,
                entry: entry.buy_price,
            });
        }

        // 4. spacing
        let last_fill = signal.last_fill_date().unwrap_or(entry.buy_date);
        let days = (today - last_fill).num_days();
        if days < self.min_days_between_buys {
            return Err(DipRejection::TooSoon {
                days,
                required: self.min_days_between_buys,
            });
        }

        // 5. average down only
        if price >= entry.buy_price {
            return Err(DipRejection::NotBelowEntry {
                price,
                entry: entry.buy_price,
            });
        }

        // 6. cap
        if signal.dip_trades.len() >= self.max_dip_buys {
            return Err(DipRejection::MaxDipBuys {
                count: signal.dip_trades.len(),
                max: self.max_dip_buys,
            });
        }

        Ok(())
    }

    pub fn should_buy(&self, signal: &Signal, quote: &Quote, today: NaiveDate) -> bool {
        self.evaluate(signal, quote, today).is_ok()
    }
}

/// Percent drop of `price` below `high`; zero without a positive high.
pub fn pullback_pct(high: Decimal, price: Decimal) -> Decimal {
    if high <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (high - price) / high * Decimal::ONE_HUNDRED
}
