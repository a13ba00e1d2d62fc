//! Allocation engine — turns signal weights into dollar amounts.
//!
//! Two sizing modes:
//! - [`Sizing::Weighted`] (backtest): weights are percentages of the current
//!   account value. When live weights sum past 100 they are renormalized so
//!   the total never exceeds the account.
//! - [`Sizing::Flat`] (live job): every new signal gets the same amount,
//!   taken from the current [`AllocationWindow`].
//!
//! Dip buys never go through either formula; they reuse the initial lot's
//! cost (see [`dip_allocation`]).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{AllocationWindow, Signal};
use crate::ledger::LedgerError;
use crate::market::Brokerage;

/// Weights are expressed in percent.
pub const FULL_WEIGHT: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sizing {
    Weighted,
    Flat(Decimal),
}

/// Sum of weights over pending and active signals.
pub fn live_weight_total<'a>(signals: impl IntoIterator<Item = &'a Signal>) -> Decimal {
    signals
        .into_iter()
        .filter(|s| s.is_live())
        .map(|s| s.allocation_weight)
        .sum()
}

/// Dollar allocation for one weight given the live total.
///
/// `total_weight <= 100`: absolute share of the account.
/// `total_weight > 100`: proportional share, so the sum stays within
/// `account_value`.
pub fn weighted_allocation(weight: Decimal, total_weight: Decimal, account_value: Decimal) -> Decimal {
    if total_weight <= FULL_WEIGHT {
        weight / FULL_WEIGHT * account_value
    } else {
        weight / total_weight * account_value
    }
}

/// Allocation for a signal about to enter.
///
/// Weighted sizing reads the account value fresh from the brokerage on every
/// call, so earlier entries in the same tick are reflected.
pub fn entry_allocation(
    sizing: Sizing,
    signal: &Signal,
    signals: &[Signal],
    broker: &dyn Brokerage,
) -> Result<Decimal, LedgerError> {
    match sizing {
        Sizing::Flat(amount) => Ok(amount),
        Sizing::Weighted => {
            let total_weight = live_weight_total(signals);
            let account_value = broker.account_value()?;
            let amount = weighted_allocation(signal.allocation_weight, total_weight, account_value);
            debug!(
                ticker = %signal.ticker,
                weight = %signal.allocation_weight,
                total_weight = %total_weight,
                account_value = %account_value,
                amount = %amount,
                "weighted allocation"
            );
            Ok(amount)
        }
    }
}

/// Dip lots are sized identically to the first lot.
pub fn dip_allocation(signal: &Signal) -> Option<Decimal> {
    signal.initial_trade.as_ref().map(|t| t.cost)
}

/// Keep the current window, or open a new one when absent or expired.
///
/// `account_value` is only consulted when a new window is opened.
pub fn refresh_window<F>(
    current: Option<AllocationWindow>,
    today: NaiveDate,
    max_signals: u32,
    duration_days: u32,
    account_value: F,
) -> Result<AllocationWindow, LedgerError>
where
    F: FnOnce() -> Result<Decimal, LedgerError>,
{
    match current {
        Some(window) if !window.is_expired(today) => Ok(window),
        _ => {
            let value = account_value()?;
            let window = AllocationWindow::open(today, value, max_signals, duration_days);
            info!(
                start = %window.window_start,
                end = %window.window_end,
                account_value = %window.account_value,
                per_signal = %window.allocation_per_signal,
                "opened allocation window"
            );
            Ok(window)
        }
    }
}

/// Flat amount for the live job, falling back to `default` without a window.
pub fn flat_amount(window: Option<&AllocationWindow>, default: Decimal) -> Decimal {
    match window {
        Some(w) => w.allocation_per_signal,
        None => {
            warn!(default = %default, "no allocation window, using default allocation");
            default
        }
    }
}
