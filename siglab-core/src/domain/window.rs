//! Allocation window — flat per-signal sizing for the live job.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed-length period during which every new signal receives the same
/// dollar allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationWindow {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub account_value: Decimal,
    pub allocation_per_signal: Decimal,
    pub max_signals: u32,
}

impl AllocationWindow {
    /// Open a window starting `today` and ending `duration_days` later.
    ///
    /// Each signal gets `account_value / max_signals`. A zero signal cap is
    /// treated as one.
    pub fn open(today: NaiveDate, account_value: Decimal, max_signals: u32, duration_days: u32) -> Self {
        let slots = Decimal::from(max_signals.max(1));
        Self {
            window_start: today,
            window_end: today + Duration::days(i64::from(duration_days)),
            account_value,
            allocation_per_signal: account_value / slots,
            max_signals: max_signals.max(1),
        }
    }

    /// A window expires on the first day after its end.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.window_end
    }
}
