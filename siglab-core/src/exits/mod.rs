//! Exit simulations — pure replays of a daily close series.
//!
//! Each strategy walks the closes after entry and reports where it would have
//! sold, why, and the best and worst excursions seen up to that day. None of
//! them touch the ledger; the comparison runner uses them to score exit
//! policies against the same signal set.

pub mod staggered;
pub mod take_profit;
pub mod trailing;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use staggered::{blended_entry, detect_dip, DipEntry, DipSource, StaggeredEntry, StaggeredOutcome};
pub use take_profit::TakeProfitTrailing;
pub use trailing::TrailingStop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    NoData,
    HeldToSellDate,
    TrailingStop,
    TrailingStopBeforeTakeProfit,
    TrailingStopAfterTakeProfit,
    /// Target reached, then held to the sell date with the stop armed.
    TakeProfitHeld,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoData => "no data",
            Self::HeldToSellDate => "held until sell date",
            Self::TrailingStop => "trailing stop hit",
            Self::TrailingStopBeforeTakeProfit => "trailing stop hit (before take profit)",
            Self::TrailingStopAfterTakeProfit => "trailing stop hit (after take profit)",
            Self::TakeProfitHeld => "take profit reached, trailing stop active",
        };
        f.write_str(text)
    }
}

/// Result of one replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitOutcome {
    pub exit_price: f64,
    /// Index into the replayed series; `None` when the series was empty.
    pub exit_index: Option<usize>,
    pub reason: ExitReason,
    /// Best close relative to entry, in percent (never negative).
    pub max_gain_pct: f64,
    /// Worst close relative to entry, in percent (never positive).
    pub max_drawdown_pct: f64,
}

impl ExitOutcome {
    pub(crate) fn no_data(entry: f64) -> Self {
        Self {
            exit_price: entry,
            exit_index: None,
            reason: ExitReason::NoData,
            max_gain_pct: 0.0,
            max_drawdown_pct: 0.0,
        }
    }

    /// Percent return from `entry` to the exit price.
    pub fn return_pct(&self, entry: f64) -> f64 {
        if entry <= 0.0 {
            return 0.0;
        }
        (self.exit_price - entry) / entry * 100.0
    }
}

/// Hold through every close and exit on the last one.
pub fn hold(entry: f64, closes: &[f64]) -> ExitOutcome {
    let Some(&last) = closes.last() else {
        return ExitOutcome::no_data(entry);
    };
    let mut excursion = Excursion::new(entry);
    for &price in closes {
        excursion.observe(price);
    }
    excursion.finish(last, closes.len() - 1, ExitReason::HeldToSellDate)
}

/// Running best/worst close relative to an entry price.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Excursion {
    entry: f64,
    max_gain_pct: f64,
    max_drawdown_pct: f64,
}

impl Excursion {
    pub(crate) fn new(entry: f64) -> Self {
        Self {
            entry,
            max_gain_pct: 0.0,
            max_drawdown_pct: 0.0,
        }
    }

    pub(crate) fn observe(&mut self, price: f64) {
        if self.entry <= 0.0 {
            return;
        }
        let change = (price - self.entry) / self.entry * 100.0;
        self.max_gain_pct = self.max_gain_pct.max(change);
        self.max_drawdown_pct = self.max_drawdown_pct.min(change);
    }

    pub(crate) fn finish(self, exit_price: f64, exit_index: usize, reason: ExitReason) -> ExitOutcome {
        ExitOutcome {
            exit_price,
            exit_index: Some(exit_index),
            reason,
            max_gain_pct: self.max_gain_pct,
            max_drawdown_pct: self.max_drawdown_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excursion_tracks_both_sides() {
        let mut e = Excursion::new(100.0);
        for p in [100.0, 110.0, 90.0, 105.0] {
            e.observe(p);
        }
        let out = e.finish(105.0, 3, ExitReason::HeldToSellDate);
        assert!((out.max_gain_pct - 10.0).abs() < 1e-9);
        assert!((out.max_drawdown_pct + 10.0).abs() < 1e-9);
        assert!((out.return_pct(100.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn hold_sees_whole_path() {
        let out = hold(100.0, &[80.0, 130.0, 105.0]);
        assert_eq!(out.exit_index, Some(2));
        assert_eq!(out.exit_price, 105.0);
        assert!((out.max_gain_pct - 30.0).abs() < 1e-9);
        assert!((out.max_drawdown_pct + 20.0).abs() < 1e-9);
        assert_eq!(hold(100.0, &[]).reason, ExitReason::NoData);
    }

    #[test]
    fn reasons_read_as_text() {
        assert_eq!(ExitReason::TrailingStop.to_string(), "trailing stop hit");
        assert_eq!(
            ExitReason::TrailingStopAfterTakeProfit.to_string(),
            "trailing stop hit (after take profit)"
        );
    }

    #[test]
    fn no_data_exits_at_entry() {
        let out = ExitOutcome::no_data(50.0);
        assert_eq!(out.exit_price, 50.0);
        assert_eq!(out.exit_index, None);
        assert_eq!(out.return_pct(50.0), 0.0);
    }
}
