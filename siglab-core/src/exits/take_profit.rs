//! Take profit composed with a trailing stop.
//!
//! Touching the target does not sell; it only marks the position so a later
//! stop-out is reported as "after take profit". The high and the stop are
//! lifted before the stop check, so a new high can never trigger its own
//! stop.

use serde::{Deserialize, Serialize};

use super::{Excursion, ExitOutcome, ExitReason};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitTrailing {
    /// Target gain as a fraction of entry.
    pub take_profit_pct: f64,
    /// Stop distance as a fraction of the running high.
    pub stop_pct: f64,
}

impl TakeProfitTrailing {
    /// Panics unless `take_profit_pct > 0` and `0 < stop_pct < 1`.
    pub fn new(take_profit_pct: f64, stop_pct: f64) -> Self {
        assert!(take_profit_pct > 0.0, "take_profit_pct must be positive");
        assert!(stop_pct > 0.0, "stop_pct must be positive");
        assert!(stop_pct < 1.0, "stop_pct must be < 1.0");
        Self {
            take_profit_pct,
            stop_pct,
        }
    }

    pub fn replay(&self, entry: f64, closes: &[f64]) -> ExitOutcome {
        let Some(&last) = closes.last() else {
            return ExitOutcome::no_data(entry);
        };

        let target = entry * (1.0 + self.take_profit_pct);
        let mut excursion = Excursion::new(entry);
        let mut high = entry;
        let mut stop = entry * (1.0 - self.stop_pct);
        let mut target_hit = false;

        for (i, &price) in closes.iter().enumerate() {
            excursion.observe(price);
            if price >= target {
                target_hit = true;
            }
            if price > high {
                high = price;
                stop = high * (1.0 - self.stop_pct);
            }
            if price <= stop {
                let reason = if target_hit {
                    ExitReason::TrailingStopAfterTakeProfit
                } else {
                    ExitReason::TrailingStopBeforeTakeProfit
                };
                return excursion.finish(price, i, reason);
            }
        }

        let reason = if target_hit {
            ExitReason::TakeProfitHeld
        } else {
            ExitReason::HeldToSellDate
        };
        excursion.finish(last, closes.len() - 1, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_after_target_is_tagged() {
        let out = TakeProfitTrailing::new(0.15, 0.10).replay(100.0, &[110.0, 120.0, 107.0]);
        assert_eq!(out.reason, ExitReason::TrailingStopAfterTakeProfit);
        assert_eq!(out.exit_index, Some(2));
        assert_eq!(out.exit_price, 107.0);
    }

    #[test]
    fn stop_before_target_is_tagged() {
        let out = TakeProfitTrailing::new(0.15, 0.10).replay(100.0, &[105.0, 94.0]);
        assert_eq!(out.reason, ExitReason::TrailingStopBeforeTakeProfit);
        assert_eq!(out.exit_index, Some(1));
    }

    #[test]
    fn target_touch_alone_does_not_exit() {
        let out = TakeProfitTrailing::new(0.10, 0.15).replay(100.0, &[112.0, 115.0, 111.0]);
        assert_eq!(out.reason, ExitReason::TakeProfitHeld);
        assert_eq!(out.exit_price, 111.0);
    }

    #[test]
    fn untouched_target_holds_to_end() {
        let out = TakeProfitTrailing::new(0.50, 0.15).replay(100.0, &[101.0, 102.0]);
        assert_eq!(out.reason, ExitReason::HeldToSellDate);
        assert_eq!(out.exit_index, Some(1));
    }

    #[test]
    fn empty_series_is_no_data() {
        let out = TakeProfitTrailing::new(0.15, 0.15).replay(100.0, &[]);
        assert_eq!(out.reason, ExitReason::NoData);
    }
}
