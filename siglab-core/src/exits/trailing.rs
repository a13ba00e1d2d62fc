//! Simple trailing stop.
//!
//! The stop starts at `entry * (1 - stop_pct)` and is lifted to
//! `high * (1 - stop_pct)` whenever a new high closes. A close at or below
//! the stop exits that day; otherwise the position is held to the last close.

use serde::{Deserialize, Serialize};

use super::{Excursion, ExitOutcome, ExitReason};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// Stop distance as a fraction (0.15 for 15%).
    pub stop_pct: f64,
}

impl TrailingStop {
    /// Panics unless `0 < stop_pct < 1`.
    pub fn new(stop_pct: f64) -> Self {
        assert!(stop_pct > 0.0, "stop_pct must be positive");
        assert!(stop_pct < 1.0, "stop_pct must be < 1.0");
        Self { stop_pct }
    }

    pub fn replay(&self, entry: f64, closes: &[f64]) -> ExitOutcome {
        let Some(&last) = closes.last() else {
            return ExitOutcome::no_data(entry);
        };

        let mut excursion = Excursion::new(entry);
        let mut high = entry;
        let mut stop = entry * (1.0 - self.stop_pct);

        for (i, &price) in closes.iter().enumerate() {
            excursion.observe(price);
            if price <= stop {
                return excursion.finish(price, i, ExitReason::TrailingStop);
            }
            if price > high {
                high = price;
                stop = high * (1.0 - self.stop_pct);
            }
        }

        excursion.finish(last, closes.len() - 1, ExitReason::HeldToSellDate)
    }
}
