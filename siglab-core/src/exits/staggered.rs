//! Staggered entry — part of the position at the signal price, the rest at a
//! detected dip.
//!
//! The dip price comes from a first-match waterfall over the closes in the
//! entry window. The order of the heuristics is fixed; comparisons across
//! runs depend on replaying it exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ExitOutcome, TrailingStop};

/// Which heuristic produced the dip price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DipSource {
    /// A close at least 5% below entry.
    OversoldDrop,
    /// Third close below the mean of the first two, and below entry.
    MovingAverageCross,
    /// A single-day drop of more than 3%.
    VolatilitySpike,
    /// A close at least 2% below entry.
    SupportBreak,
    /// Second close lower than the first, and below entry.
    MomentumReversal,
    /// Lowest close, when at least 1% below entry.
    LowestPrice,
    NoDip,
    NoData,
}

impl fmt::Display for DipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OversoldDrop => "oversold (5% drop)",
            Self::MovingAverageCross => "moving average crossover",
            Self::VolatilitySpike => "volatility spike (3% daily drop)",
            Self::SupportBreak => "support break (2% drop)",
            Self::MomentumReversal => "momentum reversal",
            Self::LowestPrice => "lowest price (1%+ drop)",
            Self::NoDip => "no dip detected",
            Self::NoData => "no dip detected (no data)",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DipEntry {
    pub price: f64,
    pub source: DipSource,
}

/// Find the dip price in `window`, falling back to `initial`.
pub fn detect_dip(initial: f64, window: &[f64]) -> DipEntry {
    let found = |price: f64, source: DipSource| DipEntry { price, source };

    if window.is_empty() {
        return found(initial, DipSource::NoData);
    }

    if let Some(&p) = window.iter().find(|&&p| p <= initial * 0.95) {
        return found(p, DipSource::OversoldDrop);
    }

    if window.len() >= 3 {
        let ma2 = (window[0] + window[1]) / 2.0;
        if window[2] < ma2 && window[2] < initial {
            return found(window[2], DipSource::MovingAverageCross);
        }
    }

    for pair in window.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if prev > 0.0 && (cur - prev) / prev < -0.03 {
            return found(cur, DipSource::VolatilitySpike);
        }
    }

    if let Some(&p) = window.iter().find(|&&p| p <= initial * 0.98) {
        return found(p, DipSource::SupportBreak);
    }

    if window.len() >= 2 && window[1] < window[0] && window[1] < initial {
        return found(window[1], DipSource::MomentumReversal);
    }

    let lowest = window.iter().copied().fold(f64::INFINITY, f64::min);
    if lowest < initial * 0.99 {
        return found(lowest, DipSource::LowestPrice);
    }

    found(initial, DipSource::NoDip)
}

/// `initial * stagger + dip * (1 - stagger)`.
pub fn blended_entry(initial: f64, dip: f64, stagger_pct: f64) -> f64 {
    initial * stagger_pct + dip * (1.0 - stagger_pct)
}

/// Staggered entry followed by a trailing stop on the blended price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaggeredEntry {
    /// Fraction bought at the signal price (0.8 means 80/20).
    pub stagger_pct: f64,
    pub stop: TrailingStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaggeredOutcome {
    pub dip: DipEntry,
    pub entry_price: f64,
    pub exit: ExitOutcome,
}

impl StaggeredEntry {
    /// Panics unless `stagger_pct` is within `[0, 1]`.
    pub fn new(stagger_pct: f64, stop: TrailingStop) -> Self {
        assert!(
            (0.0..=1.0).contains(&stagger_pct),
            "stagger_pct must be within [0, 1]"
        );
        Self { stagger_pct, stop }
    }

    /// Blended entry price from the signal price and the entry window.
    pub fn entry(&self, initial: f64, entry_window: &[f64]) -> (DipEntry, f64) {
        let dip = detect_dip(initial, entry_window);
        (dip, blended_entry(initial, dip.price, self.stagger_pct))
    }

    pub fn replay(&self, initial: f64, entry_window: &[f64], closes: &[f64]) -> StaggeredOutcome {
        let (dip, entry_price) = self.entry(initial, entry_window);
        StaggeredOutcome {
            dip,
            entry_price,
            exit: self.stop.replay(entry_price, closes),
        }
    }
}
