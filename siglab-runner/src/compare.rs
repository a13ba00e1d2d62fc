//! Strategy comparison — scores alternative entry/exit policies per signal.
//!
//! Every signal is replayed independently (in parallel) against its own
//! price path; nothing here touches a ledger. Results keep the input signal
//! order. Signals whose buy or sell price cannot be found within the retry
//! window are skipped with a warning.

use std::fmt;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use siglab_core::data::PriceHistory;
use siglab_core::domain::{Signal, SignalId};
use siglab_core::exits::{self, ExitOutcome};

use crate::config::{ConfigError, ExitSection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyKind {
    BuyAndHold,
    StaggeredHold,
    TakeProfitTrailing,
    TrailingStop,
    StaggeredTrailing,
}

impl StrategyKind {
    pub const ALL: [Self; 5] = [
        Self::BuyAndHold,
        Self::StaggeredHold,
        Self::TakeProfitTrailing,
        Self::TrailingStop,
        Self::StaggeredTrailing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::BuyAndHold => "Basic Buy & Hold",
            Self::StaggeredHold => "Staggered Entry",
            Self::TakeProfitTrailing => "Take Profit + Trailing Stop",
            Self::TrailingStop => "Simple Trailing Stop",
            Self::StaggeredTrailing => "Staggered Entry + Trailing Stop",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One strategy applied to one signal. Prices are per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRow {
    pub signal_id: SignalId,
    pub ticker: String,
    pub strategy: StrategyKind,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub days_held: i64,
    pub is_win: bool,
    pub entry_description: String,
    pub exit_description: String,
    pub max_gain_pct: f64,
    pub max_drawdown_pct: f64,
}

/// Aggregate over a set of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    pub avg_return_pct: f64,
    pub avg_hold_days: f64,
    /// `avg_return * 365 / avg_hold_days`; zero without a holding period.
    pub annualized_return_pct: f64,
    pub total_return_pct: f64,
}

impl StrategyStats {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a StrategyRow>) -> Self {
        let mut stats = Self::default();
        let mut total_days = 0.0;
        for row in rows {
            stats.trades += 1;
            if row.is_win {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
            stats.total_return_pct += row.profit_loss_pct;
            total_days += row.days_held as f64;
        }
        if stats.trades == 0 {
            return stats;
        }
        let n = stats.trades as f64;
        stats.win_rate_pct = stats.wins as f64 / n * 100.0;
        stats.avg_return_pct = stats.total_return_pct / n;
        stats.avg_hold_days = total_days / n;
        if stats.avg_hold_days > 0.0 {
            stats.annualized_return_pct = stats.avg_return_pct * 365.0 / stats.avg_hold_days;
        }
        stats
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comparison {
    pub rows: Vec<StrategyRow>,
    /// Signals that could not be priced, with the reason.
    pub skipped: Vec<(SignalId, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub overall: StrategyStats,
    pub per_strategy: Vec<(StrategyKind, StrategyStats)>,
    pub best: Option<StrategyRow>,
    pub worst: Option<StrategyRow>,
    pub max_concurrent_signals: usize,
}

impl Comparison {
    pub fn rows_for(&self, strategy: StrategyKind) -> impl Iterator<Item = &StrategyRow> {
        self.rows.iter().filter(move |r| r.strategy == strategy)
    }

    pub fn summary(&self) -> ComparisonSummary {
        let per_strategy = StrategyKind::ALL
            .iter()
            .map(|&kind| (kind, StrategyStats::from_rows(self.rows_for(kind))))
            .filter(|(_, stats)| stats.trades > 0)
            .collect();

        let best = self
            .rows
            .iter()
            .max_by(|a, b| a.profit_loss_pct.total_cmp(&b.profit_loss_pct))
            .cloned();
        let worst = self
            .rows
            .iter()
            .min_by(|a, b| a.profit_loss_pct.total_cmp(&b.profit_loss_pct))
            .cloned();

        ComparisonSummary {
            overall: StrategyStats::from_rows(&self.rows),
            per_strategy,
            best,
            worst,
            max_concurrent_signals: max_concurrent(self.rows_for(StrategyKind::BuyAndHold)),
        }
    }
}

/// Peak number of overlapping holding windows. A window opening on the day
/// another closes counts as overlapping.
fn max_concurrent<'a>(rows: impl Iterator<Item = &'a StrategyRow>) -> usize {
    let mut events: Vec<(NaiveDate, i32)> = rows
        .flat_map(|r| [(r.buy_date, 1), (r.sell_date, -1)])
        .collect();
    // opens sort before closes on the same date
    events.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut current = 0i32;
    let mut peak = 0i32;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak.max(0) as usize
}

/// Replay every configured strategy for every signal.
///
/// Fails only when `exits` is out of range.
pub fn compare_strategies(
    signals: &[Signal],
    prices: &PriceHistory,
    exits: &ExitSection,
) -> Result<Comparison, ConfigError> {
    exits.validate()?;
    let evaluated: Vec<(&Signal, Result<Vec<StrategyRow>, String>)> = signals
        .par_iter()
        .map(|signal| (signal, evaluate_signal(signal, prices, exits)))
        .collect();

    let mut comparison = Comparison::default();
    for (signal, outcome) in evaluated {
        match outcome {
            Ok(rows) => comparison.rows.extend(rows),
            Err(reason) => {
                warn!(id = %signal.id, ticker = %signal.ticker, %reason, "signal skipped");
                comparison.skipped.push((signal.id.clone(), reason));
            }
        }
    }
    info!(
        rows = comparison.rows.len(),
        skipped = comparison.skipped.len(),
        "strategy comparison finished"
    );
    Ok(comparison)
}

fn price_on_or_after(prices: &PriceHistory, signal: &Signal, date: NaiveDate, retry: u32) -> Result<f64, String> {
    prices
        .quote_on_or_after(&signal.ticker, date, retry)
        .and_then(|(_, quote)| quote.price.to_f64())
        .ok_or_else(|| format!("no price for {} within {retry} days of {date}", signal.ticker))
}

fn evaluate_signal(signal: &Signal, prices: &PriceHistory, exits: &ExitSection) -> Result<Vec<StrategyRow>, String> {
    let buy = price_on_or_after(prices, signal, signal.buy_date, exits.quote_retry_days)?;
    let sell = price_on_or_after(prices, signal, signal.sell_date, exits.quote_retry_days)?;
    if buy <= 0.0 {
        return Err(format!("non-positive buy price {buy}"));
    }

    let closes = prices.closes_between(&signal.ticker, signal.buy_date, signal.sell_date);
    let window_end = signal.buy_date + Duration::days(i64::from(exits.entry_window_days));
    let entry_window = prices.closes_between(&signal.ticker, signal.buy_date, window_end);
    let days_held = (signal.sell_date - signal.buy_date).num_days();

    let row = |strategy: StrategyKind, entry: f64, exit_price: f64, entry_desc: String, exit_desc: String, path: &ExitOutcome| {
        let profit_loss = exit_price - entry;
        let profit_loss_pct = if entry > 0.0 { profit_loss / entry * 100.0 } else { 0.0 };
        StrategyRow {
            signal_id: signal.id.clone(),
            ticker: signal.ticker.clone(),
            strategy,
            buy_date: signal.buy_date,
            sell_date: signal.sell_date,
            entry_price: entry,
            exit_price,
            profit_loss,
            profit_loss_pct,
            days_held,
            is_win: profit_loss > 0.0,
            entry_description: entry_desc,
            exit_description: exit_desc,
            max_gain_pct: path.max_gain_pct,
            max_drawdown_pct: path.max_drawdown_pct,
        }
    };
    let full_entry = || "100% at buy date".to_string();
    let sell_at_date = || "sell at sell date".to_string();

    let mut rows = Vec::with_capacity(StrategyKind::ALL.len());

    let held = exits::hold(buy, &closes);
    rows.push(row(StrategyKind::BuyAndHold, buy, sell, full_entry(), sell_at_date(), &held));

    let staggered = exits.staggered();
    if let Some(strategy) = &staggered {
        let (dip, blended) = strategy.entry(buy, &entry_window);
        let path = exits::hold(blended, &closes);
        let desc = format!(
            "{:.0}% at buy date, {:.0}% {}",
            strategy.stagger_pct * 100.0,
            (1.0 - strategy.stagger_pct) * 100.0,
            dip.source
        );
        rows.push(row(StrategyKind::StaggeredHold, blended, sell, desc, sell_at_date(), &path));
    }

    if let Some(tp) = exits.take_profit() {
        let out = tp.replay(buy, &closes);
        rows.push(row(
            StrategyKind::TakeProfitTrailing,
            buy,
            out.exit_price,
            full_entry(),
            out.reason.to_string(),
            &out,
        ));
    }

    let out = exits.trailing_stop().replay(buy, &closes);
    rows.push(row(
        StrategyKind::TrailingStop,
        buy,
        out.exit_price,
        full_entry(),
        out.reason.to_string(),
        &out,
    ));

    if let Some(strategy) = &staggered {
        let out = strategy.replay(buy, &entry_window, &closes);
        let desc = format!(
            "{:.0}% at buy date, {:.0}% on dips ({})",
            strategy.stagger_pct * 100.0,
            (1.0 - strategy.stagger_pct) * 100.0,
            out.dip.source
        );
        rows.push(row(
            StrategyKind::StaggeredTrailing,
            out.entry_price,
            out.exit.exit_price,
            desc,
            out.exit.reason.to_string(),
            &out.exit,
        ));
    }

    Ok(rows)
}
