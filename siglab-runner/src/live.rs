//! Live trading job — one invocation advances every stored signal by one tick.
//!
//! A run loads the snapshot, refreshes the allocation window, ticks every
//! pending and bought signal at the window's flat per-signal amount, drops
//! completed signals, writes the snapshot back in one batch, and hands a
//! completion report to the notifier.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use siglab_core::allocation;
use siglab_core::domain::{AllocationWindow, Consumer, TerminalAction};
use siglab_core::engine::SignalEngine;
use siglab_core::ledger::LedgerError;
use siglab_core::market::{Brokerage, QuoteSource};

use crate::config::SiglabConfig;
use crate::error::RunError;
use crate::store::{SignalStore, Snapshot};

/// Aggregate outcome of one live run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub date: NaiveDate,
    /// Signals ticked without error.
    pub processed: usize,
    pub errors: usize,
    pub entered: usize,
    pub dip_buys: usize,
    pub exited: usize,
    /// Signals deferred to the next run for lack of a quote.
    pub missing_quotes: usize,
    /// Read after the snapshot is saved; `None` when the brokerage could
    /// not report it.
    pub account_value: Option<Decimal>,
    pub cash: Option<Decimal>,
    /// Pending and bought signals written back to the store.
    pub remaining_signals: usize,
    pub window: Option<AllocationWindow>,
}

/// Outbound notifications for the live job.
pub trait Notifier {
    /// A stage of the run, or a single signal, failed.
    fn error(&self, stage: &str, message: &str);

    /// The run finished and the snapshot was saved.
    fn completed(&self, report: &RunReport);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, stage: &str, message: &str) {
        warn!(stage, message, "live run error");
    }

    fn completed(&self, report: &RunReport) {
        info!(
            date = %report.date,
            processed = report.processed,
            errors = report.errors,
            account_value = ?report.account_value,
            cash = ?report.cash,
            signals = report.remaining_signals,
            "live run completed"
        );
    }
}

/// Run the live job once for `today`.
///
/// Per-signal failures are counted and notified; load, window refresh and
/// save failures abort the run before anything further is persisted.
pub fn run_live<S: SignalStore + ?Sized>(
    store: &S,
    broker: &dyn Brokerage,
    quotes: &dyn QuoteSource,
    notifier: &dyn Notifier,
    today: NaiveDate,
    config: &SiglabConfig,
) -> Result<RunReport, RunError> {
    config.validate()?;
    let live = &config.live;

    let snapshot = store.load().map_err(|e| report_failure(notifier, "Data Load", e))?;
    let mut signals: Vec<_> = snapshot.signals.into_iter().filter(|s| !s.is_terminal()).collect();
    info!(%today, signals = signals.len(), "live run started");

    let window = allocation::refresh_window(
        snapshot.window,
        today,
        live.max_signals_per_window,
        live.window_duration_days,
        || broker.account_value(),
    )
    .map_err(|e| report_failure(notifier, "Allocation Window", e))?;

    // An empty account opens a window worth nothing per signal.
    let usable = Some(&window).filter(|w| w.allocation_per_signal > Decimal::ZERO);
    let amount = allocation::flat_amount(usable, live.default_allocation);

    let engine = SignalEngine::new(broker, config.live_engine(amount));
    let tick = engine
        .run_tick(&mut signals, today, quotes)
        .map_err(|source| RunError::Tick { date: today, source })
        .map_err(|e| report_failure(notifier, "Market Data", e))?;

    for (id, error) in &tick.errors {
        warn!(%id, %error, "signal failed");
        notifier.error("Signal Processing", &format!("signal {id}: {error}"));
    }

    let ticked = signals.len();
    if Consumer::Live.terminal_action() == TerminalAction::Delete {
        signals.retain(|s| !s.is_terminal());
    }

    let remaining = signals.len();
    let saved = Snapshot {
        signals,
        window: Some(window.clone()),
        ..Snapshot::default()
    };
    store.save(&saved).map_err(|e| report_failure(notifier, "Data Save", e))?;

    let report = RunReport {
        date: today,
        processed: ticked - tick.error_count(),
        errors: tick.error_count(),
        entered: tick.entered(),
        dip_buys: tick.dip_buys(),
        exited: tick.exited(),
        missing_quotes: tick.missing_quotes.len(),
        account_value: balance("account value", broker.account_value()),
        cash: balance("cash", broker.cash()),
        remaining_signals: remaining,
        window: Some(window),
    };
    notifier.completed(&report);
    Ok(report)
}

/// The run has already been persisted, so a failed balance read only blanks
/// the report field.
fn balance(field: &str, read: Result<Decimal, LedgerError>) -> Option<Decimal> {
    read.map_err(|error| warn!(field, %error, "balance unavailable for run report"))
        .ok()
}

fn report_failure<E: std::fmt::Display>(notifier: &dyn Notifier, stage: &str, error: E) -> E {
    notifier.error(stage, &error.to_string());
    error
}
