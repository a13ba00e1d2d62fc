//! Backtest driver — replays signals day by day over a price history.
//!
//! The ledger opens with the initial deposit and receives the recurring
//! deposit on every open market day that falls on the configured weekday.
//! The loop runs from the earliest buy date to one day past the latest sell
//! date, skipping closed days. Signals still waiting on a missing quote at
//! that point get up to `quote_retry_days` more days.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use siglab_core::data::PriceHistory;
use siglab_core::domain::{Signal, Trade};
use siglab_core::engine::SignalEngine;
use siglab_core::ledger::{Ledger, LedgerSnapshot};
use siglab_core::market::MarketCalendar;

use crate::config::SiglabConfig;
use crate::error::RunError;

/// Account value after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub account_value: Decimal,
}

/// One closed lot, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub ticker: String,
    /// "Initial" or "Dip Buy N".
    pub lot: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub proceeds: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_pct: Decimal,
}

impl TradeRow {
    fn from_trade(ticker: &str, lot: String, trade: &Trade) -> Option<Self> {
        let exit = trade.exit.as_ref()?;
        Some(Self {
            ticker: ticker.to_string(),
            lot,
            buy_date: trade.buy_date,
            sell_date: exit.sell_date,
            buy_price: trade.buy_price,
            sell_price: exit.sell_price,
            quantity: trade.quantity,
            cost: trade.cost,
            proceeds: exit.proceeds,
            profit_loss: trade.profit_loss()?,
            profit_loss_pct: trade.profit_loss_pct()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub signals: Vec<Signal>,
    pub ledger: LedgerSnapshot,
    pub equity_curve: Vec<EquityPoint>,
    pub total_deposits: Decimal,
    pub ticks: usize,
    pub error_count: usize,
    pub missing_quote_count: usize,
}

impl BacktestResult {
    pub fn final_account_value(&self) -> Decimal {
        self.ledger.account_value()
    }

    /// Final account value minus everything deposited.
    pub fn profit_loss(&self) -> Decimal {
        self.final_account_value() - self.total_deposits
    }

    pub fn profit_loss_pct(&self) -> Decimal {
        if self.total_deposits.is_zero() {
            return Decimal::ZERO;
        }
        self.profit_loss() / self.total_deposits * Decimal::ONE_HUNDRED
    }

    /// Every closed lot, best P/L% first.
    pub fn trade_rows(&self) -> Vec<TradeRow> {
        let mut rows: Vec<TradeRow> = self
            .signals
            .iter()
            .filter(|s| s.is_terminal())
            .flat_map(|s| {
                let initial = s
                    .initial_trade
                    .iter()
                    .filter_map(|t| TradeRow::from_trade(&s.ticker, "Initial".to_string(), t));
                let dips = s
                    .dip_trades
                    .iter()
                    .enumerate()
                    .filter_map(|(i, t)| TradeRow::from_trade(&s.ticker, format!("Dip Buy {}", i + 1), t));
                initial.chain(dips).collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by(|a, b| b.profit_loss_pct.cmp(&a.profit_loss_pct));
        rows
    }

    pub fn pending(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.is_pending())
    }

    pub fn active(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.is_active())
    }
}

/// Run a full backtest.
pub fn run_backtest(
    mut signals: Vec<Signal>,
    prices: &PriceHistory,
    config: &SiglabConfig,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let settings = &config.backtest;

    let ledger = Ledger::new(settings.initial_deposit);
    let mut result = BacktestResult {
        signals: Vec::new(),
        ledger: LedgerSnapshot::default(),
        equity_curve: Vec::new(),
        total_deposits: settings.initial_deposit,
        ticks: 0,
        error_count: 0,
        missing_quote_count: 0,
    };

    let (Some(first_buy), Some(last_sell)) = (
        signals.iter().map(|s| s.buy_date).min(),
        signals.iter().map(|s| s.sell_date).max(),
    ) else {
        result.ledger = ledger.snapshot();
        return Ok(result);
    };

    let referenced;
    let calendar: &PriceHistory = match &settings.reference_ticker {
        Some(reference) => {
            referenced = prices.clone().with_reference(reference);
            &referenced
        }
        None => prices,
    };
    let engine = SignalEngine::new(&ledger, config.backtest_engine());
    let soft_end = last_sell + Duration::days(1);
    let hard_end = soft_end + Duration::days(i64::from(config.exits.quote_retry_days));

    info!(%first_buy, %last_sell, signals = signals.len(), "backtest started");

    let mut day = first_buy;
    while day <= hard_end {
        if day > soft_end && !signals.iter().any(|s| overdue(s, day)) {
            break;
        }
        if !calendar.is_open(day)? {
            day += Duration::days(1);
            continue;
        }

        if day.weekday() == settings.deposit_weekday && settings.recurring_deposit > Decimal::ZERO {
            ledger.deposit(settings.recurring_deposit)?;
            result.total_deposits += settings.recurring_deposit;
        }

        let report = engine
            .run_tick(&mut signals, day, prices)
            .map_err(|source| RunError::Tick { date: day, source })?;
        debug!(
            %day,
            entered = report.entered(),
            dip_buys = report.dip_buys(),
            exited = report.exited(),
            errors = report.error_count(),
            "tick"
        );
        result.ticks += 1;
        result.error_count += report.error_count();
        result.missing_quote_count += report.missing_quotes.len();
        result.equity_curve.push(EquityPoint {
            date: day,
            account_value: ledger.account_value(),
        });

        day += Duration::days(1);
    }

    result.ledger = ledger.snapshot();
    result.signals = signals;
    info!(
        ticks = result.ticks,
        errors = result.error_count,
        deposits = %result.total_deposits,
        account_value = %result.final_account_value(),
        "backtest finished"
    );
    Ok(result)
}

/// Pending past its buy date or active past its sell date.
fn overdue(signal: &Signal, day: NaiveDate) -> bool {
    (signal.is_pending() && day >= signal.buy_date) || (signal.is_active() && day >= signal.sell_date)
}
