//! Signal state machine — advances every signal once per tick.
//!
//! One tick is one trading day in a backtest or one invocation of the live
//! job. Work happens in three phases:
//!
//! 1. **Transitions** in ascending id order: pending signals whose buy date
//!    has arrived enter; active signals whose sell date has arrived exit.
//!    Entries run first so later sizing sees the new account state.
//! 2. **Dip buys** for signals that were already active when the tick began
//!    and are not exiting.
//! 3. **High-water update** for every active signal, after all transitions,
//!    so a same-day price cannot both trigger and invalidate a dip buy.
//!
//! A missing quote skips the signal until the next tick. A per-signal failure
//! (rejected order, position mismatch) is recorded in the [`TickReport`] and
//! the tick continues. Only a failing quote source aborts the tick.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::allocation::{self, Sizing};
use crate::dip::DipBuyRule;
use crate::domain::{Consumer, Quote, Signal, SignalId, SignalStatus, Trade};
use crate::ledger::LedgerError;
use crate::market::{Brokerage, MarketDataError, QuoteSource};

/// Failure of one signal within a tick. The signal keeps its prior state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("order for {ticker} rejected: {source}")]
    Order {
        ticker: String,
        #[source]
        source: LedgerError,
    },

    #[error("position mismatch for {ticker}: ledger holds {held}, trades total {required}")]
    PositionMismatch {
        ticker: String,
        held: Decimal,
        required: Decimal,
    },

    #[error("signal {0} is active without an initial trade")]
    MissingEntry(SignalId),

    #[error("allocation {allocation} buys no shares of {ticker} at {price}")]
    ZeroQuantity {
        ticker: String,
        allocation: Decimal,
        price: Decimal,
    },
}

/// Failure that aborts the whole tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("quote source failed: {0}")]
    MarketData(#[from] MarketDataError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered,
    DipBought,
    Exited,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub transitions: Vec<(SignalId, Transition)>,
    /// Signals that needed a quote and had none; retried next tick.
    pub missing_quotes: Vec<SignalId>,
    pub errors: Vec<(SignalId, SignalError)>,
}

impl TickReport {
    fn count(&self, kind: Transition) -> usize {
        self.transitions.iter().filter(|(_, t)| *t == kind).count()
    }

    pub fn entered(&self) -> usize {
        self.count(Transition::Entered)
    }

    pub fn dip_buys(&self) -> usize {
        self.count(Transition::DipBought)
    }

    pub fn exited(&self) -> usize {
        self.count(Transition::Exited)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Engine behavior that differs between consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub consumer: Consumer,
    pub sizing: Sizing,
    /// `None` disables dip buys.
    pub dip_rule: Option<DipBuyRule>,
    /// Decimal places kept when converting an allocation to shares.
    pub quantity_scale: u32,
}

impl EngineConfig {
    pub fn backtest() -> Self {
        Self {
            consumer: Consumer::Backtest,
            sizing: Sizing::Weighted,
            dip_rule: Some(DipBuyRule::default()),
            quantity_scale: 8,
        }
    }

    pub fn live(allocation_per_signal: Decimal) -> Self {
        Self {
            consumer: Consumer::Live,
            sizing: Sizing::Flat(allocation_per_signal),
            dip_rule: None,
            quantity_scale: 8,
        }
    }

    pub fn with_dip_rule(mut self, rule: Option<DipBuyRule>) -> Self {
        self.dip_rule = rule;
        self
    }

    pub fn with_quantity_scale(mut self, scale: u32) -> Self {
        self.quantity_scale = scale;
        self
    }
}

/// Caches one lookup per ticker for the duration of a tick.
struct TickQuotes<'q> {
    source: &'q dyn QuoteSource,
    date: NaiveDate,
    cache: HashMap<String, Option<Quote>>,
}

impl<'q> TickQuotes<'q> {
    fn new(source: &'q dyn QuoteSource, date: NaiveDate) -> Self {
        Self {
            source,
            date,
            cache: HashMap::new(),
        }
    }

    fn get(&mut self, ticker: &str) -> Result<Option<Quote>, MarketDataError> {
        if let Some(cached) = self.cache.get(ticker) {
            return Ok(*cached);
        }
        let quote = self.source.quote(ticker, self.date)?.filter(Quote::is_usable);
        self.cache.insert(ticker.to_string(), quote);
        Ok(quote)
    }
}

pub struct SignalEngine<'a> {
    broker: &'a dyn Brokerage,
    config: EngineConfig,
}

impl<'a> SignalEngine<'a> {
    pub fn new(broker: &'a dyn Brokerage, config: EngineConfig) -> Self {
        Self { broker, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance every signal by one tick on `date`.
    pub fn run_tick(
        &self,
        signals: &mut [Signal],
        date: NaiveDate,
        quotes: &dyn QuoteSource,
    ) -> Result<TickReport, TickError> {
        let mut report = TickReport::default();
        let mut quotes = TickQuotes::new(quotes, date);

        let mut order: Vec<usize> = (0..signals.len()).collect();
        order.sort_by(|&a, &b| signals[a].id.cmp(&signals[b].id));

        // Phase 1: transitions
        let mut dip_candidates = Vec::new();
        for &i in &order {
            match signals[i].status {
                SignalStatus::Pending if date >= signals[i].buy_date => {
                    let Some(quote) = quotes.get(&signals[i].ticker)? else {
                        debug!(id = %signals[i].id, ticker = %signals[i].ticker, %date, "no quote, entry deferred");
                        report.missing_quotes.push(signals[i].id.clone());
                        continue;
                    };
                    let allocation =
                        allocation::entry_allocation(self.config.sizing, &signals[i], signals, self.broker)
                            .map_err(|source| SignalError::Order {
                                ticker: signals[i].ticker.clone(),
                                source,
                            });
                    let outcome = allocation.and_then(|amount| self.enter(&mut signals[i], &quote, amount, date));
                    self.record(&mut report, &signals[i].id, outcome, Transition::Entered);
                }
                SignalStatus::Active if date >= signals[i].sell_date => {
                    let Some(quote) = quotes.get(&signals[i].ticker)? else {
                        debug!(id = %signals[i].id, ticker = %signals[i].ticker, %date, "no quote, exit deferred");
                        report.missing_quotes.push(signals[i].id.clone());
                        continue;
                    };
                    let outcome = self.exit(&mut signals[i], &quote, date);
                    self.record(&mut report, &signals[i].id, outcome, Transition::Exited);
                }
                SignalStatus::Active => dip_candidates.push(i),
                SignalStatus::Pending | SignalStatus::Sold => {}
            }
        }

        // Phase 2: dip buys
        if let Some(rule) = &self.config.dip_rule {
            for i in dip_candidates {
                let Some(quote) = quotes.get(&signals[i].ticker)? else {
                    continue;
                };
                if let Err(rejection) = rule.evaluate(&signals[i], &quote, date) {
                    debug!(id = %signals[i].id, ticker = %signals[i].ticker, %rejection, "dip buy skipped");
                    continue;
                }
                let outcome = self.dip_buy(&mut signals[i], &quote, date);
                self.record(&mut report, &signals[i].id, outcome, Transition::DipBought);
            }
        }

        // Phase 3: running highs
        for signal in signals.iter_mut().filter(|s| s.is_active()) {
            if let Some(quote) = quotes.get(&signal.ticker)? {
                signal.observe_price(quote.price);
            }
        }

        Ok(report)
    }

    fn record(
        &self,
        report: &mut TickReport,
        id: &SignalId,
        outcome: Result<(), SignalError>,
        kind: Transition,
    ) {
        match outcome {
            Ok(()) => report.transitions.push((id.clone(), kind)),
            Err(err) => {
                warn!(%id, error = %err, "signal processing failed");
                report.errors.push((id.clone(), err));
            }
        }
    }

    fn shares_for(&self, ticker: &str, allocation: Decimal, price: Decimal) -> Result<Decimal, SignalError> {
        let quantity = (allocation / price)
            .round_dp_with_strategy(self.config.quantity_scale, RoundingStrategy::ToZero);
        if quantity <= Decimal::ZERO {
            return Err(SignalError::ZeroQuantity {
                ticker: ticker.to_string(),
                allocation,
                price,
            });
        }
        Ok(quantity)
    }

    fn buy_lot(&self, ticker: &str, allocation: Decimal, quote: &Quote, date: NaiveDate) -> Result<Trade, SignalError> {
        let price = quote.entry_price();
        let quantity = self.shares_for(ticker, allocation, price)?;
        self.broker
            .buy(ticker, quantity, price)
            .map_err(|source| SignalError::Order {
                ticker: ticker.to_string(),
                source,
            })?;
        Ok(Trade::open(date, price, quantity))
    }

    fn enter(&self, signal: &mut Signal, quote: &Quote, allocation: Decimal, date: NaiveDate) -> Result<(), SignalError> {
        let trade = self.buy_lot(&signal.ticker, allocation, quote, date)?;
        info!(
            id = %signal.id,
            ticker = %signal.ticker,
            %date,
            price = %trade.buy_price,
            quantity = %trade.quantity,
            cost = %trade.cost,
            status = self.config.consumer.status_label(SignalStatus::Active),
            "entered"
        );
        signal.initial_trade = Some(trade);
        signal.status = SignalStatus::Active;
        Ok(())
    }

    fn dip_buy(&self, signal: &mut Signal, quote: &Quote, date: NaiveDate) -> Result<(), SignalError> {
        let allocation =
            allocation::dip_allocation(signal).ok_or_else(|| SignalError::MissingEntry(signal.id.clone()))?;
        let trade = self.buy_lot(&signal.ticker, allocation, quote, date)?;
        info!(
            id = %signal.id,
            ticker = %signal.ticker,
            %date,
            price = %trade.buy_price,
            quantity = %trade.quantity,
            lot = signal.dip_trades.len() + 1,
            "dip buy"
        );
        signal.dip_trades.push(trade);
        Ok(())
    }

    /// Sell every lot in one order; each lot's proceeds follow its own
    /// quantity.
    fn exit(&self, signal: &mut Signal, quote: &Quote, date: NaiveDate) -> Result<(), SignalError> {
        if signal.initial_trade.is_none() {
            return Err(SignalError::MissingEntry(signal.id.clone()));
        }
        let required = signal.total_quantity();
        let held = match self.broker.position(&signal.ticker) {
            Ok(position) => position.shares,
            Err(LedgerError::NoPosition(_)) => Decimal::ZERO,
            Err(source) => {
                return Err(SignalError::Order {
                    ticker: signal.ticker.clone(),
                    source,
                })
            }
        };
        if held < required {
            return Err(SignalError::PositionMismatch {
                ticker: signal.ticker.clone(),
                held,
                required,
            });
        }

        let price = quote.exit_price();
        let proceeds = self
            .broker
            .sell(&signal.ticker, required, price)
            .map_err(|source| SignalError::Order {
                ticker: signal.ticker.clone(),
                source,
            })?;
        for trade in signal.trades_mut() {
            trade.close(date, price);
        }
        signal.status = SignalStatus::Sold;
        info!(
            id = %signal.id,
            ticker = %signal.ticker,
            %date,
            price = %price,
            quantity = %required,
            proceeds = %proceeds,
            status = self.config.consumer.status_label(SignalStatus::Sold),
            "exited"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Fixed quotes keyed by (ticker, date).
    #[derive(Default)]
    struct Quotes(HashMap<(String, NaiveDate), Quote>);

    impl Quotes {
        fn set(&mut self, ticker: &str, date: NaiveDate, quote: Quote) {
            self.0.insert((ticker.to_string(), date), quote);
        }
    }

    impl QuoteSource for Quotes {
        fn quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<Quote>, MarketDataError> {
            Ok(self.0.get(&(ticker.to_string(), date)).copied())
        }
    }

    struct Broken;

    impl QuoteSource for Broken {
        fn quote(&self, _: &str, _: NaiveDate) -> Result<Option<Quote>, MarketDataError> {
            Err(MarketDataError::Unavailable("offline".into()))
        }
    }

    fn signal(id: &str, ticker: &str, buy: NaiveDate, sell: NaiveDate, weight: Decimal) -> Signal {
        Signal::new(SignalId::new(id), ticker, buy, sell, weight).unwrap()
    }

    // ── Entry ──

    #[test]
    fn pending_enters_on_buy_date() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(50))];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(100)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();

        assert_eq!(report.entered(), 1);
        let s = &signals[0];
        assert!(s.is_active());
        let trade = s.initial_trade.as_ref().unwrap();
        assert_eq!(trade.quantity, dec!(50));
        assert_eq!(trade.cost, dec!(5000));
        assert_eq!(s.high_price, dec!(100));
        assert_eq!(ledger.cash(), dec!(5000));
    }

    #[test]
    fn pending_before_buy_date_is_noop() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 5), d(2024, 1, 12), dec!(50))];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(100)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();

        assert!(report.transitions.is_empty());
        assert!(signals[0].is_pending());
    }

    #[test]
    fn missing_quote_defers_entry() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(50))];
        let mut quotes = Quotes::default();

        let report = engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();
        assert_eq!(report.missing_quotes, vec![SignalId::new("a")]);
        assert!(signals[0].is_pending());

        quotes.set("X", d(2024, 1, 3), Quote::new(dec!(100)));
        let report = engine.run_tick(&mut signals, d(2024, 1, 3), &quotes).unwrap();
        assert_eq!(report.entered(), 1);
        assert_eq!(signals[0].initial_trade.as_ref().unwrap().buy_date, d(2024, 1, 3));
    }

    #[test]
    fn quantity_rounds_down() {
        let ledger = Ledger::new(dec!(1000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest().with_quantity_scale(0));
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(100))];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(300)));

        engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();
        let trade = signals[0].initial_trade.as_ref().unwrap();
        assert_eq!(trade.quantity, dec!(3));
        assert_eq!(ledger.cash(), dec!(100));
    }

    #[test]
    fn oversubscribed_weights_split_account() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![
            signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(60)),
            signal("b", "Y", d(2024, 1, 2), d(2024, 1, 12), dec!(60)),
        ];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(10)));
        quotes.set("Y", d(2024, 1, 2), Quote::new(dec!(10)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();

        assert_eq!(report.entered(), 2);
        for s in &signals {
            assert_eq!(s.initial_trade.as_ref().unwrap().cost, dec!(5000));
        }
        assert_eq!(ledger.cash(), Decimal::ZERO);
    }

    #[test]
    fn rejected_entry_keeps_pending_and_continues() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::live(dec!(20000)));
        let mut signals = vec![
            signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(0)),
            signal("b", "Y", d(2024, 1, 2), d(2024, 1, 12), dec!(0)),
        ];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(10)));
        quotes.set("Y", d(2024, 1, 2), Quote::new(dec!(10)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();

        assert_eq!(report.error_count(), 2);
        assert!(matches!(
            report.errors[0].1,
            SignalError::Order {
                source: LedgerError::InsufficientFunds { .. },
                ..
            }
        ));
        assert!(signals.iter().all(Signal::is_pending));
    }

    #[test]
    fn source_failure_aborts_tick() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(50))];

        let err = engine.run_tick(&mut signals, d(2024, 1, 2), &Broken).unwrap_err();
        assert!(matches!(err, TickError::MarketData(_)));
    }

    // ── Exit ──

    #[test]
    fn exit_sells_all_lots_at_one_price() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(50))];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(100)));
        quotes.set("X", d(2024, 1, 12), Quote::new(dec!(110)));

        engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();
        let report = engine.run_tick(&mut signals, d(2024, 1, 12), &quotes).unwrap();

        assert_eq!(report.exited(), 1);
        let s = &signals[0];
        assert_eq!(s.status, SignalStatus::Sold);
        assert_eq!(s.realized_pnl(), Some(dec!(500)));
        assert!(ledger.position("X").is_none());
        assert_eq!(ledger.account_value(), dec!(10500));
    }

    #[test]
    fn exit_fails_on_position_mismatch() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut s = signal("a", "X", d(2024, 1, 2), d(2024, 1, 12), dec!(50));
        s.status = SignalStatus::Active;
        s.initial_trade = Some(Trade::open(d(2024, 1, 2), dec!(100), dec!(5)));
        let mut signals = vec![s];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 12), Quote::new(dec!(110)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 12), &quotes).unwrap();

        assert_eq!(
            report.errors[0].1,
            SignalError::PositionMismatch {
                ticker: "X".into(),
                held: Decimal::ZERO,
                required: dec!(5),
            }
        );
        assert!(signals[0].is_active());
    }

    #[test]
    fn exit_uses_bid_when_quoted() {
        let ledger = Ledger::new(dec!(1000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 1, 3), dec!(100))];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(10)).with_spread(dec!(9), dec!(10)));
        quotes.set("X", d(2024, 1, 3), Quote::new(dec!(12)).with_spread(dec!(11), dec!(13)));

        engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();
        engine.run_tick(&mut signals, d(2024, 1, 3), &quotes).unwrap();

        let exit = signals[0].initial_trade.as_ref().unwrap().exit.clone().unwrap();
        assert_eq!(exit.sell_price, dec!(11));
        assert_eq!(exit.proceeds, dec!(1100));
    }

    // ── Dip ──

    /// Active signal bought at 100 with high 120 and 10 shares held.
    fn dip_setup(ledger: &Ledger) -> Vec<Signal> {
        ledger.buy("X", dec!(10), dec!(100)).unwrap();
        let mut s = signal("a", "X", d(2024, 1, 2), d(2024, 3, 1), dec!(50));
        s.status = SignalStatus::Active;
        s.initial_trade = Some(Trade::open(d(2024, 1, 2), dec!(100), dec!(10)));
        s.high_price = dec!(120);
        vec![s]
    }

    #[test]
    fn dip_buy_reuses_initial_cost() {
        let ledger = Ledger::new(dec!(5000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = dip_setup(&ledger);
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 10), Quote::new(dec!(80)).with_sma20(dec!(105)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 10), &quotes).unwrap();

        assert_eq!(report.dip_buys(), 1);
        let dip = &signals[0].dip_trades[0];
        assert_eq!(dip.quantity, dec!(12.5));
        assert_eq!(dip.cost, dec!(1000));
        assert_eq!(ledger.position("X").unwrap().shares, dec!(22.5));
        // high is unchanged by a lower price
        assert_eq!(signals[0].high_price, dec!(120));
    }

    #[test]
    fn dip_rule_disabled_in_live_default() {
        let ledger = Ledger::new(dec!(5000));
        let engine = SignalEngine::new(&ledger, EngineConfig::live(dec!(1000)));
        let mut signals = dip_setup(&ledger);
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 10), Quote::new(dec!(80)).with_sma20(dec!(105)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 10), &quotes).unwrap();
        assert_eq!(report.dip_buys(), 0);
    }

    #[test]
    fn same_tick_entry_is_not_dip_evaluated() {
        let ledger = Ledger::new(dec!(10000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = vec![signal("a", "X", d(2024, 1, 2), d(2024, 3, 1), dec!(10))];
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 2), Quote::new(dec!(80)).with_sma20(dec!(105)));

        let report = engine.run_tick(&mut signals, d(2024, 1, 2), &quotes).unwrap();
        assert_eq!(report.entered(), 1);
        assert_eq!(report.dip_buys(), 0);
    }

    #[test]
    fn high_updates_after_transitions() {
        let ledger = Ledger::new(dec!(5000));
        let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
        let mut signals = dip_setup(&ledger);
        let mut quotes = Quotes::default();
        quotes.set("X", d(2024, 1, 10), Quote::new(dec!(130)).with_sma20(dec!(105)));

        engine.run_tick(&mut signals, d(2024, 1, 10), &quotes).unwrap();
        assert_eq!(signals[0].high_price, dec!(130));
    }
}
