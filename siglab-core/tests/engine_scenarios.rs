//! Scenario tests for the signal state machine driven over a price history.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use siglab_core::data::PriceHistory;
use siglab_core::domain::{Consumer, Signal, SignalId, SignalStatus};
use siglab_core::engine::{EngineConfig, SignalEngine};
use siglab_core::exits::{ExitReason, TrailingStop};
use siglab_core::ledger::Ledger;

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(n)
}

fn history(ticker: &str, closes: &[Decimal]) -> PriceHistory {
    let mut h = PriceHistory::new();
    for (i, c) in closes.iter().enumerate() {
        h.insert(ticker, day(i as i64), *c);
    }
    h
}

#[test]
fn half_weight_signal_without_sma_never_dips() {
    // GIVEN a 50% signal, $10,000 account and only eleven days of history
    let closes = [
        dec!(100), dec!(100), dec!(95), dec!(94), dec!(85), dec!(80),
        dec!(75), dec!(70), dec!(70), dec!(72), dec!(74),
    ];
    let prices = history("X", &closes);
    let ledger = Ledger::new(dec!(10000));
    let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
    let mut signals = vec![Signal::new(SignalId::new("a"), "X", day(0), day(10), dec!(50)).unwrap()];

    // WHEN every day is ticked
    let mut dips = 0;
    for n in 0..=10 {
        dips += engine.run_tick(&mut signals, day(n), &prices).unwrap().dip_buys();
    }

    // THEN the entry was $5,000 for 50 shares and no dip buy happened
    let s = &signals[0];
    let entry = s.initial_trade.as_ref().unwrap();
    assert_eq!(entry.cost, dec!(5000));
    assert_eq!(entry.quantity, dec!(50));
    assert_eq!(dips, 0);
    assert!(s.dip_trades.is_empty());
    assert_eq!(s.status, SignalStatus::Sold);
    assert_eq!(s.realized_pnl(), Some(dec!(-1300)));
}

#[test]
fn pullback_in_uptrend_adds_one_lot() {
    // GIVEN a steady climb to 120 over twenty days, then a sharp dip
    let mut closes: Vec<Decimal> = (0..20).map(|i| Decimal::from(100 + i)).collect();
    closes.extend([dec!(120), dec!(121), dec!(98), dec!(97), dec!(96), dec!(99), dec!(110)]);
    let prices = history("X", &closes);
    let ledger = Ledger::new(dec!(10000));
    let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
    // buy on day 5 at 105
    let mut signals = vec![Signal::new(SignalId::new("a"), "X", day(5), day(26), dec!(10)).unwrap()];

    // WHEN the whole history is replayed
    for n in 0..closes.len() as i64 {
        engine.run_tick(&mut signals, day(n), &prices).unwrap();
    }

    // THEN one dip lot was bought on day 22 at 98, sized like the first lot
    let s = &signals[0];
    assert_eq!(s.status, SignalStatus::Sold);
    assert_eq!(s.dip_trades.len(), 1);
    let dip = &s.dip_trades[0];
    assert_eq!(dip.buy_date, day(22));
    assert_eq!(dip.buy_price, dec!(98));
    let initial_cost = s.initial_trade.as_ref().unwrap().cost;
    assert!(dip.cost <= initial_cost);
    assert!(initial_cost - dip.cost < dec!(0.000001));
    // AND the running high reached 121
    assert_eq!(s.high_price, dec!(121));
}

#[test]
fn equal_oversubscribed_weights_each_get_half() {
    // GIVEN two signals at 60% each
    let mut prices = history("A", &[dec!(10)]);
    prices.insert("B", day(0), dec!(20));
    let ledger = Ledger::new(dec!(10000));
    let engine = SignalEngine::new(&ledger, EngineConfig::backtest());
    let mut signals = vec![
        Signal::new(SignalId::new("a"), "A", day(0), day(5), dec!(60)).unwrap(),
        Signal::new(SignalId::new("b"), "B", day(0), day(5), dec!(60)).unwrap(),
    ];

    // WHEN both enter on the same tick
    let report = engine.run_tick(&mut signals, day(0), &prices).unwrap();

    // THEN each received (60 / 120) of the account
    assert_eq!(report.entered(), 2);
    assert_eq!(signals[0].initial_trade.as_ref().unwrap().cost, dec!(5000));
    assert_eq!(signals[1].initial_trade.as_ref().unwrap().cost, dec!(5000));
}

#[test]
fn trailing_stop_scenario() {
    // GIVEN entry at 100 with a 15% trailing stop
    let stop = TrailingStop::new(0.15);

    // WHEN the path rallies to 120 and falls back
    let out = stop.replay(100.0, &[100.0, 120.0, 110.0, 101.0, 84.0]);

    // THEN the stop lifted to 102 and fired at 101
    assert_eq!(out.exit_index, Some(3));
    assert_eq!(out.exit_price, 101.0);
    assert_eq!(out.reason, ExitReason::TrailingStop);
    assert!((out.max_gain_pct - 20.0).abs() < 1e-9);
    assert_eq!(out.max_drawdown_pct, 0.0);
}

#[test]
fn live_flat_sizing_ignores_weights() {
    // GIVEN the live consumer with a flat $1,000 per signal
    let mut prices = history("A", &[dec!(50)]);
    prices.insert("B", day(0), dec!(25));
    let ledger = Ledger::new(dec!(10000));
    let engine = SignalEngine::new(&ledger, EngineConfig::live(dec!(1000)));
    let mut signals = vec![
        Signal::new(SignalId::new("a"), "A", day(0), day(5), dec!(90)).unwrap(),
        Signal::new(SignalId::new("b"), "B", day(0), day(5), dec!(5)).unwrap(),
    ];

    // WHEN both enter
    engine.run_tick(&mut signals, day(0), &prices).unwrap();

    // THEN both lots cost the same and report the live naming
    assert_eq!(signals[0].initial_trade.as_ref().unwrap().quantity, dec!(20));
    assert_eq!(signals[1].initial_trade.as_ref().unwrap().quantity, dec!(40));
    assert_eq!(Consumer::Live.status_label(signals[0].status), "BOUGHT");
    assert_eq!(ledger.cash(), dec!(8000));
}

#[test]
fn processing_order_is_by_id_not_input_position() {
    // GIVEN two 100% signals listed in reverse id order and cash for one
    let mut prices = history("A", &[dec!(10)]);
    prices.insert("B", day(0), dec!(10));
    let ledger = Ledger::new(dec!(1000));
    let engine = SignalEngine::new(&ledger, EngineConfig::live(dec!(1000)));
    let mut signals = vec![
        Signal::new(SignalId::new("zz"), "B", day(0), day(5), dec!(100)).unwrap(),
        Signal::new(SignalId::new("aa"), "A", day(0), day(5), dec!(100)).unwrap(),
    ];

    // WHEN the tick runs
    let report = engine.run_tick(&mut signals, day(0), &prices).unwrap();

    // THEN the lower id entered and the other was rejected for funds
    assert_eq!(report.transitions[0].0, SignalId::new("aa"));
    assert!(signals[1].is_active());
    assert!(signals[0].is_pending());
    assert_eq!(report.error_count(), 1);
}
