//! Synthetic daily closes for demo runs without a price file.
//!
//! Each ticker gets a deterministic random walk seeded from its name, so the
//! same ticker always produces the same path. Weekends have no bars.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use siglab_core::data::PriceHistory;

/// Generate weekday closes for every ticker over `[start, end]`.
pub fn synthetic_history<'a>(
    tickers: impl IntoIterator<Item = &'a str>,
    start: NaiveDate,
    end: NaiveDate,
) -> PriceHistory {
    let mut history = PriceHistory::new();
    for ticker in tickers {
        for (date, close) in random_walk(ticker, start, end) {
            history.insert(ticker, date, close);
        }
    }
    warn!("using synthetic prices; results are not market data");
    history
}

fn random_walk(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, Decimal)> {
    let seed: [u8; 32] = *blake3::hash(ticker.to_ascii_uppercase().as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut closes = Vec::new();
    let mut price = rng.gen_range(20.0..200.0_f64);
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            let daily_return: f64 = rng.gen_range(-0.03..0.031);
            price = (price * (1.0 + daily_return)).max(1.0);
            if let Some(close) = Decimal::from_f64(price) {
                closes.push((current, close.round_dp(2)));
            }
        }
        current += Duration::days(1);
    }
    closes
}

#[cfg(test)]
mod tests {
    use super::*;
    use siglab_core::market::MarketCalendar;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekdays_only() {
        let history = synthetic_history(["SPY"], d(2024, 1, 1), d(2024, 1, 14));
        assert_eq!(history.bar_count(), 10);
        assert!(history.close("SPY", d(2024, 1, 6)).is_none());
        assert!(history.is_open(d(2024, 1, 5)).unwrap());
    }

    #[test]
    fn deterministic_per_ticker() {
        let a = synthetic_history(["AAPL"], d(2024, 1, 1), d(2024, 3, 1));
        let b = synthetic_history(["aapl"], d(2024, 1, 1), d(2024, 3, 1));
        assert_eq!(
            a.closes_between("AAPL", d(2024, 1, 1), d(2024, 3, 1)),
            b.closes_between("AAPL", d(2024, 1, 1), d(2024, 3, 1))
        );
    }

    #[test]
    fn prices_stay_positive() {
        let history = synthetic_history(["X"], d(2020, 1, 1), d(2023, 1, 1));
        assert!(history
            .closes_between("X", d(2020, 1, 1), d(2023, 1, 1))
            .iter()
            .all(|c| *c >= 1.0));
    }
}
