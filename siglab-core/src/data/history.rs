//! In-memory daily close history.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::sma::Sma;
use crate::domain::Quote;
use crate::market::{MarketCalendar, MarketDataError, QuoteSource};

/// One daily close, the unit of CSV ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: Decimal,
}

/// Daily closes keyed by ticker, then date.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    series: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
    /// Ticker whose bars define open days. Any ticker counts when unset.
    reference: Option<String>,
    sma: Sma,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bars(bars: impl IntoIterator<Item = PriceBar>) -> Self {
        let mut history = Self::new();
        for bar in bars {
            history.insert(&bar.ticker, bar.date, bar.close);
        }
        history
    }

    pub fn with_reference(mut self, ticker: impl Into<String>) -> Self {
        self.reference = Some(ticker.into().to_ascii_uppercase());
        self
    }

    pub fn insert(&mut self, ticker: &str, date: NaiveDate, close: Decimal) {
        self.series
            .entry(ticker.to_ascii_uppercase())
            .or_default()
            .insert(date, close);
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.series_for(ticker).is_some()
    }

    pub fn bar_count(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    pub fn close(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        self.series_for(ticker)?.get(&date).copied()
    }

    /// Quote on exactly `date`, with the 20-SMA over closes up to and
    /// including that day.
    pub fn quote_at(&self, ticker: &str, date: NaiveDate) -> Option<Quote> {
        let series = self.series_for(ticker)?;
        let price = *series.get(&date)?;
        let sma = self.sma.from_recent(series.range(..=date).rev().map(|(_, c)| *c));
        Some(Quote {
            price,
            sma20: sma,
            bid: None,
            ask: None,
        })
    }

    /// First quote on `date` or within `max_days` after it.
    pub fn quote_on_or_after(&self, ticker: &str, date: NaiveDate, max_days: u32) -> Option<(NaiveDate, Quote)> {
        (0..=i64::from(max_days))
            .map(|offset| date + Duration::days(offset))
            .find_map(|day| self.quote_at(ticker, day).map(|q| (day, q)))
    }

    /// Closes in `[from, to]` as floats, for exit replays.
    pub fn closes_between(&self, ticker: &str, from: NaiveDate, to: NaiveDate) -> Vec<f64> {
        if from > to {
            return Vec::new();
        }
        self.series_for(ticker)
            .map(|series| {
                series
                    .range(from..=to)
                    .filter_map(|(_, close)| close.to_f64())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|s| s.keys().next().copied())
            .min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|s| s.keys().next_back().copied())
            .max()
    }

    /// Keys are stored uppercase; lookups accept any case.
    fn series_for(&self, ticker: &str) -> Option<&BTreeMap<NaiveDate, Decimal>> {
        match self.series.get(ticker) {
            Some(series) => Some(series),
            None if ticker.bytes().any(|b| b.is_ascii_lowercase()) => {
                self.series.get(&ticker.to_ascii_uppercase())
            }
            None => None,
        }
    }

    fn has_bar_on(&self, date: NaiveDate) -> bool {
        match &self.reference {
            Some(reference) => self
                .series
                .get(reference)
                .is_some_and(|s| s.contains_key(&date)),
            None => self.series.values().any(|s| s.contains_key(&date)),
        }
    }
}

impl QuoteSource for PriceHistory {
    fn quote(&self, ticker: &str, date: NaiveDate) -> Result<Option<Quote>, MarketDataError> {
        Ok(self.quote_at(ticker, date))
    }
}

impl MarketCalendar for PriceHistory {
    fn is_open(&self, date: NaiveDate) -> Result<bool, MarketDataError> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Ok(false);
        }
        Ok(self.has_bar_on(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// `n` consecutive weekday closes for "X" starting Mon 2024-01-01,
    /// priced 1, 2, 3, ...
    fn weekday_history(n: usize) -> (PriceHistory, Vec<NaiveDate>) {
        let mut history = PriceHistory::new();
        let mut dates = Vec::new();
        let mut day = d(2024, 1, 1);
        while dates.len() < n {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                history.insert("X", day, Decimal::from(dates.len() as i64 + 1));
                dates.push(day);
            }
            day += Duration::days(1);
        }
        (history, dates)
    }

    #[test]
    fn sma_absent_before_twenty_closes() {
        let (history, dates) = weekday_history(20);
        assert_eq!(history.quote_at("X", dates[18]).unwrap().sma20, None);
        // mean of 1..=20
        assert_eq!(history.quote_at("X", dates[19]).unwrap().sma20, Some(dec!(10.5)));
    }

    #[test]
    fn lookup_is_case_normalized_on_insert() {
        let mut history = PriceHistory::new();
        history.insert("aapl", d(2024, 1, 2), dec!(10));
        assert!(history.contains("AAPL"));
        assert_eq!(history.close("AAPL", d(2024, 1, 2)), Some(dec!(10)));
    }

    #[test]
    fn lookups_accept_any_case() {
        let mut history = PriceHistory::new();
        history.insert("AAPL", d(2024, 1, 2), dec!(10));
        history.insert("AAPL", d(2024, 1, 3), dec!(11));

        assert!(history.contains("aapl"));
        assert_eq!(history.close("Aapl", d(2024, 1, 3)), Some(dec!(11)));
        assert_eq!(history.quote_at("aapl", d(2024, 1, 2)).unwrap().price, dec!(10));
        assert_eq!(history.closes_between("aapl", d(2024, 1, 1), d(2024, 1, 5)), vec![10.0, 11.0]);
        assert_eq!(QuoteSource::quote(&history, "aapl", d(2024, 1, 3)).unwrap().unwrap().price, dec!(11));
        assert!(!history.contains("msft"));
    }

    #[test]
    fn quote_on_or_after_skips_gaps() {
        let mut history = PriceHistory::new();
        history.insert("X", d(2024, 1, 8), dec!(12));
        let (day, quote) = history.quote_on_or_after("X", d(2024, 1, 6), 10).unwrap();
        assert_eq!(day, d(2024, 1, 8));
        assert_eq!(quote.price, dec!(12));
        assert!(history.quote_on_or_after("X", d(2024, 1, 6), 1).is_none());
    }

    #[test]
    fn closes_between_is_inclusive() {
        let (history, dates) = weekday_history(5);
        assert_eq!(history.closes_between("X", dates[1], dates[3]), vec![2.0, 3.0, 4.0]);
        assert!(history.closes_between("X", dates[3], dates[1]).is_empty());
        assert!(history.closes_between("NOPE", dates[0], dates[4]).is_empty());
    }

    #[test]
    fn calendar_closes_weekends_and_gaps() {
        let mut history = PriceHistory::new();
        history.insert("X", d(2024, 1, 5), dec!(1)); // Friday
        history.insert("X", d(2024, 1, 6), dec!(1)); // Saturday bar is ignored
        assert!(history.is_open(d(2024, 1, 5)).unwrap());
        assert!(!history.is_open(d(2024, 1, 6)).unwrap());
        assert!(!history.is_open(d(2024, 1, 8)).unwrap());
    }

    #[test]
    fn calendar_follows_reference_ticker() {
        let mut history = PriceHistory::new().with_reference("spy");
        history.insert("X", d(2024, 1, 2), dec!(1));
        assert!(!history.is_open(d(2024, 1, 2)).unwrap());
        history.insert("SPY", d(2024, 1, 2), dec!(400));
        assert!(history.is_open(d(2024, 1, 2)).unwrap());
    }

    #[test]
    fn date_bounds_span_all_tickers() {
        let mut history = PriceHistory::new();
        history.insert("A", d(2024, 1, 3), dec!(1));
        history.insert("B", d(2024, 1, 2), dec!(1));
        history.insert("B", d(2024, 2, 2), dec!(1));
        assert_eq!(history.first_date(), Some(d(2024, 1, 2)));
        assert_eq!(history.last_date(), Some(d(2024, 2, 2)));
        assert_eq!(history.bar_count(), 3);
    }
}
