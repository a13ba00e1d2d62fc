//! Simple Moving Average (SMA).
//!
//! Mean of the most recent `period` closes. No value until a full window is
//! available.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// SMA over values given newest first, as read backwards from a series.
    pub fn from_recent<I>(&self, newest_first: I) -> Option<Decimal>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let mut sum = Decimal::ZERO;
        let mut count = 0usize;
        for close in newest_first.into_iter().take(self.period) {
            sum += close;
            count += 1;
        }
        (count == self.period).then(|| sum / Decimal::from(self.period))
    }
}

impl Default for Sma {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_needs_full_window() {
        let sma = Sma::new(3);
        assert_eq!(sma.from_recent([dec!(2), dec!(1)]), None);
        assert_eq!(sma.from_recent([dec!(4), dec!(3), dec!(2), dec!(1)]), Some(dec!(3)));
    }

    #[test]
    fn from_recent_reads_newest_first() {
        let sma = Sma::new(3);
        let closes = [dec!(10), dec!(11), dec!(12), dec!(16)];
        let backwards = closes.iter().rev().copied();
        assert_eq!(sma.from_recent(backwards), Some(dec!(13)));
        assert_eq!(sma.from_recent([dec!(1)]), None);
    }

    #[test]
    fn default_period_is_twenty() {
        assert_eq!(Sma::default().period(), 20);
    }

    #[test]
    #[should_panic(expected = "SMA period must be >= 1")]
    fn zero_period_panics() {
        Sma::new(0);
    }
}
