//! Point-in-time market quote.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote for one ticker at one moment.
///
/// `price` is the last trade (or the session close in a backtest). `sma20`
/// is the 20-period simple moving average of closes; a missing or zero value
/// means the average is unavailable. `bid`/`ask` are optional: when absent,
/// both sides fill at `price`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    #[serde(default)]
    pub sma20: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
}

impl Quote {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            sma20: None,
            bid: None,
            ask: None,
        }
    }

    pub fn with_sma20(mut self, sma20: Decimal) -> Self {
        self.sma20 = Some(sma20);
        self
    }

    pub fn with_spread(mut self, bid: Decimal, ask: Decimal) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    /// A quote without a positive price cannot be traded against.
    pub fn is_usable(&self) -> bool {
        self.price > Decimal::ZERO
    }

    /// Price a buy fills at: the ask when quoted, otherwise the last price.
    pub fn entry_price(&self) -> Decimal {
        self.ask.filter(|a| *a > Decimal::ZERO).unwrap_or(self.price)
    }

    /// Price a sell fills at: the bid when quoted, otherwise the last price.
    pub fn exit_price(&self) -> Decimal {
        self.bid.filter(|b| *b > Decimal::ZERO).unwrap_or(self.price)
    }

    /// The 20-SMA when it carries information.
    pub fn usable_sma20(&self) -> Option<Decimal> {
        self.sma20.filter(|s| *s > Decimal::ZERO)
    }
}
