//! Trade — one executed lot belonging to a signal.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sell side of a lot, filled in when the owning signal exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeExit {
    pub sell_date: NaiveDate,
    pub sell_price: Decimal,
    pub proceeds: Decimal,
}

/// A single lot: the initial buy or one dip buy.
///
/// `cost` is always `quantity * buy_price`; the quantity is rounded down when
/// sized from an allocation so the cost never exceeds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    pub quantity: Decimal,
    pub cost: Decimal,
    #[serde(default)]
    pub exit: Option<TradeExit>,
}

impl Trade {
    pub fn open(buy_date: NaiveDate, buy_price: Decimal, quantity: Decimal) -> Self {
        Self {
            buy_date,
            buy_price,
            quantity,
            cost: quantity * buy_price,
            exit: None,
        }
    }

    /// Record the sell side. A lot closes once; later calls are ignored.
    pub fn close(&mut self, sell_date: NaiveDate, sell_price: Decimal) {
        if self.exit.is_some() {
            return;
        }
        self.exit = Some(TradeExit {
            sell_date,
            sell_price,
            proceeds: self.quantity * sell_price,
        });
    }

    pub fn is_closed(&self) -> bool {
        self.exit.is_some()
    }

    pub fn proceeds(&self) -> Option<Decimal> {
        self.exit.as_ref().map(|e| e.proceeds)
    }

    /// Realized P&L, `None` while open.
    pub fn profit_loss(&self) -> Option<Decimal> {
        self.proceeds().map(|p| p - self.cost)
    }

    /// Realized P&L as a percentage of cost.
    pub fn profit_loss_pct(&self) -> Option<Decimal> {
        let pnl = self.profit_loss()?;
        if self.cost.is_zero() {
            return Some(Decimal::ZERO);
        }
        Some(pnl / self.cost * Decimal::ONE_HUNDRED)
    }

    /// Calendar days between buy and sell.
    pub fn holding_days(&self) -> Option<i64> {
        self.exit
            .as_ref()
            .map(|e| (e.sell_date - self.buy_date).num_days())
    }
}
