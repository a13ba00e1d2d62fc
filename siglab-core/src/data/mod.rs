//! Market data held in memory.
//!
//! [`PriceHistory`] stores daily closes per ticker and serves as both the
//! quote source and the market calendar for backtests and paper runs.

pub mod history;
pub mod sma;

pub use history::{PriceBar, PriceHistory};
pub use sma::Sma;
