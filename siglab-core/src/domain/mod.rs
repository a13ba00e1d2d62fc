//! Domain types for siglab

pub mod ids;
pub mod quote;
pub mod signal;
pub mod trade;
pub mod window;

pub use ids::SignalId;
pub use quote::Quote;
pub use signal::{Consumer, Signal, SignalStatus, SignalValidationError, TerminalAction};
pub use trade::{Trade, TradeExit};
pub use window::AllocationWindow;

/// Ticker type alias
pub type Ticker = String;
