//! siglab Runner — backtest driver, strategy comparison, live job, config, storage.
//!
//! Orchestrates the core state machine against concrete collaborators:
//! - [`backtest`] replays signals day by day over a [`PriceHistory`] with
//!   weekly deposits
//! - [`compare`] scores alternative exit strategies per signal
//! - [`live`] runs one tick of the trading job against a brokerage and a
//!   [`store::SignalStore`]
//! - [`data_loader`] and [`synthetic`] produce signals and prices
//! - [`report`] renders text reports and CSV exports
//!
//! [`PriceHistory`]: siglab_core::data::PriceHistory

pub mod backtest;
pub mod compare;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod live;
pub mod report;
pub mod store;
pub mod synthetic;

pub use backtest::{run_backtest, BacktestResult, EquityPoint, TradeRow};
pub use compare::{compare_strategies, Comparison, ComparisonSummary, StrategyKind, StrategyRow, StrategyStats};
pub use config::{ConfigError, SiglabConfig};
pub use data_loader::{load_prices, load_signals, LoadError};
pub use error::RunError;
pub use live::{run_live, LogNotifier, Notifier, RunReport};
pub use store::{JsonFileStore, MemoryStore, SignalStore, Snapshot, StoreError};
pub use synthetic::synthetic_history;
