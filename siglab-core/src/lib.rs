//! siglab Core — signal lifecycle, ledger, allocation, dip buys, exit simulations.
//!
//! This crate contains everything both consumers (the offline backtester and
//! the live trading job) share:
//! - Domain types (signals, trades, quotes, allocation windows)
//! - In-memory ledger with weighted average cost per ticker
//! - Allocation engine (weighted and flat per-signal sizing)
//! - Dip-buy trigger with six independent conditions
//! - Per-tick signal state machine
//! - Exit-simulation replays (trailing stop, take profit, staggered entry)
//!
//! Market data, order execution and persistence are reached only through the
//! collaborator traits in [`market`].

pub mod allocation;
pub mod data;
pub mod dip;
pub mod domain;
pub mod engine;
pub mod exits;
pub mod ledger;
pub mod market;
