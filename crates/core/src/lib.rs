//! Core ledger logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence enters only through the [`ledger::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `currency` - Rate tables, conversion, refresh, and split allocation
//! - `ledger` - Pairwise accounts, balances, split requests, and history
//! - `tally` - One handle wiring every component over a shared store

pub mod currency;
pub mod error;
pub mod ledger;
pub mod tally;

pub use error::LedgerError;
pub use tally::{LedgerSettings, Tally};
