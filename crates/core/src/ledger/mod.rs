//! Pairwise ledger.
//!
//! This module implements the balance-keeping side of the core:
//! - Domain types for accounts, transactions, and split requests
//! - The storage seam and an in-memory store
//! - Account creation and lookup
//! - Atomic balance mutation with an append-only log
//! - Split request creation and amendment
//! - History and status projections

pub mod accounts;
pub mod balance;
pub mod history;
pub mod memory;
pub mod request;
pub mod store;
pub mod types;

#[cfg(test)]
mod service_props;

pub use accounts::AccountRegistry;
pub use balance::BalanceLedger;
pub use history::{HistoryView, OwesDirection, RenderedEntry, StatusEntry, StatusSummary};
pub use memory::MemoryStore;
pub use request::RequestEngine;
pub use store::LedgerStore;
pub use types::{
    Account, NewRequest, Op, Posting, PostingKind, Request, RequestPatch, Transaction,
    amount_from_f64, pair_key, record_timestamp, round_amount,
};
