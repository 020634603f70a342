//! Shared types and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for accounts, transactions, and requests
//! - Opaque party and receipt identifiers
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, CurrencyConfig, DatabaseConfig, LedgerConfig, SplitPolicy};
