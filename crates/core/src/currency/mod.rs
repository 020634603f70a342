//! Currency normalization.
//!
//! - Immutable rate tables and the base / two-hop conversion rules
//! - A shared converter whose table is swapped atomically on refresh
//! - Periodic refresh driven by an external rate provider
//! - Glyph to ISO code lookup
//! - Splitting request totals between parties

pub mod allocation;
pub mod converter;
pub mod rates;
pub mod refresh;
pub mod symbols;

#[cfg(test)]
mod props;

pub use allocation::AllocationUtil;
pub use converter::CurrencyConverter;
pub use rates::RateTable;
pub use refresh::{RateProvider, RateRefresher, StaticRateProvider};
pub use symbols::{DEFAULT_CURRENCY, currency_symbol, resolve_currency_symbol};
