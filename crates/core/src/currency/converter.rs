//! Process-wide currency converter with atomic table replacement.

use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use tracing::info;

use super::rates::RateTable;
use crate::error::LedgerError;

/// Converts amounts using the currently published [`RateTable`].
///
/// Readers take a snapshot of the table and compute without holding the
/// lock, so a concurrent refresh is observed either fully or not at all.
#[derive(Debug)]
pub struct CurrencyConverter {
    table: RwLock<Arc<RateTable>>,
}

impl CurrencyConverter {
    /// Creates a converter publishing `table`.
    #[must_use]
    pub fn new(table: RateTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// The table in effect right now.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RateTable> {
        // The guarded value is a plain Arc swap, so a poisoned lock still holds a whole table.
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publishes a new table, replacing the old one wholesale.
    pub fn refresh_rates(&self, table: RateTable) {
        info!(
            base = %table.base(),
            currencies = table.len(),
            fetched_at = %table.fetched_at(),
            "Publishing exchange rate table"
        );
        let next = Arc::new(table);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Converts `amount` from `from` to `to` against the current table.
    ///
    /// # Errors
    ///
    /// `UnknownCurrency` if either code is not in the table.
    pub fn convert(&self, from: &str, to: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.snapshot().convert(from, to, amount)
    }
}
