//! Immutable exchange rate snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A complete rate table: every factor is "units of `code` per one unit of `base`".
///
/// Tables are validated on construction and never mutated afterwards; a
/// refresh publishes a whole new table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    base: String,
    rates: HashMap<String, Decimal>,
    fetched_at: DateTime<Utc>,
}

impl RateTable {
    /// Builds a table, upper-casing every code.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the base is missing from `rates` or any factor
    /// is zero or negative.
    pub fn new(
        base: impl AsRef<str>,
        rates: impl IntoIterator<Item = (String, Decimal)>,
    ) -> Result<Self, LedgerError> {
        let base = normalize_code(base.as_ref());
        let rates: HashMap<String, Decimal> = rates
            .into_iter()
            .map(|(code, factor)| (normalize_code(&code), factor))
            .collect();

        if let Some((code, factor)) = rates.iter().find(|(_, f)| **f <= Decimal::ZERO) {
            return Err(LedgerError::InvalidArgument(format!(
                "rate for {code} must be positive, got {factor}"
            )));
        }
        if !rates.contains_key(&base) {
            return Err(LedgerError::InvalidArgument(format!(
                "base currency {base} is missing from the rate table"
            )));
        }

        Ok(Self {
            base,
            rates,
            fetched_at: Utc::now(),
        })
    }

    /// Single-currency table used when remote rates are switched off.
    #[must_use]
    pub fn fixed_base(code: &str) -> Self {
        let base = normalize_code(code);
        let rates = HashMap::from([(base.clone(), Decimal::ONE)]);
        Self {
            base,
            rates,
            fetched_at: Utc::now(),
        }
    }

    /// Base currency code.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// When this table was built.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Factor for `code`, if present.
    #[must_use]
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(&normalize_code(code)).copied()
    }

    /// Whether `code` can be converted.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(&normalize_code(code))
    }

    /// Number of currencies in the table, base included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always false for a validated table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Converts `amount` from `from` to `to`.
    ///
    /// From the base the factor multiplies, into the base it divides. Any
    /// other pair goes through the base in two hops, so the error of both
    /// hops compounds. The result is not rounded.
    ///
    /// # Errors
    ///
    /// `UnknownCurrency` if either code is absent, `Internal` on overflow.
    pub fn convert(&self, from: &str, to: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
        let from = normalize_code(from);
        let to = normalize_code(to);
        let from_rate = self.require(&from)?;
        let to_rate = self.require(&to)?;

        if from == to {
            return Ok(amount);
        }
        if from == self.base {
            return amount.checked_mul(to_rate).ok_or_else(|| overflow(&from, &to));
        }
        if to == self.base {
            return amount.checked_div(from_rate).ok_or_else(|| overflow(&from, &to));
        }

        let intermediate = self.convert(&from, &self.base, amount)?;
        self.convert(&self.base, &to, intermediate)
    }

    fn require(&self, code: &str) -> Result<Decimal, LedgerError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| LedgerError::UnknownCurrency(code.to_string()))
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn overflow(from: &str, to: &str) -> LedgerError {
    LedgerError::Internal(format!("conversion overflow from {from} to {to}"))
}
