//! Rate table lifecycle: one blocking initial load, then periodic refreshes.
//!
//! The core never talks to a rate provider itself. Whatever fetches rates
//! implements [`RateProvider`]; [`RateRefresher`] drives it and publishes the
//! results into a shared [`CurrencyConverter`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::converter::CurrencyConverter;
use super::rates::RateTable;
use crate::error::LedgerError;

/// Source of complete rate tables.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches a full table.
    async fn fetch(&self) -> Result<RateTable, LedgerError>;
}

/// Provider that always returns the same table.
///
/// Used for offline mode and in tests.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    table: RateTable,
}

impl StaticRateProvider {
    /// Creates a provider serving `table`.
    #[must_use]
    pub const fn new(table: RateTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn fetch(&self) -> Result<RateTable, LedgerError> {
        Ok(self.table.clone())
    }
}

/// Keeps a [`CurrencyConverter`] fed from a [`RateProvider`].
pub struct RateRefresher<P> {
    provider: Arc<P>,
    converter: Arc<CurrencyConverter>,
    interval: Duration,
}

impl<P: RateProvider + 'static> RateRefresher<P> {
    /// Fetches the first table and builds the converter from it.
    ///
    /// Nothing that needs conversion should run before this returns.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a zero refresh interval
    /// - Any error from the provider. There is no previous table to fall back on.
    pub async fn load_initial(provider: P, interval: Duration) -> Result<Self, LedgerError> {
        if interval.is_zero() {
            return Err(LedgerError::InvalidArgument(
                "rate refresh interval must be greater than zero".into(),
            ));
        }
        let table = provider.fetch().await?;
        info!(
            base = %table.base(),
            currencies = table.len(),
            fetched_at = %table.fetched_at(),
            "Loaded initial exchange rates"
        );
        Ok(Self {
            provider: Arc::new(provider),
            converter: Arc::new(CurrencyConverter::new(table)),
            interval,
        })
    }

    /// The converter this refresher publishes into.
    #[must_use]
    pub fn converter(&self) -> Arc<CurrencyConverter> {
        Arc::clone(&self.converter)
    }

    /// Fetches once and publishes the result.
    ///
    /// A failed fetch is logged and the previous table stays in place.
    /// Returns whether a new table was published.
    pub async fn refresh_once(&self) -> bool {
        refresh(self.provider.as_ref(), &self.converter).await
    }

    /// Spawns the periodic refresh task on the current tokio runtime.
    ///
    /// The first refresh happens one interval after spawning, the initial
    /// load already covers time zero. Abort the handle to stop refreshing.
    pub fn spawn(&self) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let converter = Arc::clone(&self.converter);
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                refresh(provider.as_ref(), &converter).await;
            }
        })
    }
}

async fn refresh<P: RateProvider + ?Sized>(provider: &P, converter: &CurrencyConverter) -> bool {
    match provider.fetch().await {
        Ok(table) => {
            converter.refresh_rates(table);
            true
        }
        Err(err) => {
            warn!(error = %err, "Exchange rate refresh failed, keeping previous table");
            false
        }
    }
}
