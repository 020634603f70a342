//! Wiring of the core components over one shared store.

use std::sync::Arc;

use tally_shared::config::LedgerConfig;
use tally_shared::SplitPolicy;
use tally_shared::types::{AccountId, UserId};

use crate::currency::{CurrencyConverter, currency_symbol};
use crate::error::LedgerError;
use crate::ledger::{
    AccountRegistry, BalanceLedger, HistoryView, LedgerStore, RenderedEntry, Request,
    RequestEngine,
};

/// Ledger-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// ISO code every account is kept in.
    pub currency: String,
    /// Glyph for `currency`.
    pub currency_symbol: String,
    /// Default history length.
    pub history_limit: usize,
    /// Default number of requests listed per owner.
    pub request_limit: usize,
    /// How request totals are split.
    pub split_policy: SplitPolicy,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        let currency = config.currency.trim().to_ascii_uppercase();
        Self {
            currency_symbol: currency_symbol(&currency).to_string(),
            currency,
            history_limit: config.history_limit,
            request_limit: config.request_limit,
            split_policy: config.split_policy,
        }
    }
}

/// The ledger core: every component, sharing one store and one converter.
///
/// Cheap to clone; clones share state.
pub struct Tally<S> {
    /// Account creation and lookup.
    pub accounts: AccountRegistry<S>,
    /// Balance mutation.
    pub ledger: BalanceLedger<S>,
    /// Split requests.
    pub requests: RequestEngine<S>,
    /// Read projections.
    pub history: HistoryView<S>,
    converter: Arc<CurrencyConverter>,
    settings: LedgerSettings,
}

impl<S> Clone for Tally<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            ledger: self.ledger.clone(),
            requests: self.requests.clone(),
            history: self.history.clone(),
            converter: Arc::clone(&self.converter),
            settings: self.settings.clone(),
        }
    }
}

impl<S: LedgerStore> Tally<S> {
    /// Builds every component over `store`.
    pub fn new(
        store: Arc<S>,
        converter: Arc<CurrencyConverter>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            accounts: AccountRegistry::new(Arc::clone(&store), settings.currency.clone()),
            ledger: BalanceLedger::new(Arc::clone(&store)),
            requests: RequestEngine::new(
                Arc::clone(&store),
                Arc::clone(&converter),
                settings.currency.clone(),
                settings.split_policy,
            ),
            history: HistoryView::new(store),
            converter,
            settings,
        }
    }

    /// The shared converter.
    #[must_use]
    pub fn converter(&self) -> &Arc<CurrencyConverter> {
        &self.converter
    }

    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Account history with the configured default length.
    pub async fn recent_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<RenderedEntry>, LedgerError> {
        self.history
            .list_account_history(account_id, self.settings.history_limit)
            .await
    }

    /// The owner's requests with the configured default count.
    pub async fn recent_requests(&self, owner_id: &UserId) -> Result<Vec<Request>, LedgerError> {
        self.requests
            .get_requests_for_owner(owner_id, self.settings.request_limit)
            .await
    }
}
