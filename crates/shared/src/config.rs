//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Exchange rate configuration.
    #[serde(default)]
    pub currency: CurrencyConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How a split request divides its total between the related parties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Every leg is `total / n`, rounded on its own. Legs may drift from the total.
    #[default]
    Even,
    /// Whole-unit largest remainder split. Legs always sum to the rounded total.
    Reconciled,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency every account and request is kept in.
    #[serde(default = "default_ledger_currency")]
    pub currency: String,
    /// Default number of entries returned by account history.
    #[serde(default = "default_list_limit")]
    pub history_limit: usize,
    /// Default number of requests returned per owner.
    #[serde(default = "default_list_limit")]
    pub request_limit: usize,
    /// Split policy for multi-party requests.
    #[serde(default)]
    pub split_policy: SplitPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_ledger_currency(),
            history_limit: default_list_limit(),
            request_limit: default_list_limit(),
            split_policy: SplitPolicy::default(),
        }
    }
}

fn default_ledger_currency() -> String {
    "USD".to_string()
}

fn default_list_limit() -> usize {
    5
}

/// Exchange rate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Base currency of the rate table.
    #[serde(default = "default_ledger_currency")]
    pub base: String,
    /// Seconds between two rate refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Skip remote rates and run with a single-currency table.
    #[serde(default)]
    pub offline: bool,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base: default_ledger_currency(),
            refresh_interval_secs: default_refresh_interval(),
            offline: false,
        }
    }
}

impl CurrencyConfig {
    /// Interval between two rate refreshes.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn default_refresh_interval() -> u64 {
    86_400 // 24 hours
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
