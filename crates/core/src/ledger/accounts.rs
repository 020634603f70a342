//! Creation and lookup of pairwise accounts.

use std::sync::Arc;

use tally_shared::types::{AccountId, UserId};
use tracing::{debug, info};

use super::store::LedgerStore;
use super::types::Account;
use crate::currency::currency_symbol;
use crate::error::LedgerError;

/// Creates, finds, and removes pairwise accounts.
pub struct AccountRegistry<S> {
    store: Arc<S>,
    currency: String,
}

impl<S> Clone for AccountRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            currency: self.currency.clone(),
        }
    }
}

impl<S: LedgerStore> AccountRegistry<S> {
    /// New accounts are kept in `currency`.
    pub fn new(store: Arc<S>, currency: impl Into<String>) -> Self {
        Self {
            store,
            currency: currency.into().to_ascii_uppercase(),
        }
    }

    /// Creates a zero-balance account between `owner_id` and `related_id`.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the pair has an account in either orientation,
    /// `InvalidArgument` if both ids are the same party.
    pub async fn create(
        &self,
        owner_id: &UserId,
        related_id: &UserId,
    ) -> Result<Account, LedgerError> {
        if owner_id == related_id {
            return Err(LedgerError::InvalidArgument(format!(
                "cannot open an account between {owner_id} and themselves"
            )));
        }
        if self.find(owner_id, related_id).await?.is_some() {
            return Err(LedgerError::AlreadyExists(format!(
                "account between {owner_id} and {related_id}"
            )));
        }

        let account = Account::new(
            owner_id.clone(),
            related_id.clone(),
            self.currency.clone(),
            currency_symbol(&self.currency),
        );
        let account = self.store.insert_account(account).await?;
        info!(
            account_id = %account.id,
            owner_id = %account.owner_id,
            related_id = %account.related_id,
            "Created account"
        );
        Ok(account)
    }

    /// The account between the two parties, whichever of them is the stored owner.
    pub async fn find(&self, a: &UserId, b: &UserId) -> Result<Option<Account>, LedgerError> {
        let found = self.store.find_account_by_pair(a, b).await?;
        debug!(a = %a, b = %b, found = found.is_some(), "Account lookup");
        Ok(found)
    }

    /// Finds the pair's account, creating it with `owner_id` as owner on a miss.
    ///
    /// A concurrent creation of the same pair is resolved by finding again.
    pub async fn find_or_create(
        &self,
        owner_id: &UserId,
        related_id: &UserId,
    ) -> Result<Account, LedgerError> {
        if let Some(account) = self.find(owner_id, related_id).await? {
            return Ok(account);
        }
        match self.create(owner_id, related_id).await {
            Err(LedgerError::AlreadyExists(msg)) => self
                .find(owner_id, related_id)
                .await?
                .ok_or(LedgerError::AlreadyExists(msg)),
            other => other,
        }
    }

    /// Every account `user_id` is a party to.
    pub async fn find_all(&self, user_id: &UserId) -> Result<Vec<Account>, LedgerError> {
        self.store.list_accounts_for_user(user_id).await
    }

    /// Fetches an account by id.
    ///
    /// # Errors
    ///
    /// `NotFound` on a miss.
    pub async fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", id))
    }

    /// Whether an account with this id exists.
    pub async fn exists(&self, id: AccountId) -> Result<bool, LedgerError> {
        Ok(self.store.get_account(id).await?.is_some())
    }

    /// Removes the account record. Its transaction log stays readable by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such account exists.
    pub async fn delete(&self, id: AccountId) -> Result<(), LedgerError> {
        if !self.store.delete_account(id).await? {
            return Err(LedgerError::not_found("Account", id));
        }
        info!(account_id = %id, "Deleted account");
        Ok(())
    }
}
