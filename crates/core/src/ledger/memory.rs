//! In-process [`LedgerStore`].
//!
//! All state sits behind one mutex, so every call is trivially atomic. `post`
//! resolves every posting against a scratch copy of the balances and only
//! writes back once all of them succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tally_shared::types::{AccountId, RequestId, TransactionId, UserId};

use super::store::LedgerStore;
use super::types::{Account, Posting, Request, RequestPatch, Transaction, pair_key};
use crate::error::LedgerError;

#[derive(Debug, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    pairs: HashMap<String, AccountId>,
    account_order: Vec<AccountId>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
    requests: Vec<Request>,
}

/// Ledger store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Every write is validated before it mutates, so a poisoned guard
        // still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_account(&self, account: Account) -> Result<Account, LedgerError> {
        let mut state = self.lock();
        let key = account.pair_key();
        if state.pairs.contains_key(&key) {
            return Err(LedgerError::AlreadyExists(format!(
                "account between {} and {}",
                account.owner_id, account.related_id
            )));
        }
        if state.accounts.contains_key(&account.id) {
            return Err(LedgerError::AlreadyExists(format!("account {}", account.id)));
        }

        state.pairs.insert(key, account.id);
        state.account_order.push(account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.lock().accounts.get(&id).cloned())
    }

    async fn find_account_by_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Account>, LedgerError> {
        let state = self.lock();
        Ok(state
            .pairs
            .get(&pair_key(a, b))
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn list_accounts_for_user(&self, user: &UserId) -> Result<Vec<Account>, LedgerError> {
        let state = self.lock();
        Ok(state
            .account_order
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .filter(|account| account.involves(user))
            .cloned()
            .collect())
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, LedgerError> {
        let mut state = self.lock();
        let Some(account) = state.accounts.remove(&id) else {
            return Ok(false);
        };
        state.pairs.remove(&account.pair_key());
        state.account_order.retain(|known| *known != id);
        Ok(true)
    }

    async fn post(
        &self,
        postings: Vec<Posting>,
        request: Option<Request>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut state = self.lock();

        if let Some(request) = &request
            && state.requests.iter().any(|known| known.id == request.id)
        {
            return Err(LedgerError::AlreadyExists(format!("request {}", request.id)));
        }

        // Resolve against scratch balances; nothing is written until all succeed.
        let mut balances: HashMap<AccountId, i64> = HashMap::new();
        let mut appended = Vec::with_capacity(postings.len());
        for posting in &postings {
            let current = match balances.get(&posting.account_id) {
                Some(balance) => *balance,
                None => {
                    state
                        .accounts
                        .get(&posting.account_id)
                        .ok_or_else(|| LedgerError::not_found("Account", posting.account_id))?
                        .balance
                }
            };
            let (transaction, next) = posting.resolve(current)?;
            balances.insert(posting.account_id, next);
            appended.push(transaction);
        }

        for (account_id, balance) in balances {
            if let Some(account) = state.accounts.get_mut(&account_id) {
                account.balance = balance;
            }
        }
        for transaction in &appended {
            state
                .transactions
                .entry(transaction.account_id)
                .or_default()
                .push(transaction.clone());
        }
        if let Some(request) = request {
            state.requests.push(request);
        }

        Ok(appended)
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .lock()
            .transactions
            .get(&account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.lock().transactions.get(&account_id).and_then(|log| {
            log.iter()
                .find(|transaction| transaction.id == transaction_id)
                .cloned()
        }))
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<Request>, LedgerError> {
        Ok(self
            .lock()
            .requests
            .iter()
            .find(|request| request.id == id)
            .cloned())
    }

    async fn get_requests(&self, ids: &[RequestId]) -> Result<Vec<Request>, LedgerError> {
        Ok(self
            .lock()
            .requests
            .iter()
            .filter(|request| ids.contains(&request.id))
            .cloned()
            .collect())
    }

    async fn list_requests_for_owner(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Request>, LedgerError> {
        let state = self.lock();
        let mut owned: Vec<Request> = state
            .requests
            .iter()
            .filter(|request| request.owner_id == *owner)
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn update_request(
        &self,
        id: RequestId,
        patch: RequestPatch,
    ) -> Result<Request, LedgerError> {
        let mut state = self.lock();
        let request = state
            .requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| LedgerError::not_found("Request", id))?;
        request.apply(&patch);
        Ok(request.clone())
    }
}
