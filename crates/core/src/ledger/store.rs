//! Persistence seam for the ledger.
//!
//! The core components only talk to storage through [`LedgerStore`]. Every
//! balance write goes through [`LedgerStore::post`], which must apply all of
//! its postings and the optional request as one atomic unit.

use async_trait::async_trait;
use tally_shared::types::{AccountId, RequestId, TransactionId, UserId};

use super::types::{Account, Posting, Request, RequestPatch, Transaction};
use crate::error::LedgerError;

/// Storage for accounts, their transaction logs, and split requests.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new account.
    ///
    /// Fails with `AlreadyExists` if an account for the unordered pair exists.
    async fn insert_account(&self, account: Account) -> Result<Account, LedgerError>;

    /// Fetches an account by id.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Finds the account between `a` and `b` in either orientation.
    async fn find_account_by_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Account>, LedgerError>;

    /// Every account `user` is a party to, oldest first.
    async fn list_accounts_for_user(&self, user: &UserId) -> Result<Vec<Account>, LedgerError>;

    /// Removes the account row. Its transaction log is left in place.
    ///
    /// Returns whether a row was removed.
    async fn delete_account(&self, id: AccountId) -> Result<bool, LedgerError>;

    /// Applies postings and inserts `request`, all or nothing.
    ///
    /// Postings are resolved in order against the balance as seen under the
    /// store's lock, so two postings on one account compound. Returns the
    /// appended transactions in posting order.
    async fn post(
        &self,
        postings: Vec<Posting>,
        request: Option<Request>,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// The account's log in insertion order.
    async fn list_transactions(&self, account_id: AccountId)
    -> Result<Vec<Transaction>, LedgerError>;

    /// One entry of an account's log.
    async fn get_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Fetches a request by id.
    async fn get_request(&self, id: RequestId) -> Result<Option<Request>, LedgerError>;

    /// Fetches every request in `ids` that exists, in no particular order.
    async fn get_requests(&self, ids: &[RequestId]) -> Result<Vec<Request>, LedgerError>;

    /// Requests owned by `owner`, newest first, ties in insertion order.
    async fn list_requests_for_owner(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Request>, LedgerError>;

    /// Amends a request in place and returns the new state.
    ///
    /// Fails with `NotFound` if the request does not exist.
    async fn update_request(
        &self,
        id: RequestId,
        patch: RequestPatch,
    ) -> Result<Request, LedgerError>;
}
