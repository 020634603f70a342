//! Balance mutation and the per-account transaction log.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, RequestId, TransactionId, UserId};
use tracing::info;

use super::store::LedgerStore;
use super::types::{Op, Posting, Transaction, round_amount};
use crate::error::LedgerError;

/// Applies transactions to accounts.
///
/// Every write is a single [`LedgerStore::post`], so the balance and its log
/// entry change together or not at all.
pub struct BalanceLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for BalanceLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> BalanceLedger<S> {
    /// Creates a ledger over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds or subtracts `amount` from the account's balance and logs it.
    ///
    /// The amount is rounded to whole units once, half away from zero.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative amount, `NotFound` for an unknown account.
    pub async fn apply_transaction(
        &self,
        account_id: AccountId,
        user_id: &UserId,
        op: Op,
        amount: Decimal,
        request_id: Option<RequestId>,
    ) -> Result<Transaction, LedgerError> {
        let rounded = round_amount(amount)?;
        let mut posting = Posting::apply(account_id, user_id.clone(), op, rounded);
        if let Some(request_id) = request_id {
            posting = posting.for_request(request_id);
        }
        let transaction = self.post_one(posting).await?;
        info!(
            account_id = %account_id,
            op = %op,
            amount = transaction.amount,
            "Applied transaction"
        );
        Ok(transaction)
    }

    /// Brings the balance to zero with one opposite-signed transaction.
    ///
    /// # Errors
    ///
    /// `NoOp` if the balance is already zero, `NotFound` for an unknown account.
    pub async fn settle(
        &self,
        account_id: AccountId,
        initiator: &UserId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self
            .post_one(Posting::settle(account_id, initiator.clone()).described("settled"))
            .await?;
        info!(
            account_id = %account_id,
            op = %transaction.op,
            amount = transaction.amount,
            initiator = %initiator,
            "Settled account"
        );
        Ok(transaction)
    }

    /// One entry of the account's log.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account has no such transaction.
    pub async fn get_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        self.store
            .get_transaction(account_id, transaction_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Transaction", transaction_id))
    }

    /// The account's full log in insertion order.
    ///
    /// Logs outlive their account, so this works for deleted accounts too.
    pub async fn transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.store.list_transactions(account_id).await
    }

    async fn post_one(&self, posting: Posting) -> Result<Transaction, LedgerError> {
        self.store
            .post(vec![posting], None)
            .await?
            .pop()
            .ok_or_else(|| LedgerError::Internal("store returned no transaction".into()))
    }
}
