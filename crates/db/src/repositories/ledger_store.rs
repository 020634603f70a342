//! Postgres implementation of the ledger store.
//!
//! Balance writes lock every touched account row with `SELECT ... FOR UPDATE`
//! in id order, then apply postings, append log rows, and insert the request
//! inside one database transaction. Any error drops the transaction, which
//! rolls it back.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tally_core::LedgerError;
use tally_core::ledger::{
    Account, LedgerStore, Posting, Request, RequestPatch, Transaction, pair_key,
};
use tally_shared::types::{AccountId, RequestId, TransactionId, UserId};
use tracing::debug;

use super::convert::{
    account_from_row, account_to_row, db_err, request_from_row, request_to_row,
    transaction_from_row, transaction_to_row,
};
use crate::entities::{accounts, ledger_requests, ledger_transactions};

/// Ledger store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a new store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_account(&self, account: Account) -> Result<Account, LedgerError> {
        account_to_row(&account)
            .insert(&self.db)
            .await
            .map_err(|err| match db_err(err) {
                LedgerError::AlreadyExists(_) => LedgerError::AlreadyExists(format!(
                    "account between {} and {}",
                    account.owner_id, account.related_id
                )),
                other => other,
            })?;
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(account_from_row)
            .transpose()
    }

    async fn find_account_by_pair(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::PairKey.eq(pair_key(a, b)))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(account_from_row)
            .transpose()
    }

    async fn list_accounts_for_user(&self, user: &UserId) -> Result<Vec<Account>, LedgerError> {
        accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::OwnerId.eq(user.as_str()))
                    .add(accounts::Column::RelatedId.eq(user.as_str())),
            )
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(account_from_row)
            .collect()
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, LedgerError> {
        let result = accounts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn post(
        &self,
        postings: Vec<Posting>,
        request: Option<Request>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // Lock in id order so concurrent posts cannot deadlock.
        let mut account_ids: Vec<AccountId> = postings.iter().map(|p| p.account_id).collect();
        account_ids.sort_unstable();
        account_ids.dedup();

        let mut balances: HashMap<AccountId, i64> = HashMap::with_capacity(account_ids.len());
        for account_id in &account_ids {
            let row = accounts::Entity::find_by_id(account_id.into_inner())
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or_else(|| LedgerError::not_found("Account", account_id))?;
            balances.insert(*account_id, row.balance);
        }

        let mut appended = Vec::with_capacity(postings.len());
        for posting in &postings {
            let current = balances
                .get(&posting.account_id)
                .copied()
                .ok_or_else(|| LedgerError::Internal("posting account was not locked".into()))?;
            let (transaction, next) = posting.resolve(current)?;
            transaction_to_row(&transaction)
                .insert(&txn)
                .await
                .map_err(db_err)?;
            balances.insert(posting.account_id, next);
            appended.push(transaction);
        }

        for (account_id, balance) in &balances {
            accounts::ActiveModel {
                id: Set(account_id.into_inner()),
                balance: Set(*balance),
                ..Default::default()
            }
            .update(&txn)
            .await
            .map_err(db_err)?;
        }

        if let Some(request) = &request {
            request_to_row(request)?
                .insert(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        debug!(
            postings = appended.len(),
            accounts = balances.len(),
            with_request = request.is_some(),
            "Committed ledger post"
        );
        Ok(appended)
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        ledger_transactions::Entity::find()
            .filter(ledger_transactions::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(ledger_transactions::Column::Seq)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(transaction_from_row)
            .collect()
    }

    async fn get_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerError> {
        ledger_transactions::Entity::find_by_id(transaction_id.into_inner())
            .filter(ledger_transactions::Column::AccountId.eq(account_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(transaction_from_row)
            .transpose()
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<Request>, LedgerError> {
        ledger_requests::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(request_from_row)
            .transpose()
    }

    async fn get_requests(&self, ids: &[RequestId]) -> Result<Vec<Request>, LedgerError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        ledger_requests::Entity::find()
            .filter(ledger_requests::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(request_from_row)
            .collect()
    }

    async fn list_requests_for_owner(
        &self,
        owner: &UserId,
        limit: usize,
    ) -> Result<Vec<Request>, LedgerError> {
        ledger_requests::Entity::find()
            .filter(ledger_requests::Column::OwnerId.eq(owner.as_str()))
            .order_by_desc(ledger_requests::Column::CreatedAt)
            .order_by_asc(ledger_requests::Column::Seq)
            .limit(u64::try_from(limit).unwrap_or(u64::MAX))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(request_from_row)
            .collect()
    }

    async fn update_request(
        &self,
        id: RequestId,
        patch: RequestPatch,
    ) -> Result<Request, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let row = ledger_requests::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found("Request", id))?;
        let mut request = request_from_row(row)?;
        request.apply(&patch);

        let mut update = ledger_requests::ActiveModel {
            id: Set(id.into_inner()),
            ..Default::default()
        };
        match patch {
            RequestPatch::Description(_) => {
                update.description = Set(request.description.clone());
            }
            RequestPatch::AttachReceipt(_) => {
                update.receipt_ids = Set(serde_json::to_value(&request.receipt_ids)
                    .map_err(|e| LedgerError::Internal(e.to_string()))?);
            }
        }
        update.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(request)
    }
}
