//! Row and domain conversions.
//!
//! Stored rows are checked on the way out; a row that does not map onto a
//! fully-formed domain record is reported as `Internal`.

use chrono::Utc;
use sea_orm::{DbErr, Set, SqlErr};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tally_core::LedgerError;
use tally_core::ledger::{Account, Op, Request, Transaction};
use tally_shared::types::{AccountId, RequestId, TransactionId, UserId};

use crate::entities::{accounts, ledger_requests, ledger_transactions};

/// Maps a database error onto the ledger taxonomy.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => LedgerError::AlreadyExists(detail),
        _ => LedgerError::Internal(err.to_string()),
    }
}

fn malformed(
    table: &str,
    id: impl std::fmt::Display,
    detail: impl std::fmt::Display,
) -> LedgerError {
    LedgerError::Internal(format!("malformed {table} row {id}: {detail}"))
}

fn user_id(table: &str, id: uuid::Uuid, raw: String) -> Result<UserId, LedgerError> {
    UserId::parse(raw).map_err(|e| malformed(table, id, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, LedgerError> {
    serde_json::to_value(value).map_err(|e| LedgerError::Internal(e.to_string()))
}

fn from_json<T: DeserializeOwned>(
    table: &str,
    id: uuid::Uuid,
    column: &str,
    value: serde_json::Value,
) -> Result<Vec<T>, LedgerError> {
    serde_json::from_value(value).map_err(|e| malformed(table, id, format!("{column}: {e}")))
}

pub(crate) fn account_from_row(row: accounts::Model) -> Result<Account, LedgerError> {
    Ok(Account {
        id: AccountId::from_uuid(row.id),
        owner_id: user_id("accounts", row.id, row.owner_id)?,
        related_id: user_id("accounts", row.id, row.related_id)?,
        balance: row.balance,
        currency: row.currency,
        currency_symbol: row.currency_symbol,
        created_at: row.created_at.with_timezone(&Utc),
    })
}

pub(crate) fn account_to_row(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        owner_id: Set(account.owner_id.to_string()),
        related_id: Set(account.related_id.to_string()),
        pair_key: Set(account.pair_key()),
        balance: Set(account.balance),
        currency: Set(account.currency.clone()),
        currency_symbol: Set(account.currency_symbol.clone()),
        created_at: Set(account.created_at.into()),
    }
}

pub(crate) fn transaction_from_row(
    row: ledger_transactions::Model,
) -> Result<Transaction, LedgerError> {
    let op: Op = row
        .op
        .parse()
        .map_err(|e| malformed("ledger_transactions", row.id, e))?;
    if row.amount < 0 {
        return Err(malformed("ledger_transactions", row.id, "negative amount"));
    }
    Ok(Transaction {
        id: TransactionId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.account_id),
        op,
        user_id: user_id("ledger_transactions", row.id, row.user_id)?,
        amount: row.amount,
        request_id: row.request_id.map(RequestId::from_uuid),
        description: row.description,
        created_at: row.created_at.with_timezone(&Utc),
    })
}

pub(crate) fn transaction_to_row(transaction: &Transaction) -> ledger_transactions::ActiveModel {
    ledger_transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        account_id: Set(transaction.account_id.into_inner()),
        op: Set(transaction.op.as_str().to_string()),
        user_id: Set(transaction.user_id.to_string()),
        amount: Set(transaction.amount),
        request_id: Set(transaction.request_id.map(RequestId::into_inner)),
        description: Set(transaction.description.clone()),
        created_at: Set(transaction.created_at.into()),
        ..Default::default()
    }
}

pub(crate) fn request_from_row(row: ledger_requests::Model) -> Result<Request, LedgerError> {
    const TABLE: &str = "ledger_requests";
    let id = row.id;
    let related_ids: Vec<UserId> = from_json(TABLE, id, "related_ids", row.related_ids)?;
    let transaction_ids: Vec<TransactionId> =
        from_json(TABLE, id, "transaction_ids", row.transaction_ids)?;
    if related_ids.len() != transaction_ids.len() {
        return Err(malformed(TABLE, id, "one transaction per related party expected"));
    }

    Ok(Request {
        id: RequestId::from_uuid(id),
        created_at: row.created_at.with_timezone(&Utc),
        created_by_id: user_id(TABLE, id, row.created_by_id)?,
        owner_id: user_id(TABLE, id, row.owner_id)?,
        related_ids,
        amount: row.amount,
        transaction_ids,
        description: row.description,
        receipt_ids: from_json(TABLE, id, "receipt_ids", row.receipt_ids)?,
    })
}

pub(crate) fn request_to_row(
    request: &Request,
) -> Result<ledger_requests::ActiveModel, LedgerError> {
    Ok(ledger_requests::ActiveModel {
        id: Set(request.id.into_inner()),
        created_at: Set(request.created_at.into()),
        created_by_id: Set(request.created_by_id.to_string()),
        owner_id: Set(request.owner_id.to_string()),
        related_ids: Set(to_json(&request.related_ids)?),
        amount: Set(request.amount),
        transaction_ids: Set(to_json(&request.transaction_ids)?),
        receipt_ids: Set(to_json(&request.receipt_ids)?),
        description: Set(request.description.clone()),
        ..Default::default()
    })
}
