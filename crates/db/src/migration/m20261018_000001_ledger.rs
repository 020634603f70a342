//! Ledger schema.
//!
//! Creates the accounts, transaction log, and split request tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(LEDGER_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(LEDGER_REQUESTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id              UUID PRIMARY KEY,
    owner_id        TEXT NOT NULL CHECK (btrim(owner_id) <> ''),
    related_id      TEXT NOT NULL CHECK (btrim(related_id) <> ''),
    pair_key        TEXT NOT NULL,
    balance         BIGINT NOT NULL DEFAULT 0,
    currency        TEXT NOT NULL DEFAULT 'USD',
    currency_symbol TEXT NOT NULL DEFAULT '$',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT accounts_distinct_parties CHECK (owner_id <> related_id)
);

CREATE UNIQUE INDEX accounts_pair_key_key ON accounts (pair_key);
CREATE INDEX idx_accounts_owner ON accounts (owner_id);
CREATE INDEX idx_accounts_related ON accounts (related_id);
";

// No foreign key to accounts: a log outlives its account.
const LEDGER_TRANSACTIONS_SQL: &str = r"
CREATE TABLE ledger_transactions (
    id          UUID PRIMARY KEY,
    account_id  UUID NOT NULL,
    op          TEXT NOT NULL CHECK (op IN ('add', 'subtract')),
    user_id     TEXT NOT NULL CHECK (btrim(user_id) <> ''),
    amount      BIGINT NOT NULL CHECK (amount >= 0),
    request_id  UUID,
    description TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    seq         BIGSERIAL NOT NULL
);

CREATE INDEX idx_ledger_transactions_account ON ledger_transactions (account_id, seq);
CREATE INDEX idx_ledger_transactions_request ON ledger_transactions (request_id)
    WHERE request_id IS NOT NULL;
";

const LEDGER_REQUESTS_SQL: &str = r"
CREATE TABLE ledger_requests (
    id              UUID PRIMARY KEY,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by_id   TEXT NOT NULL CHECK (btrim(created_by_id) <> ''),
    owner_id        TEXT NOT NULL CHECK (btrim(owner_id) <> ''),
    related_ids     JSONB NOT NULL CHECK (
        jsonb_typeof(related_ids) = 'array' AND jsonb_array_length(related_ids) > 0
    ),
    amount          NUMERIC NOT NULL CHECK (amount > 0),
    transaction_ids JSONB NOT NULL CHECK (
        jsonb_typeof(transaction_ids) = 'array'
        AND jsonb_array_length(transaction_ids) = jsonb_array_length(related_ids)
    ),
    receipt_ids     JSONB NOT NULL DEFAULT '[]'::jsonb CHECK (jsonb_typeof(receipt_ids) = 'array'),
    description     TEXT NOT NULL DEFAULT '',
    seq             BIGSERIAL NOT NULL
);

CREATE INDEX idx_ledger_requests_owner ON ledger_requests (owner_id, created_at DESC, seq);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS ledger_requests;
DROP TABLE IF EXISTS ledger_transactions;
DROP TABLE IF EXISTS accounts;
";
