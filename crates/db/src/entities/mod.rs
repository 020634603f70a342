//! `SeaORM` entity definitions for the ledger tables.

pub mod accounts;
pub mod ledger_requests;
pub mod ledger_transactions;
