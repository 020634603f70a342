//! Read-only projections: account history and per-user status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_shared::types::{AccountId, ReceiptId, RequestId, TransactionId, UserId};
use tracing::warn;

use super::store::LedgerStore;
use super::types::{Op, Request, Transaction};
use crate::error::LedgerError;

/// A transaction as it is shown to a user.
///
/// Legs of a split request carry the request's date, description, and
/// receipts, so every leg reads the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEntry {
    /// Underlying transaction.
    pub transaction_id: TransactionId,
    /// Direction.
    pub op: Op,
    /// Who caused it.
    pub user_id: UserId,
    /// Rounded magnitude.
    pub amount: i64,
    /// Owning split request.
    pub request_id: Option<RequestId>,
    /// Request date if linked, else the transaction's own.
    pub effective_date: DateTime<Utc>,
    /// Request description if linked, else the transaction's own.
    pub description: String,
    /// Request receipts if linked, else empty.
    pub receipt_ids: Vec<ReceiptId>,
}

impl RenderedEntry {
    fn render(transaction: Transaction, request: Option<&Request>) -> Self {
        let (effective_date, description, receipt_ids) = match request {
            Some(request) => (
                request.created_at,
                request.description.clone(),
                request.receipt_ids.clone(),
            ),
            None => (transaction.created_at, transaction.description, vec![]),
        };
        Self {
            transaction_id: transaction.id,
            op: transaction.op,
            user_id: transaction.user_id,
            amount: transaction.amount,
            request_id: transaction.request_id,
            effective_date,
            description,
            receipt_ids,
        }
    }
}

/// Who owes whom on one account, from the viewer's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwesDirection {
    /// The viewer owes the counterparty.
    UserOwes,
    /// The counterparty owes the viewer.
    CounterpartyOwes,
}

/// One non-zero account in a status summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// Account the entry is for.
    pub account_id: AccountId,
    /// The other party.
    pub counterparty_id: UserId,
    /// Who owes.
    pub direction: OwesDirection,
    /// Absolute balance.
    pub magnitude: i64,
    /// Display glyph of the account currency.
    pub currency_symbol: String,
}

/// All of a user's open balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// Non-zero accounts.
    pub entries: Vec<StatusEntry>,
    /// Net position, positive when the user is owed overall.
    pub total: i64,
}

/// Read paths over the ledger.
pub struct HistoryView<S> {
    store: Arc<S>,
}

impl<S> Clone for HistoryView<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> HistoryView<S> {
    /// Creates a view over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The account's latest `limit` entries, newest effective date first.
    ///
    /// Entries with the same effective date keep log order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist.
    pub async fn list_account_history(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<RenderedEntry>, LedgerError> {
        if self.store.get_account(account_id).await?.is_none() {
            return Err(LedgerError::not_found("Account", account_id));
        }

        let log = self.store.list_transactions(account_id).await?;

        let mut request_ids: Vec<RequestId> = log.iter().filter_map(|t| t.request_id).collect();
        request_ids.sort_unstable();
        request_ids.dedup();
        let requests: HashMap<RequestId, Request> = if request_ids.is_empty() {
            HashMap::new()
        } else {
            self.store
                .get_requests(&request_ids)
                .await?
                .into_iter()
                .map(|request| (request.id, request))
                .collect()
        };

        let mut entries: Vec<RenderedEntry> = log
            .into_iter()
            .map(|transaction| {
                let request = transaction.request_id.and_then(|id| {
                    let found = requests.get(&id);
                    if found.is_none() {
                        warn!(
                            transaction_id = %transaction.id,
                            request_id = %id,
                            "Linked request missing, rendering transaction as is"
                        );
                    }
                    found
                });
                RenderedEntry::render(transaction, request)
            })
            .collect();

        entries.sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
        entries.truncate(limit);
        Ok(entries)
    }

    /// History of the account between `a` and `b`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the two have no account.
    pub async fn list_history_between(
        &self,
        a: &UserId,
        b: &UserId,
        limit: usize,
    ) -> Result<Vec<RenderedEntry>, LedgerError> {
        let account = self
            .store
            .find_account_by_pair(a, b)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", format!("{a}/{b}")))?;
        self.list_account_history(account.id, limit).await
    }

    /// Every non-zero balance involving `user_id`, seen from their side.
    pub async fn status_summary(&self, user_id: &UserId) -> Result<StatusSummary, LedgerError> {
        let accounts = self.store.list_accounts_for_user(user_id).await?;

        let mut entries = Vec::new();
        let mut total: i64 = 0;
        for account in accounts.into_iter().filter(|account| account.balance != 0) {
            let (Some(position), Some(counterparty)) =
                (account.balance_for(user_id), account.counterparty(user_id))
            else {
                continue;
            };
            let direction = if position < 0 {
                OwesDirection::UserOwes
            } else {
                OwesDirection::CounterpartyOwes
            };
            let overflow =
                || LedgerError::Internal(format!("status total for {user_id} overflows"));
            total = total.checked_add(position).ok_or_else(overflow)?;
            entries.push(StatusEntry {
                account_id: account.id,
                counterparty_id: counterparty.clone(),
                direction,
                magnitude: position.checked_abs().ok_or_else(overflow)?,
                currency_symbol: account.currency_symbol.clone(),
            });
        }

        Ok(StatusSummary { entries, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{CurrencyConverter, RateTable};
    use crate::ledger::accounts::AccountRegistry;
    use crate::ledger::balance::BalanceLedger;
    use crate::ledger::memory::MemoryStore;
    use crate::ledger::request::RequestEngine;
    use crate::ledger::types::NewRequest;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tally_shared::SplitPolicy;

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    struct Fixture {
        accounts: AccountRegistry<MemoryStore>,
        ledger: BalanceLedger<MemoryStore>,
        requests: RequestEngine<MemoryStore>,
        history: HistoryView<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let converter = Arc::new(CurrencyConverter::new(RateTable::fixed_base("USD")));
        Fixture {
            accounts: AccountRegistry::new(Arc::clone(&store), "USD"),
            ledger: BalanceLedger::new(Arc::clone(&store)),
            requests: RequestEngine::new(Arc::clone(&store), converter, "USD", SplitPolicy::Even),
            history: HistoryView::new(store),
        }
    }

    #[tokio::test]
    async fn test_request_overlay() {
        let f = fixture();
        let request = f
            .requests
            .create_request(NewRequest {
                creator_id: user("o"),
                owner_id: user("o"),
                related_ids: vec![user("a"), user("b")],
                total_amount: dec!(20),
                currency_code: "USD".into(),
                description: "taxi".into(),
            })
            .await
            .unwrap();
        f.requests.update_description(request.id, "airport taxi").await.unwrap();
        f.requests
            .attach_receipt(request.id, ReceiptId::parse("rcpt").unwrap())
            .await
            .unwrap();

        for party in ["a", "b"] {
            let entries = f
                .history
                .list_history_between(&user(party), &user("o"), 5)
                .await
                .unwrap();
            assert_eq!(entries.len(), 1);
            let entry = &entries[0];
            assert_eq!(entry.description, "airport taxi");
            assert_eq!(entry.effective_date, request.created_at);
            assert_eq!(entry.receipt_ids, vec![ReceiptId::parse("rcpt").unwrap()]);
            assert_eq!(entry.request_id, Some(request.id));
        }
    }

    #[tokio::test]
    async fn test_history_limit_and_order() {
        let f = fixture();
        let account = f.accounts.create(&user("o"), &user("a")).await.unwrap();
        for i in 1..=8i64 {
            f.ledger
                .apply_transaction(account.id, &user("o"), Op::Add, Decimal::from(i), None)
                .await
                .unwrap();
        }

        let entries = f.history.list_account_history(account.id, 5).await.unwrap();
        assert_eq!(entries.len(), 5);
        assert!(entries.windows(2).all(|w| w[0].effective_date >= w[1].effective_date));
        assert!(entries.iter().all(|entry| entry.receipt_ids.is_empty()));
    }

    #[tokio::test]
    async fn test_history_unknown_account() {
        let f = fixture();
        assert!(matches!(
            f.history.list_account_history(AccountId::new(), 5).await,
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            f.history.list_history_between(&user("x"), &user("y"), 5).await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_directions() {
        let f = fixture();
        let account = f.accounts.create(&user("u1"), &user("u2")).await.unwrap();
        f.ledger
            .apply_transaction(account.id, &user("u1"), Op::Subtract, dec!(5), None)
            .await
            .unwrap();

        let u1 = f.history.status_summary(&user("u1")).await.unwrap();
        assert_eq!(u1.entries.len(), 1);
        assert_eq!(u1.entries[0].direction, OwesDirection::UserOwes);
        assert_eq!(u1.entries[0].counterparty_id, user("u2"));
        assert_eq!(u1.entries[0].magnitude, 5);
        assert_eq!(u1.total, -5);

        let u2 = f.history.status_summary(&user("u2")).await.unwrap();
        assert_eq!(u2.entries[0].direction, OwesDirection::CounterpartyOwes);
        assert_eq!(u2.total, 5);

        f.ledger
            .apply_transaction(account.id, &user("u1"), Op::Add, dec!(10), None)
            .await
            .unwrap();
        let u1 = f.history.status_summary(&user("u1")).await.unwrap();
        assert_eq!(u1.entries[0].direction, OwesDirection::CounterpartyOwes);
        assert_eq!(u1.entries[0].magnitude, 5);
    }

    #[tokio::test]
    async fn test_status_skips_settled_and_nets_total() {
        let f = fixture();
        let ab = f.accounts.create(&user("a"), &user("b")).await.unwrap();
        let ca = f.accounts.create(&user("c"), &user("a")).await.unwrap();
        f.accounts.create(&user("a"), &user("d")).await.unwrap();

        f.ledger
            .apply_transaction(ab.id, &user("a"), Op::Add, dec!(7), None)
            .await
            .unwrap();
        f.ledger
            .apply_transaction(ca.id, &user("c"), Op::Add, dec!(3), None)
            .await
            .unwrap();

        let summary = f.history.status_summary(&user("a")).await.unwrap();
        assert_eq!(summary.entries.len(), 2);
        // a is owed 7 by b and owes c 3.
        assert_eq!(summary.total, 4);
        assert_eq!(summary.entries[0].currency_symbol, "$");
    }
}
