//! Property-based tests for the ledger components.
//!
//! - Account lookup is symmetric
//! - Inverse transactions cancel out
//! - The log always sums to the balance
//! - History is bounded and newest first
//! - Split legs carry the owner-is-owed sign

use std::future::Future;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::SplitPolicy;
use tally_shared::types::UserId;

use super::accounts::AccountRegistry;
use super::balance::BalanceLedger;
use super::history::HistoryView;
use super::memory::MemoryStore;
use super::request::RequestEngine;
use super::types::{NewRequest, Op, Transaction};
use crate::currency::{CurrencyConverter, RateTable};

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Strategy to generate party ids.
fn party() -> impl Strategy<Value = UserId> {
    "[a-z]{1,8}".prop_map(|id| UserId::parse(id).unwrap())
}

/// Strategy to generate two distinct party ids.
fn distinct_pair() -> impl Strategy<Value = (UserId, UserId)> {
    (party(), party()).prop_filter("parties must differ", |(a, b)| a != b)
}

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate an op.
fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Add), Just(Op::Subtract)]
}

struct Components {
    accounts: AccountRegistry<MemoryStore>,
    ledger: BalanceLedger<MemoryStore>,
    requests: RequestEngine<MemoryStore>,
    history: HistoryView<MemoryStore>,
}

fn components(policy: SplitPolicy) -> Components {
    let store = Arc::new(MemoryStore::new());
    let converter = Arc::new(CurrencyConverter::new(RateTable::fixed_base("USD")));
    Components {
        accounts: AccountRegistry::new(Arc::clone(&store), "USD"),
        ledger: BalanceLedger::new(Arc::clone(&store)),
        requests: RequestEngine::new(Arc::clone(&store), converter, "USD", policy),
        history: HistoryView::new(store),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// find(a, b) and find(b, a) return the same account.
    #[test]
    fn prop_find_is_symmetric((a, b) in distinct_pair(), reversed in any::<bool>()) {
        let c = components(SplitPolicy::Even);
        block_on(async {
            let (owner, related) = if reversed { (&b, &a) } else { (&a, &b) };
            let created = c.accounts.create(owner, related).await.unwrap();
            let ab = c.accounts.find(&a, &b).await.unwrap().unwrap();
            let ba = c.accounts.find(&b, &a).await.unwrap().unwrap();
            prop_assert_eq!(ab.id, created.id);
            prop_assert_eq!(ba.id, created.id);
            Ok(())
        })?;
    }

    /// Add x then Subtract x returns a fresh account to zero.
    #[test]
    fn prop_inverse_transactions_cancel((a, b) in distinct_pair(), amount in positive_amount()) {
        let c = components(SplitPolicy::Even);
        block_on(async {
            let account = c.accounts.create(&a, &b).await.unwrap();
            c.ledger.apply_transaction(account.id, &a, Op::Add, amount, None).await.unwrap();
            c.ledger.apply_transaction(account.id, &a, Op::Subtract, amount, None).await.unwrap();
            prop_assert_eq!(c.accounts.get(account.id).await.unwrap().balance, 0);
            Ok(())
        })?;
    }

    /// After any sequence of transactions the log sums to the balance.
    #[test]
    fn prop_log_sums_to_balance(
        (a, b) in distinct_pair(),
        steps in prop::collection::vec((op(), positive_amount()), 1..20),
    ) {
        let c = components(SplitPolicy::Even);
        block_on(async {
            let account = c.accounts.create(&a, &b).await.unwrap();
            for (op, amount) in &steps {
                c.ledger.apply_transaction(account.id, &b, *op, *amount, None).await.unwrap();
            }
            let log = c.ledger.transactions(account.id).await.unwrap();
            prop_assert_eq!(log.len(), steps.len());
            let sum: i64 = log.iter().map(Transaction::signed_amount).sum();
            prop_assert_eq!(sum, c.accounts.get(account.id).await.unwrap().balance);
            Ok(())
        })?;
    }

    /// History never exceeds the limit and is non-increasing by effective date.
    #[test]
    fn prop_history_bounded_and_ordered(
        (a, b) in distinct_pair(),
        count in 0usize..15,
        limit in 0usize..10,
    ) {
        let c = components(SplitPolicy::Even);
        block_on(async {
            let account = c.accounts.create(&a, &b).await.unwrap();
            for i in 0..count {
                if i % 3 == 0 {
                    c.requests
                        .create_request(NewRequest {
                            creator_id: a.clone(),
                            owner_id: a.clone(),
                            related_ids: vec![b.clone()],
                            total_amount: Decimal::ONE,
                            currency_code: "USD".into(),
                            description: format!("request {i}"),
                        })
                        .await
                        .unwrap();
                } else {
                    c.ledger
                        .apply_transaction(account.id, &a, Op::Add, Decimal::ONE, None)
                        .await
                        .unwrap();
                }
            }
            let entries = c.history.list_account_history(account.id, limit).await.unwrap();
            prop_assert_eq!(entries.len(), count.min(limit));
            prop_assert!(entries.windows(2).all(|w| w[0].effective_date >= w[1].effective_date));
            Ok(())
        })?;
    }

    /// Every split leg leaves the related party owing the owner.
    #[test]
    fn prop_split_legs_owe_owner(
        owner in party(),
        related in prop::collection::hash_set(party(), 1..6),
        reversed in prop::collection::vec(any::<bool>(), 6),
        total in positive_amount(),
    ) {
        prop_assume!(!related.contains(&owner));
        let related: Vec<UserId> = related.into_iter().collect();
        let c = components(SplitPolicy::Reconciled);
        block_on(async {
            // Some accounts already exist with the related party as stored owner.
            for (party, flip) in related.iter().zip(&reversed) {
                if *flip {
                    c.accounts.create(party, &owner).await.unwrap();
                }
            }
            let request = c
                .requests
                .create_request(NewRequest {
                    creator_id: owner.clone(),
                    owner_id: owner.clone(),
                    related_ids: related.clone(),
                    total_amount: total,
                    currency_code: "USD".into(),
                    description: String::new(),
                })
                .await
                .unwrap();
            prop_assert_eq!(request.transaction_ids.len(), related.len());

            let mut owed = 0i64;
            for party in &related {
                let account = c.accounts.find(&owner, party).await.unwrap().unwrap();
                let position = account.balance_for(&owner).unwrap();
                prop_assert!(position >= 0);
                owed += position;
            }
            let expected = super::types::round_amount(total).unwrap();
            prop_assert_eq!(owed, expected);
            Ok(())
        })?;
    }
}
