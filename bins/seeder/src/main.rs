//! Database seeder for Tally development and testing.
//!
//! Seeds a small group of parties with pairwise accounts, a few split
//! requests, and one direct transaction, then logs each party's status.
//! Running it twice leaves the ledger as it was after the first run.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use tally_core::currency::{RateRefresher, RateTable, StaticRateProvider};
use tally_core::ledger::{NewRequest, Op, OwesDirection};
use tally_core::{LedgerSettings, Tally};
use tally_db::PgLedgerStore;
use tally_shared::AppConfig;
use tally_shared::types::{ReceiptId, UserId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let db = tally_db::connect_with(&config.database).await?;

    let table = if config.currency.offline {
        RateTable::fixed_base(&config.currency.base)
    } else {
        sample_rates(&config.currency.base)?
    };
    let rates = RateRefresher::load_initial(
        StaticRateProvider::new(table),
        config.currency.refresh_interval(),
    )
    .await?;

    let tally = Tally::new(
        Arc::new(PgLedgerStore::new(db)),
        rates.converter(),
        LedgerSettings::from(&config.ledger),
    );
    let alice = UserId::parse("alice")?;
    let bob = UserId::parse("bob")?;
    let carol = UserId::parse("carol")?;
    let dave = UserId::parse("dave")?;

    info!("Seeding accounts...");
    seed_accounts(&tally, &alice, &[&bob, &carol, &dave]).await?;
    // One account stored the other way round.
    tally.accounts.find_or_create(&carol, &bob).await?;

    info!("Seeding split requests...");
    seed_requests(&tally, &alice, &bob, &carol, &dave).await?;

    for user in [&alice, &bob, &carol, &dave] {
        log_status(&tally, user).await?;
    }

    info!("Seeding complete!");
    Ok(())
}

/// A fixed development table, factors per one unit of `base`.
fn sample_rates(base: &str) -> anyhow::Result<RateTable> {
    let mut rates = vec![
        ("USD".to_string(), Decimal::ONE),
        ("EUR".to_string(), Decimal::new(92, 2)),
        ("GBP".to_string(), Decimal::new(79, 2)),
        ("PLN".to_string(), Decimal::new(395, 2)),
    ];
    if !base.eq_ignore_ascii_case("USD") {
        // Sample factors are quoted against USD; rebase them.
        let pivot = rates
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(base))
            .map(|(_, factor)| *factor)
            .with_context(|| format!("no sample rate for base currency {base}"))?;
        for (_, factor) in &mut rates {
            *factor /= pivot;
        }
    }
    Ok(RateTable::new(base, rates)?)
}

async fn seed_accounts(
    tally: &Tally<PgLedgerStore>,
    owner: &UserId,
    others: &[&UserId],
) -> anyhow::Result<()> {
    for other in others {
        let account = tally.accounts.find_or_create(owner, other).await?;
        info!(account_id = %account.id, owner = %owner, related = %other, "  Account ready");
    }
    Ok(())
}

async fn seed_requests(
    tally: &Tally<PgLedgerStore>,
    alice: &UserId,
    bob: &UserId,
    carol: &UserId,
    dave: &UserId,
) -> anyhow::Result<()> {
    if !tally.recent_requests(alice).await?.is_empty() {
        info!("  Requests already exist, skipping...");
        return Ok(());
    }

    let dinner = tally
        .requests
        .create_request(NewRequest {
            creator_id: alice.clone(),
            owner_id: alice.clone(),
            related_ids: vec![bob.clone(), carol.clone(), dave.clone()],
            total_amount: Decimal::new(9000, 2),
            currency_code: tally.settings().currency.clone(),
            description: "dinner".into(),
        })
        .await?;
    tally
        .requests
        .attach_receipt(dinner.id, ReceiptId::parse("receipt-dinner-001")?)
        .await?;
    info!(request_id = %dinner.id, "  Created request: dinner");

    let currency = if tally.converter().snapshot().contains("EUR") {
        "EUR"
    } else {
        tally.settings().currency.as_str()
    };
    let taxi = tally
        .requests
        .create_request(NewRequest {
            creator_id: carol.clone(),
            owner_id: carol.clone(),
            related_ids: vec![alice.clone(), bob.clone()],
            total_amount: Decimal::new(3650, 2),
            currency_code: currency.into(),
            description: "taxi".into(),
        })
        .await?;
    tally
        .requests
        .update_description(taxi.id, "taxi to the airport")
        .await?;
    info!(request_id = %taxi.id, currency, "  Created request: taxi");

    let account = tally.accounts.find_or_create(bob, dave).await?;
    tally
        .ledger
        .apply_transaction(account.id, bob, Op::Add, Decimal::new(1250, 2), None)
        .await?;
    info!(account_id = %account.id, "  Recorded direct transaction");
    Ok(())
}

async fn log_status(tally: &Tally<PgLedgerStore>, user: &UserId) -> anyhow::Result<()> {
    let summary = tally.history.status_summary(user).await?;
    for entry in &summary.entries {
        let verb = match entry.direction {
            OwesDirection::UserOwes => "owes",
            OwesDirection::CounterpartyOwes => "is owed by",
        };
        info!(
            "  {user} {verb} {} {}{}",
            entry.counterparty_id, entry.currency_symbol, entry.magnitude
        );
    }
    info!(user = %user, total = summary.total, "Status");
    Ok(())
}
