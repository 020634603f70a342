//! Multi-party split requests.
//!
//! A request fans one total out into one transaction per related party. All
//! legs and the request record are written in a single atomic post.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::SplitPolicy;
use tally_shared::types::{ReceiptId, RequestId, UserId};
use tracing::{debug, info};

use super::accounts::AccountRegistry;
use super::store::LedgerStore;
use super::types::{
    NewRequest, Op, Posting, Request, RequestPatch, record_timestamp, round_amount,
};
use crate::currency::{AllocationUtil, CurrencyConverter};
use crate::error::LedgerError;

/// Creates and amends split requests.
pub struct RequestEngine<S> {
    store: Arc<S>,
    accounts: AccountRegistry<S>,
    converter: Arc<CurrencyConverter>,
    currency: String,
    split_policy: SplitPolicy,
}

impl<S> Clone for RequestEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            accounts: self.accounts.clone(),
            converter: Arc::clone(&self.converter),
            currency: self.currency.clone(),
            split_policy: self.split_policy,
        }
    }
}

impl<S: LedgerStore> RequestEngine<S> {
    /// Requests are converted into `currency` and split with `split_policy`.
    pub fn new(
        store: Arc<S>,
        converter: Arc<CurrencyConverter>,
        currency: impl Into<String>,
        split_policy: SplitPolicy,
    ) -> Self {
        let currency = currency.into().to_ascii_uppercase();
        Self {
            accounts: AccountRegistry::new(Arc::clone(&store), currency.clone()),
            store,
            converter,
            currency,
            split_policy,
        }
    }

    /// Splits a total between the related parties and records the request.
    ///
    /// Each leg lands on the pair's account with the sign that makes the
    /// related party owe the owner, whichever way round the account was
    /// first created.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty or duplicated party list, an owner
    ///   among the related parties, or a non-positive total
    /// - `UnknownCurrency` if the total cannot be converted
    pub async fn create_request(&self, input: NewRequest) -> Result<Request, LedgerError> {
        validate(&input)?;

        let amount = self
            .converter
            .convert(&input.currency_code, &self.currency, input.total_amount)?;
        debug!(
            from = %input.currency_code,
            to = %self.currency,
            total = %input.total_amount,
            converted = %amount,
            "Converted request total"
        );

        let shares = AllocationUtil::split(amount, input.related_ids.len(), self.split_policy)?;
        let request_id = RequestId::new();

        let mut postings = Vec::with_capacity(shares.len());
        for (related_id, share) in input.related_ids.iter().zip(shares) {
            let account = self.accounts.find_or_create(&input.owner_id, related_id).await?;
            let op = if account.owner_id == input.owner_id {
                Op::Add
            } else {
                Op::Subtract
            };
            postings.push(
                Posting::apply(account.id, input.creator_id.clone(), op, round_amount(share)?)
                    .for_request(request_id)
                    .described(input.description.clone()),
            );
        }

        let request = Request {
            id: request_id,
            created_at: record_timestamp(),
            created_by_id: input.creator_id,
            owner_id: input.owner_id,
            related_ids: input.related_ids,
            amount,
            transaction_ids: postings.iter().map(|p| p.transaction_id).collect(),
            description: input.description,
            receipt_ids: vec![],
        };

        self.store.post(postings, Some(request.clone())).await?;
        info!(
            request_id = %request.id,
            owner_id = %request.owner_id,
            parties = request.related_ids.len(),
            amount = %request.amount,
            "Created split request"
        );
        Ok(request)
    }

    /// Replaces the request's description, shown on every leg.
    ///
    /// # Errors
    ///
    /// `NotFound` if the request does not exist.
    pub async fn update_description(
        &self,
        request_id: RequestId,
        text: impl Into<String>,
    ) -> Result<Request, LedgerError> {
        let request = self
            .store
            .update_request(request_id, RequestPatch::Description(text.into()))
            .await?;
        info!(request_id = %request_id, "Updated request description");
        Ok(request)
    }

    /// Appends a receipt to the request.
    ///
    /// # Errors
    ///
    /// `NotFound` if the request does not exist.
    pub async fn attach_receipt(
        &self,
        request_id: RequestId,
        receipt_id: ReceiptId,
    ) -> Result<Request, LedgerError> {
        let request = self
            .store
            .update_request(request_id, RequestPatch::AttachReceipt(receipt_id.clone()))
            .await?;
        info!(request_id = %request_id, receipt_id = %receipt_id, "Attached receipt");
        Ok(request)
    }

    /// The owner's most recent requests, newest first.
    pub async fn get_requests_for_owner(
        &self,
        owner_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Request>, LedgerError> {
        self.store.list_requests_for_owner(owner_id, limit).await
    }

    /// Fetches a request.
    ///
    /// # Errors
    ///
    /// `NotFound` on a miss.
    pub async fn get_request(&self, request_id: RequestId) -> Result<Request, LedgerError> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Request", request_id))
    }
}

fn validate(input: &NewRequest) -> Result<(), LedgerError> {
    if input.related_ids.is_empty() {
        return Err(LedgerError::InvalidArgument(
            "a request needs at least one related party".into(),
        ));
    }
    if input.related_ids.contains(&input.owner_id) {
        return Err(LedgerError::InvalidArgument(format!(
            "{} cannot be both owner and related party",
            input.owner_id
        )));
    }
    let mut seen = HashSet::with_capacity(input.related_ids.len());
    if let Some(duplicate) = input.related_ids.iter().find(|id| !seen.insert(*id)) {
        return Err(LedgerError::InvalidArgument(format!(
            "{duplicate} is listed more than once"
        )));
    }
    if input.total_amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidArgument(format!(
            "total must be positive, got {}",
            input.total_amount
        )));
    }
    Ok(())
}
