//! Domain types for pairwise accounts, their transactions, and split requests.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ReceiptId, RequestId, TransactionId, UserId};

use crate::error::LedgerError;

/// Direction of a balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// `balance += amount`
    Add,
    /// `balance -= amount`
    Subtract,
}

impl Op {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
        }
    }

    /// The opposite operation.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Add => Self::Subtract,
            Self::Subtract => Self::Add,
        }
    }

    /// Applies `amount` to `balance`, `None` on overflow.
    #[must_use]
    pub const fn apply(self, balance: i64, amount: i64) -> Option<i64> {
        match self {
            Self::Add => balance.checked_add(amount),
            Self::Subtract => balance.checked_sub(amount),
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Op {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "subtract" | "sub" => Ok(Self::Subtract),
            other => Err(LedgerError::InvalidArgument(format!("unknown op '{other}'"))),
        }
    }
}

/// Current time at microsecond precision, the resolution stores keep.
#[must_use]
pub fn record_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Canonical key of an unordered party pair.
///
/// `pair_key(a, b) == pair_key(b, a)`. The shorter-sorting id is length
/// prefixed so no two distinct pairs share a key.
#[must_use]
pub fn pair_key(a: &UserId, b: &UserId) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}:{}", lo.as_str().len(), lo, hi)
}

/// A pairwise balance between `owner_id` and `related_id`.
///
/// `balance > 0` means the related party owes the owner, `balance < 0` means
/// the owner owes the related party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Party that created the account.
    pub owner_id: UserId,
    /// The other party.
    pub related_id: UserId,
    /// Signed balance in whole units.
    pub balance: i64,
    /// ISO currency code.
    pub currency: String,
    /// Display glyph for `currency`.
    pub currency_symbol: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A fresh zero-balance account.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        related_id: UserId,
        currency: impl Into<String>,
        currency_symbol: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            owner_id,
            related_id,
            balance: 0,
            currency: currency.into(),
            currency_symbol: currency_symbol.into(),
            created_at: record_timestamp(),
        }
    }

    /// Canonical key of this account's party pair.
    #[must_use]
    pub fn pair_key(&self) -> String {
        pair_key(&self.owner_id, &self.related_id)
    }

    /// Whether `user` is either party.
    #[must_use]
    pub fn involves(&self, user: &UserId) -> bool {
        self.owner_id == *user || self.related_id == *user
    }

    /// Whether this account is between exactly `a` and `b`, in either orientation.
    #[must_use]
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (self.owner_id == *a && self.related_id == *b)
            || (self.owner_id == *b && self.related_id == *a)
    }

    /// The party opposite `user`.
    #[must_use]
    pub fn counterparty(&self, user: &UserId) -> Option<&UserId> {
        if self.owner_id == *user {
            Some(&self.related_id)
        } else if self.related_id == *user {
            Some(&self.owner_id)
        } else {
            None
        }
    }

    /// Balance from `user`'s side: positive when `user` is owed.
    #[must_use]
    pub fn balance_for(&self, user: &UserId) -> Option<i64> {
        if self.owner_id == *user {
            Some(self.balance)
        } else if self.related_id == *user {
            self.balance.checked_neg()
        } else {
            None
        }
    }
}

/// One entry in an account's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Account the entry belongs to.
    pub account_id: AccountId,
    /// Direction.
    pub op: Op,
    /// Who caused it.
    pub user_id: UserId,
    /// Non-negative magnitude, already rounded.
    pub amount: i64,
    /// Split request this entry is a leg of.
    pub request_id: Option<RequestId>,
    /// Own description, superseded by the request's when linked.
    pub description: String,
    /// Own timestamp, superseded by the request's when linked.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect on the balance.
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        match self.op {
            Op::Add => self.amount,
            Op::Subtract => -self.amount,
        }
    }
}

/// A multi-party split event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Request ID.
    pub id: RequestId,
    /// Creation time, shown on every leg.
    pub created_at: DateTime<Utc>,
    /// Who entered the request.
    pub created_by_id: UserId,
    /// Party the related parties owe.
    pub owner_id: UserId,
    /// Distinct parties the total is split between.
    pub related_ids: Vec<UserId>,
    /// Total before splitting, in the ledger currency.
    pub amount: Decimal,
    /// One leg per related party, same order as `related_ids`.
    pub transaction_ids: Vec<TransactionId>,
    /// Shown on every leg.
    pub description: String,
    /// Attached receipts in attachment order.
    pub receipt_ids: Vec<ReceiptId>,
}

impl Request {
    /// Applies an in-place amendment.
    pub fn apply(&mut self, patch: &RequestPatch) {
        match patch {
            RequestPatch::Description(text) => self.description.clone_from(text),
            RequestPatch::AttachReceipt(receipt) => self.receipt_ids.push(receipt.clone()),
        }
    }
}

/// Amendment to an existing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPatch {
    /// Replace the description.
    Description(String),
    /// Append a receipt.
    AttachReceipt(ReceiptId),
}

/// What a posting does to its account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingKind {
    /// Apply a fixed rounded amount.
    Apply {
        /// Direction.
        op: Op,
        /// Rounded magnitude.
        amount: i64,
    },
    /// Zero the balance, whatever it is when the store locks the account.
    Settle,
}

/// A pending balance write, resolved by the store against the locked balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// ID the resulting transaction will carry.
    pub transaction_id: TransactionId,
    /// Target account.
    pub account_id: AccountId,
    /// Acting user.
    pub user_id: UserId,
    /// Balance effect.
    pub kind: PostingKind,
    /// Owning split request.
    pub request_id: Option<RequestId>,
    /// Description of the resulting transaction.
    pub description: String,
    /// Timestamp of the resulting transaction.
    pub created_at: DateTime<Utc>,
}

impl Posting {
    /// A fixed-amount posting.
    #[must_use]
    pub fn apply(account_id: AccountId, user_id: UserId, op: Op, amount: i64) -> Self {
        Self::with_kind(account_id, user_id, PostingKind::Apply { op, amount })
    }

    /// A posting that zeroes the balance.
    #[must_use]
    pub fn settle(account_id: AccountId, user_id: UserId) -> Self {
        Self::with_kind(account_id, user_id, PostingKind::Settle)
    }

    fn with_kind(account_id: AccountId, user_id: UserId, kind: PostingKind) -> Self {
        Self {
            transaction_id: TransactionId::new(),
            account_id,
            user_id,
            kind,
            request_id: None,
            description: String::new(),
            created_at: record_timestamp(),
        }
    }

    /// Links the posting to a split request.
    #[must_use]
    pub fn for_request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Sets the transaction description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Resolves the posting against the account's current balance.
    ///
    /// Returns the transaction to append and the new balance.
    ///
    /// # Errors
    ///
    /// `NoOp` when settling a zero balance, `Internal` on overflow.
    pub fn resolve(&self, balance: i64) -> Result<(Transaction, i64), LedgerError> {
        let (op, amount) = match self.kind {
            PostingKind::Apply { op, amount } => (op, amount),
            PostingKind::Settle => {
                if balance == 0 {
                    return Err(LedgerError::NoOp(format!(
                        "account {} is already settled",
                        self.account_id
                    )));
                }
                let op = if balance > 0 { Op::Subtract } else { Op::Add };
                let amount = balance.checked_abs().ok_or_else(|| {
                    LedgerError::Internal(format!("balance of {} overflows", self.account_id))
                })?;
                (op, amount)
            }
        };

        let next = op.apply(balance, amount).ok_or_else(|| {
            LedgerError::Internal(format!("balance of {} overflows", self.account_id))
        })?;

        let transaction = Transaction {
            id: self.transaction_id,
            account_id: self.account_id,
            op,
            user_id: self.user_id.clone(),
            amount,
            request_id: self.request_id,
            description: self.description.clone(),
            created_at: self.created_at,
        };
        Ok((transaction, next))
    }
}

/// Input for creating a split request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    /// Who enters the request.
    pub creator_id: UserId,
    /// Party the others will owe.
    pub owner_id: UserId,
    /// Parties to split between.
    pub related_ids: Vec<UserId>,
    /// Total in `currency_code`.
    pub total_amount: Decimal,
    /// Currency of `total_amount`.
    pub currency_code: String,
    /// Free text, may be empty.
    pub description: String,
}

/// Rounds a magnitude to whole units, half away from zero.
///
/// # Errors
///
/// `InvalidArgument` for negative amounts or amounts beyond `i64`.
pub fn round_amount(amount: Decimal) -> Result<i64, LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::InvalidArgument(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| LedgerError::InvalidArgument(format!("amount {amount} is too large")))
}

/// Converts a caller-held float into a `Decimal`.
///
/// # Errors
///
/// `InvalidArgument` for NaN, infinities, or values outside `Decimal`'s range.
pub fn amount_from_f64(value: f64) -> Result<Decimal, LedgerError> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidArgument(format!(
            "amount must be finite, got {value}"
        )));
    }
    Decimal::from_f64(value)
        .ok_or_else(|| LedgerError::InvalidArgument(format!("amount {value} is out of range")))
}
