//! Ledger error types.
//!
//! Every core operation returns `LedgerError`. The variants mirror what a
//! transport needs to decide how to answer its user; none of them is retried
//! inside the core.

use tally_shared::types::IdError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Missing or empty ids, bad amounts, malformed split requests.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Lookup miss.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Duplicate pairwise account.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Conversion involving a code missing from the rate table.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// The operation would not change anything (settling a zero balance).
    #[error("Nothing to do: {0}")]
    NoOp(String),

    /// Persistence or arithmetic failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            Self::NoOp(_) => "NO_OP",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller input
            Self::InvalidArgument(_) | Self::UnknownCurrency(_) => 400,

            // 404 Not Found
            Self::NotFound { .. } => 404,

            // 409 Conflict
            Self::AlreadyExists(_) => 409,

            // 422 Unprocessable - valid input, nothing to apply
            Self::NoOp(_) => 422,

            // 500 Internal Server Error
            Self::Internal(_) => 500,
        }
    }
}

impl From<IdError> for LedgerError {
    fn from(err: IdError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
