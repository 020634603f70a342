//! Common types used across the application.

pub mod id;
pub mod party;

pub use id::*;
pub use party::{IdError, ReceiptId, UserId};
