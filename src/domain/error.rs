//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Ledger and account rule violations.
///
/// These are independent of the web/infrastructure layer; `AppError` maps
/// each variant to an HTTP status.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Debit would take the balance below zero
    #[error("Insufficient coins: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    /// Amount is zero, negative, or exceeds limit
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown username
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Unknown account id
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Unknown catalog item
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Source and destination resolve to the same account
    #[error("Cannot transfer coins to yourself")]
    SameAccountTransfer,

    /// Username already registered
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Password does not match the stored credential
    #[error("Invalid username or password")]
    InvalidCredentials,
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(required: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }
}

impl From<super::AmountError> for DomainError {
    fn from(err: super::AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
