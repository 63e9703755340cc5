//! Coin amount types
//!
//! Domain primitives for coin values. A `Coins` amount is always positive and
//! a `Balance` is never negative; both are validated at construction so an
//! invalid value cannot reach the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for a single amount or balance (one trillion coins)
const MAX_COINS: i64 = 1_000_000_000_000;

/// Coins represents a validated, strictly positive amount of coins.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value never exceeds one trillion
///
/// # Example
/// ```
/// use coinshop::domain::Coins;
///
/// let amount = Coins::new(100).unwrap();
/// assert_eq!(amount.value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Coins(i64);

/// Errors that can occur when creating an amount or balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(i64),

    #[error("Balance cannot be negative (got {0})")]
    Negative(i64),

    #[error("Amount exceeds maximum allowed value ({MAX_COINS})")]
    Overflow,
}

impl Coins {
    /// Create a new amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::Overflow` if value > one trillion
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NotPositive(value));
        }
        if value > MAX_COINS {
            return Err(AmountError::Overflow);
        }
        Ok(Self(value))
    }

    /// Get the underlying value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Coins {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Coins::new(value)
    }
}

impl From<Coins> for i64 {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

/// Balance represents an account balance (zero or positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(i64);

impl Balance {
    /// Create a new balance (zero or positive).
    ///
    /// No upper bound: `MAX_COINS` caps a single amount, not a balance.
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value < 0 {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Check if balance covers the given amount
    pub fn is_sufficient_for(&self, amount: &Coins) -> bool {
        self.0 >= amount.value()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
