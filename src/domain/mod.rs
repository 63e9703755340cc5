//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod context;
pub mod error;
pub mod models;

pub use amount::{AmountError, Balance, Coins};
pub use context::OperationContext;
pub use error::DomainError;
pub use models::{
    Account, CatalogItem, PurchasedItem, ReceivedCoins, SentCoins, TransactionsSummary,
    UserSummary,
};

/// Primary key of `userlist`
pub type AccountId = i32;

/// Primary key of `shop`
pub type ItemId = i32;

/// Primary key of `transactions`
pub type TransactionId = i32;

/// Primary key of `purchases`
pub type PurchaseId = i32;

/// Coins granted to every new account
pub const STARTING_BALANCE: i64 = 1000;
