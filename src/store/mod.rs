//! Store module
//!
//! Persistence seams used by the ledger. Every method takes the connection it
//! runs on, so a caller holding a `Transaction` can thread the same scope
//! through several stores and commit or roll back once.

mod accounts;
mod catalog;
mod transactions;

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::domain::{
    Account, AccountId, CatalogItem, ItemId, PurchaseId, PurchasedItem, ReceivedCoins, SentCoins,
    TransactionId,
};

pub use accounts::PgAccountStore;
pub use catalog::PgCatalogStore;
pub use transactions::PgTransactionLog;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),
}

/// User balance records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Current balance without locking
    async fn get_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<i64, StoreError>;

    /// Current balance, holding a row lock until the surrounding transaction ends
    async fn lock_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<i64, StoreError>;

    /// Apply `balance += delta`. Callers check sufficiency first.
    async fn adjust_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
        delta: i64,
    ) -> Result<(), StoreError>;

    async fn create_account(
        &self,
        conn: &mut PgConnection,
        username: &str,
        credential_hash: &str,
        starting_balance: i64,
    ) -> Result<AccountId, StoreError>;

    async fn find_by_name(
        &self,
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Account, StoreError>;

    async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Account, StoreError>;
}

/// Read-only merch catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_item_by_name(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<CatalogItem, StoreError>;
}

/// Append-only record of transfers and purchases, plus the per-user
/// aggregates built from it.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn append_transfer(
        &self,
        conn: &mut PgConnection,
        source: AccountId,
        destination: AccountId,
        amount: i64,
    ) -> Result<TransactionId, StoreError>;

    async fn append_purchase(
        &self,
        conn: &mut PgConnection,
        buyer: AccountId,
        item_id: ItemId,
        price: i64,
    ) -> Result<PurchaseId, StoreError>;

    async fn purchased_items(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<PurchasedItem>, StoreError>;

    async fn received_coins(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<ReceivedCoins>, StoreError>;

    async fn sent_coins(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<SentCoins>, StoreError>;
}

/// Check for PostgreSQL `unique_violation`
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
