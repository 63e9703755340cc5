//! Ledger records and read models

use serde::{Deserialize, Serialize};

use super::{AccountId, ItemId};

/// User account row from `userlist`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    /// Stored credential hash, never serialized
    pub password: String,
    pub coins: i64,
}

/// Catalog entry from `shop`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub price: i64,
}

/// Items bought by a user, grouped by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchasedItem {
    pub item_name: String,
    pub quantity: i64,
}

/// Incoming transfer joined to the sender's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReceivedCoins {
    pub source_username: String,
    pub amount: i64,
}

/// Outgoing transfer joined to the recipient's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SentCoins {
    pub destination_username: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsSummary {
    pub received_coins: Vec<ReceivedCoins>,
    pub sent_coins: Vec<SentCoins>,
}

/// Aggregated view returned by `GET /api/info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub coins: i64,
    pub purchased_items: Vec<PurchasedItem>,
    pub transactions_summary: TransactionsSummary,
}
