//! Command definitions
//!
//! Commands represent intentions to change the system state. Each one
//! validates its own input before any database work starts.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, Coins, DomainError};

/// Username/password pair for sign-up and sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsCommand {
    pub username: String,
    pub password: String,
}

impl CredentialsCommand {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.username.trim().is_empty() {
            return Err(DomainError::Validation("username must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(DomainError::Validation("password must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Command to send coins to another user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    /// Sender, taken from the authenticated request
    pub source_id: AccountId,
    /// Recipient username (resolved to an account inside the transaction)
    pub destination_username: String,
    pub amount: i64,
}

impl TransferCommand {
    pub fn new(source_id: AccountId, destination_username: impl Into<String>, amount: i64) -> Self {
        Self {
            source_id,
            destination_username: destination_username.into(),
            amount,
        }
    }

    /// Check preconditions and return the validated amount
    pub fn validate(&self) -> Result<Coins, DomainError> {
        if self.destination_username.trim().is_empty() {
            return Err(DomainError::Validation(
                "destination_username must not be empty".to_string(),
            ));
        }
        Ok(Coins::new(self.amount)?)
    }
}

/// Command to buy one catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCommand {
    pub buyer_id: AccountId,
    pub item_name: String,
}

impl PurchaseCommand {
    pub fn new(buyer_id: AccountId, item_name: impl Into<String>) -> Self {
        Self {
            buyer_id,
            item_name: item_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.item_name.trim().is_empty() {
            return Err(DomainError::Validation("item name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Result of a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResult {
    /// Set only when the account was provisioned by this sign-in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<AccountId>,
    pub token: String,
}
