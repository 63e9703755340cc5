//! Identity module
//!
//! Credential hashing and bearer token handling behind a small strategy
//! trait. The ledger never sees tokens or hashes, only account ids.

mod jwt;
mod password;

pub use jwt::{Claims, JwtIdentity};
pub use password::{hash_password, verify_password};

use crate::domain::AccountId;

/// Identity errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Failed to issue token: {0}")]
    Signing(String),
}

/// Pluggable credential and token strategy.
pub trait IdentityProvider: Send + Sync {
    /// Produce a one-way hash suitable for storage
    fn hash_credential(&self, password: &str) -> String;

    /// Check a plain password against a stored hash
    fn verify_credential(&self, password: &str, stored_hash: &str) -> bool;

    /// Issue a bearer token for an account
    fn issue_token(&self, account_id: AccountId) -> Result<String, IdentityError>;

    /// Resolve a bearer token back to its account
    fn resolve_token(&self, token: &str) -> Result<AccountId, IdentityError>;
}
