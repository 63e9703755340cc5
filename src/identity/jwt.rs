//! HS256 JWT identity provider.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::AccountId;

use super::{password, IdentityError, IdentityProvider};

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: AccountId,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct JwtIdentity {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtIdentity {
    pub fn new(signing_key: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            ttl,
        }
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, IdentityError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| IdentityError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for JwtIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentity")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl IdentityProvider for JwtIdentity {
    fn hash_credential(&self, password: &str) -> String {
        password::hash_password(password)
    }

    fn verify_credential(&self, password: &str, stored_hash: &str) -> bool {
        password::verify_password(password, stored_hash)
    }

    fn issue_token(&self, account_id: AccountId) -> Result<String, IdentityError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: account_id,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        self.encode_claims(&claims)
    }

    fn resolve_token(&self, token: &str) -> Result<AccountId, IdentityError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        Ok(data.claims.user_id)
    }
}
