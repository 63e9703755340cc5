//! Sign-up / Sign-in Handler
//!
//! Account creation and token issuance on top of the account store and the
//! identity provider.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::domain::{Account, AccountId, DomainError, STARTING_BALANCE};
use crate::error::{AppError, AppResult};
use crate::identity::IdentityProvider;
use crate::store::{AccountStore, PgAccountStore, StoreError};

use super::{Authorization, CredentialsCommand, SignInResult};

/// Handler for the `Authorization` capability
#[derive(Clone)]
pub struct AuthHandler {
    pool: PgPool,
    accounts: Arc<dyn AccountStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AuthHandler {
    pub fn new(pool: PgPool, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            pool,
            accounts: Arc::new(PgAccountStore),
            identity,
        }
    }

    async fn provision(
        &self,
        conn: &mut PgConnection,
        command: &CredentialsCommand,
    ) -> AppResult<AccountId> {
        let credential_hash = self.identity.hash_credential(&command.password);
        let account_id = self
            .accounts
            .create_account(conn, &command.username, &credential_hash, STARTING_BALANCE)
            .await?;

        tracing::info!(account_id, username = %command.username, "Account created");
        Ok(account_id)
    }

    fn authenticate(&self, account: &Account, password: &str) -> AppResult<SignInResult> {
        if !self.identity.verify_credential(password, &account.password) {
            tracing::warn!(account_id = account.id, "Sign-in rejected: wrong password");
            return Err(DomainError::InvalidCredentials.into());
        }

        Ok(SignInResult {
            id: None,
            token: self.identity.issue_token(account.id)?,
        })
    }
}

#[async_trait]
impl Authorization for AuthHandler {
    async fn sign_up(&self, command: CredentialsCommand) -> AppResult<AccountId> {
        command.validate()?;

        let mut conn = self.pool.acquire().await?;
        self.provision(&mut *conn, &command).await
    }

    async fn sign_in(&self, command: CredentialsCommand) -> AppResult<SignInResult> {
        command.validate()?;

        let mut conn = self.pool.acquire().await?;
        match self.accounts.find_by_name(&mut *conn, &command.username).await {
            Ok(account) => self.authenticate(&account, &command.password),
            Err(StoreError::AccountNotFound(_)) => {
                match self.provision(&mut *conn, &command).await {
                    Ok(account_id) => Ok(SignInResult {
                        id: Some(account_id),
                        token: self.identity.issue_token(account_id)?,
                    }),
                    // A concurrent first sign-in created the account first
                    Err(AppError::Domain(DomainError::UsernameTaken(_))) => {
                        let account = self
                            .accounts
                            .find_by_name(&mut *conn, &command.username)
                            .await?;
                        self.authenticate(&account, &command.password)
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}
