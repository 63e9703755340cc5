//! PostgreSQL account store backed by `userlist`.

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::domain::{Account, AccountId};

use super::{is_unique_violation, AccountStore, StoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct PgAccountStore;

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<i64, StoreError> {
        let coins: Option<i64> = sqlx::query_scalar("SELECT coins FROM userlist WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&mut *conn)
            .await?;

        coins.ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))
    }

    async fn lock_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<i64, StoreError> {
        let coins: Option<i64> =
            sqlx::query_scalar("SELECT coins FROM userlist WHERE id = $1 FOR UPDATE")
                .bind(account_id)
                .fetch_optional(&mut *conn)
                .await?;

        coins.ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))
    }

    async fn adjust_balance(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
        delta: i64,
    ) -> Result<(), StoreError> {
        let rows_affected = sqlx::query("UPDATE userlist SET coins = coins + $1 WHERE id = $2")
            .bind(delta)
            .bind(account_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::AccountNotFound(account_id.to_string()));
        }

        Ok(())
    }

    async fn create_account(
        &self,
        conn: &mut PgConnection,
        username: &str,
        credential_hash: &str,
        starting_balance: i64,
    ) -> Result<AccountId, StoreError> {
        let result = sqlx::query_scalar(
            r#"
            INSERT INTO userlist (username, password, coins)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(credential_hash)
        .bind(starting_balance)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => Err(StoreError::UsernameTaken(username.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_name(
        &self,
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Account, StoreError> {
        let account: Option<Account> = sqlx::query_as(
            "SELECT id, username, password, coins FROM userlist WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;

        account.ok_or_else(|| StoreError::AccountNotFound(username.to_string()))
    }

    async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Account, StoreError> {
        let account: Option<Account> =
            sqlx::query_as("SELECT id, username, password, coins FROM userlist WHERE id = $1")
                .bind(account_id)
                .fetch_optional(&mut *conn)
                .await?;

        account.ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))
    }
}
