//! Command Handlers module
//!
//! Business operations exposed to the API as two capabilities:
//! `Authorization` (sign-up, sign-in) and `Shop` (transfers, purchases,
//! summaries). The API state holds one of each.

mod commands;
mod ledger;
mod shop_handler;
mod summary_handler;
mod user_handler;

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::domain::{AccountId, OperationContext, PurchaseId, TransactionId, UserSummary};
use crate::error::AppResult;

pub use commands::*;
pub use ledger::LedgerEngine;
pub use shop_handler::ShopHandler;
pub use summary_handler::SummaryReader;
pub use user_handler::AuthHandler;

/// Account registration and credential exchange
#[async_trait]
pub trait Authorization: Send + Sync {
    /// Create an account with the starting balance; returns its id
    async fn sign_up(&self, command: CredentialsCommand) -> AppResult<AccountId>;

    /// Exchange credentials for a token, provisioning unknown usernames
    async fn sign_in(&self, command: CredentialsCommand) -> AppResult<SignInResult>;
}

/// Coin movements and the per-user summary
#[async_trait]
pub trait Shop: Send + Sync {
    async fn send_coin(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionId>;

    async fn buy_item(
        &self,
        command: PurchaseCommand,
        context: &OperationContext,
    ) -> AppResult<PurchaseId>;

    async fn user_summary(&self, account_id: AccountId) -> AppResult<UserSummary>;
}

/// Commit on success, otherwise roll back and return the original error.
pub(crate) async fn commit_or_rollback<T>(
    tx: Transaction<'_, Postgres>,
    outcome: AppResult<T>,
) -> AppResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            tracing::debug!(error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}
