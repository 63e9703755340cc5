//! Ledger Engine
//!
//! Runs coin transfers and purchases as single database transactions.
//!
//! Every balance that feeds a sufficiency decision is read with
//! `SELECT ... FOR UPDATE`, so the check and the write it guards cannot
//! interleave with another transaction touching the same row. Any failure
//! rolls the whole transaction back before the error is returned.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{
    AccountId, Balance, Coins, DomainError, OperationContext, PurchaseId, TransactionId,
};
use crate::error::{AppError, AppResult};
use crate::store::{
    AccountStore, CatalogStore, PgAccountStore, PgCatalogStore, PgTransactionLog, StoreError,
    TransactionLog,
};

use super::{commit_or_rollback, PurchaseCommand, TransferCommand};

/// Coin ledger over the account, catalog and log stores
#[derive(Clone)]
pub struct LedgerEngine {
    pool: PgPool,
    accounts: Arc<dyn AccountStore>,
    catalog: Arc<dyn CatalogStore>,
    log: Arc<dyn TransactionLog>,
}

impl LedgerEngine {
    /// Engine backed by the PostgreSQL stores
    pub fn new(pool: PgPool) -> Self {
        Self::with_stores(
            pool,
            Arc::new(PgAccountStore),
            Arc::new(PgCatalogStore),
            Arc::new(PgTransactionLog),
        )
    }

    pub fn with_stores(
        pool: PgPool,
        accounts: Arc<dyn AccountStore>,
        catalog: Arc<dyn CatalogStore>,
        log: Arc<dyn TransactionLog>,
    ) -> Self {
        Self {
            pool,
            accounts,
            catalog,
            log,
        }
    }

    // =========================================================================
    // Transfer
    // =========================================================================

    /// Move `amount` coins from the source account to the named user.
    ///
    /// Returns the id of the new `transactions` row.
    pub async fn transfer(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionId> {
        let amount = command.validate()?;

        let mut tx = self.pool.begin().await?;
        let outcome = self.transfer_in(&mut tx, &command, amount).await;
        let transaction_id = commit_or_rollback(tx, outcome).await?;

        tracing::info!(
            transaction_id,
            source_id = command.source_id,
            destination = %command.destination_username,
            amount = amount.value(),
            correlation_id = ?context.correlation_id,
            "Coins transferred"
        );

        Ok(transaction_id)
    }

    async fn transfer_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        command: &TransferCommand,
        amount: Coins,
    ) -> AppResult<TransactionId> {
        let source_id = command.source_id;

        let destination_id = self
            .accounts
            .find_by_name(&mut **tx, &command.destination_username)
            .await
            .map_err(|e| match e {
                StoreError::AccountNotFound(_) => AppError::from(DomainError::UserNotFound(
                    command.destination_username.clone(),
                )),
                other => AppError::from(other),
            })?
            .id;

        if destination_id == source_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        // Lock in ascending id order so crossing transfers cannot deadlock
        let mut source_coins = 0;
        for account_id in lock_order(source_id, destination_id) {
            let coins = self.accounts.lock_balance(&mut **tx, account_id).await?;
            if account_id == source_id {
                source_coins = coins;
            }
        }

        ensure_sufficient(source_coins, &amount)?;

        self.accounts
            .adjust_balance(&mut **tx, destination_id, amount.value())
            .await?;
        self.accounts
            .adjust_balance(&mut **tx, source_id, -amount.value())
            .await?;

        let transaction_id = self
            .log
            .append_transfer(&mut **tx, source_id, destination_id, amount.value())
            .await?;

        Ok(transaction_id)
    }

    // =========================================================================
    // Purchase
    // =========================================================================

    /// Buy one unit of the named catalog item.
    ///
    /// Returns the id of the new `purchases` row.
    pub async fn purchase(
        &self,
        command: PurchaseCommand,
        context: &OperationContext,
    ) -> AppResult<PurchaseId> {
        command.validate()?;

        let mut tx = self.pool.begin().await?;
        let outcome = self.purchase_in(&mut tx, &command).await;
        let purchase_id = commit_or_rollback(tx, outcome).await?;

        tracing::info!(
            purchase_id,
            buyer_id = command.buyer_id,
            item = %command.item_name,
            correlation_id = ?context.correlation_id,
            "Item purchased"
        );

        Ok(purchase_id)
    }

    async fn purchase_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        command: &PurchaseCommand,
    ) -> AppResult<PurchaseId> {
        let item = self
            .catalog
            .find_item_by_name(&mut **tx, &command.item_name)
            .await?;
        let price = Coins::new(item.price).map_err(DomainError::from)?;

        let coins = self.accounts.lock_balance(&mut **tx, command.buyer_id).await?;
        ensure_sufficient(coins, &price)?;

        let purchase_id = self
            .log
            .append_purchase(&mut **tx, command.buyer_id, item.id, price.value())
            .await?;

        self.accounts
            .adjust_balance(&mut **tx, command.buyer_id, -price.value())
            .await?;

        Ok(purchase_id)
    }
}

/// The two accounts of a transfer, smallest id first
fn lock_order(a: AccountId, b: AccountId) -> [AccountId; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

fn ensure_sufficient(coins: i64, amount: &Coins) -> Result<(), DomainError> {
    let balance = Balance::new(coins)?;
    if !balance.is_sufficient_for(amount) {
        return Err(DomainError::insufficient_funds(amount.value(), balance.value()));
    }
    Ok(())
}
