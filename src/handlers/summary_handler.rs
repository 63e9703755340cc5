//! Summary Reader
//!
//! Builds the `UserSummary` read model from the account row and the
//! transaction log.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{AccountId, TransactionsSummary, UserSummary};
use crate::error::AppResult;
use crate::store::{AccountStore, PgAccountStore, PgTransactionLog, TransactionLog};

use super::commit_or_rollback;

#[derive(Clone)]
pub struct SummaryReader {
    pool: PgPool,
    accounts: Arc<dyn AccountStore>,
    log: Arc<dyn TransactionLog>,
}

impl SummaryReader {
    pub fn new(pool: PgPool) -> Self {
        Self::with_stores(pool, Arc::new(PgAccountStore), Arc::new(PgTransactionLog))
    }

    pub fn with_stores(
        pool: PgPool,
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn TransactionLog>,
    ) -> Self {
        Self {
            pool,
            accounts,
            log,
        }
    }

    /// Balance, purchases and transfer history for one account.
    ///
    /// All reads share one read-only snapshot.
    pub async fn user_summary(&self, account_id: AccountId) -> AppResult<UserSummary> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let outcome = self.read_summary(&mut tx, account_id).await;
        let summary = commit_or_rollback(tx, outcome).await?;

        tracing::debug!(
            account_id,
            purchases = summary.purchased_items.len(),
            received = summary.transactions_summary.received_coins.len(),
            sent = summary.transactions_summary.sent_coins.len(),
            "User summary loaded"
        );

        Ok(summary)
    }

    async fn read_summary(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account_id: AccountId,
    ) -> AppResult<UserSummary> {
        let account = self.accounts.find_by_id(&mut **tx, account_id).await?;
        let purchased_items = self.log.purchased_items(&mut **tx, account_id).await?;
        let received_coins = self.log.received_coins(&mut **tx, account_id).await?;
        let sent_coins = self.log.sent_coins(&mut **tx, account_id).await?;

        Ok(UserSummary {
            username: account.username,
            coins: account.coins,
            purchased_items,
            transactions_summary: TransactionsSummary {
                received_coins,
                sent_coins,
            },
        })
    }
}
