//! Shop Handler
//!
//! The `Shop` capability: ledger operations plus the summary read model.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{AccountId, OperationContext, PurchaseId, TransactionId, UserSummary};
use crate::error::AppResult;

use super::{LedgerEngine, PurchaseCommand, Shop, SummaryReader, TransferCommand};

#[derive(Clone)]
pub struct ShopHandler {
    ledger: LedgerEngine,
    summary: SummaryReader,
}

impl ShopHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            ledger: LedgerEngine::new(pool.clone()),
            summary: SummaryReader::new(pool),
        }
    }
}

#[async_trait]
impl Shop for ShopHandler {
    async fn send_coin(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransactionId> {
        self.ledger.transfer(command, context).await
    }

    async fn buy_item(
        &self,
        command: PurchaseCommand,
        context: &OperationContext,
    ) -> AppResult<PurchaseId> {
        self.ledger.purchase(command, context).await
    }

    async fn user_summary(&self, account_id: AccountId) -> AppResult<UserSummary> {
        self.summary.user_summary(account_id).await
    }
}
