//! PostgreSQL transaction log backed by `transactions` and `purchases`.

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::domain::{
    AccountId, ItemId, PurchaseId, PurchasedItem, ReceivedCoins, SentCoins, TransactionId,
};

use super::{StoreError, TransactionLog};

#[derive(Debug, Clone, Copy, Default)]
pub struct PgTransactionLog;

#[async_trait]
impl TransactionLog for PgTransactionLog {
    async fn append_transfer(
        &self,
        conn: &mut PgConnection,
        source: AccountId,
        destination: AccountId,
        amount: i64,
    ) -> Result<TransactionId, StoreError> {
        let id: TransactionId = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (source, destination, amount, transaction_time)
            VALUES ($1, $2, $3, NOW())
            RETURNING id
            "#,
        )
        .bind(source)
        .bind(destination)
        .bind(amount)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    async fn append_purchase(
        &self,
        conn: &mut PgConnection,
        buyer: AccountId,
        item_id: ItemId,
        price: i64,
    ) -> Result<PurchaseId, StoreError> {
        let id: PurchaseId = sqlx::query_scalar(
            r#"
            INSERT INTO purchases (user_id, item_id, price, purchase_date)
            VALUES ($1, $2, $3, NOW())
            RETURNING id
            "#,
        )
        .bind(buyer)
        .bind(item_id)
        .bind(price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    async fn purchased_items(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<PurchasedItem>, StoreError> {
        let items = sqlx::query_as(
            r#"
            SELECT s.name AS item_name, COUNT(*) AS quantity
            FROM purchases p
            JOIN shop s ON p.item_id = s.id
            WHERE p.user_id = $1
            GROUP BY s.name
            ORDER BY s.name
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    async fn received_coins(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<ReceivedCoins>, StoreError> {
        let received = sqlx::query_as(
            r#"
            SELECT u.username AS source_username, t.amount
            FROM transactions t
            JOIN userlist u ON t.source = u.id
            WHERE t.destination = $1
            ORDER BY t.id
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(received)
    }

    async fn sent_coins(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> Result<Vec<SentCoins>, StoreError> {
        let sent = sqlx::query_as(
            r#"
            SELECT d.username AS destination_username, t.amount
            FROM transactions t
            JOIN userlist d ON t.destination = d.id
            WHERE t.source = $1
            ORDER BY t.id
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(sent)
    }
}
