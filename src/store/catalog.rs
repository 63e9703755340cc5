//! PostgreSQL catalog store backed by `shop`.

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::domain::CatalogItem;

use super::{CatalogStore, StoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct PgCatalogStore;

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_item_by_name(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<CatalogItem, StoreError> {
        let item: Option<CatalogItem> =
            sqlx::query_as("SELECT id, name, price FROM shop WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut *conn)
                .await?;

        item.ok_or_else(|| StoreError::ItemNotFound(name.to_string()))
    }
}
