//! Shared API state

use std::sync::Arc;

use sqlx::PgPool;

use crate::handlers::{AuthHandler, Authorization, Shop, ShopHandler};
use crate::identity::IdentityProvider;

/// Capabilities available to request handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn Authorization>,
    pub shop: Arc<dyn Shop>,
    /// Resolves bearer tokens in the auth middleware
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn Authorization>,
        shop: Arc<dyn Shop>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            auth,
            shop,
            identity,
        }
    }

    /// State wired to the PostgreSQL-backed handlers
    pub fn from_pool(pool: PgPool, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::new(
            Arc::new(AuthHandler::new(pool.clone(), identity.clone())),
            Arc::new(ShopHandler::new(pool)),
            identity,
        )
    }
}
