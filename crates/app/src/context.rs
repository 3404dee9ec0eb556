//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::DatabaseConfig,
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        orders::{
            OrderLifecycleService, OrdersService, PgOrderLifecycleService, PgOrdersService,
        },
        payments::{PaymentsService, PgPaymentsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub lifecycle: Arc<dyn OrderLifecycleService>,
    pub payments: Arc<dyn PaymentsService>,
}

impl AppContext {
    /// Build application context from database settings.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url, config.max_connections)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool).with_statement_timeout(config.statement_timeout_ms);

        Ok(Self::from_db(db))
    }

    #[must_use]
    pub fn from_db(db: Db) -> Self {
        Self {
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            lifecycle: Arc::new(PgOrderLifecycleService::new(db.clone())),
            payments: Arc::new(PgPaymentsService::new(db)),
        }
    }
}
