//! Process-wide PostgreSQL pool.
//!
//! The pool is created once at startup, handed to request handlers by value
//! (`PgPool` is reference counted), and closed once at shutdown. Entities
//! borrow a connection from it for one statement at a time.

mod error;

pub use error::{OperationKind, StoreError};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Clone, Default)]
pub struct Store {
    pool: Option<PgPool>,
}

impl Store {
    /// Open the pool described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "Database connected");
        Ok(Self { pool: Some(pool) })
    }

    /// Wrap an existing pool (tests, tooling).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool: Some(pool) }
    }

    /// A store that was never connected. Every execute fails with
    /// `StoreError::NotConnected`.
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.pool.as_ref().is_some_and(|pool| !pool.is_closed())
    }

    pub fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool.as_ref().ok_or(StoreError::NotConnected)
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(self.pool()?).await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn disconnect(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Database disconnected");
        }
    }
}
