//! Core ModelBase functionality
//!
//! This module contains the `Database` bootstrap: it owns the connection
//! pool, hands out the shared executor, builds models over it, and opens
//! transactions for callers that need several model calls to be atomic.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ModelBaseError;
use config::{AppConfig, DatabaseConfig, ExecutorConfig};
use model_core::{Entity, ModelBase, PgExecutor, PgTransaction, QueryExecutor};

/// Connection pool plus the executor every model built from it shares
pub struct Database {
    executor: Arc<PgExecutor>,
}

impl Database {
    /// Connect with default executor settings
    pub async fn connect(config: DatabaseConfig) -> Result<Self, ModelBaseError> {
        Self::connect_with(config, ExecutorConfig::default()).await
    }

    /// Connect using a loaded application configuration
    pub async fn from_config(config: AppConfig) -> Result<Self, ModelBaseError> {
        Self::connect_with(config.database, config.executor).await
    }

    async fn connect_with(
        config: DatabaseConfig,
        executor_config: ExecutorConfig,
    ) -> Result<Self, ModelBaseError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        let pool = pool_options.connect(&connection_string).await?;
        tracing::info!(
            host = %config.host,
            database = %config.database,
            atomic_writes = executor_config.atomic_writes,
            "connected to PostgreSQL"
        );

        Ok(Self::from_pool(pool, executor_config))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, executor_config: ExecutorConfig) -> Self {
        let executor = PgExecutor::new(pool).with_atomic_writes(executor_config.atomic_writes);
        Self {
            executor: Arc::new(executor),
        }
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        self.executor.pool()
    }

    /// The executor models built here use by default
    pub fn executor(&self) -> Arc<dyn QueryExecutor> {
        self.executor.clone()
    }

    /// Build a model over `table` on this database
    pub fn model<T: Entity>(
        &self,
        table: &str,
        conflict_keys: &[&str],
    ) -> Result<ModelBase<T>, ModelBaseError> {
        Ok(ModelBase::new(self.executor(), table, conflict_keys)?)
    }

    /// Build a model from the table and conflict keys declared on `T`
    pub fn model_for<T: Entity>(&self) -> Result<ModelBase<T>, ModelBaseError> {
        Ok(ModelBase::for_entity(self.executor())?)
    }

    /// Begin a transaction to pass to model calls via `QueryConfig::transaction`
    pub async fn begin(&self) -> Result<PgTransaction, ModelBaseError> {
        Ok(self.executor.begin().await?)
    }

    /// Check that the database answers
    pub async fn health_check(&self) -> Result<(), ModelBaseError> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("executor", &self.executor)
            .finish()
    }
}
