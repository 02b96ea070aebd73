//! Caller-owned transaction handle
//!
//! Models never open, commit, or roll back transactions. The caller begins
//! one, threads it through every call of the unit of work, and finishes it.

use super::executor::conditional_statement;
use super::statements::{execute, fetch_records};
use crate::entity::Record;
use crate::errors::ModelError;
use crate::executor::{ConditionalWrite, QueryExecutor};
use crate::query_builder::{QueryFilter, SelectQuery, SqlGenerator};
use crate::validation::ValidatedTableName;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

/// A PostgreSQL transaction usable as a [`QueryExecutor`]
///
/// # Example
/// ```ignore
/// let tx = executor.begin().await?;
///
/// let config = || QueryConfig::new().transaction(&tx);
/// accounts.update_one(&from, &debit, Some(config())).await?;
/// accounts.update_one(&to, &credit, Some(config())).await?;
///
/// tx.commit().await?;
/// ```
pub struct PgTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
    atomic_writes: bool,
}

impl PgTransaction {
    pub(crate) fn new(tx: Transaction<'static, Postgres>, atomic_writes: bool) -> Self {
        Self {
            tx: Mutex::new(tx),
            atomic_writes,
        }
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<(), ModelError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<(), ModelError> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }
}

impl std::fmt::Debug for PgTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTransaction")
            .field("atomic_writes", &self.atomic_writes)
            .finish()
    }
}

#[async_trait]
impl QueryExecutor for PgTransaction {
    async fn select(
        &self,
        table: &ValidatedTableName,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, ModelError> {
        let statement = SqlGenerator::select(table, query)?;
        let mut tx = self.tx.lock().await;
        fetch_records(&mut **tx, statement).await
    }

    async fn insert(&self, table: &ValidatedTableName, record: &Record) -> Result<(), ModelError> {
        let statement = SqlGenerator::insert(table, record)?;
        let mut tx = self.tx.lock().await;
        execute(&mut **tx, statement).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &ValidatedTableName,
        filter: &QueryFilter,
        values: &Record,
    ) -> Result<Vec<Record>, ModelError> {
        let statement = SqlGenerator::update(table, filter, values)?;
        let mut tx = self.tx.lock().await;
        fetch_records(&mut **tx, statement).await
    }

    async fn delete(&self, table: &ValidatedTableName, filter: &QueryFilter) -> Result<u64, ModelError> {
        let statement = SqlGenerator::delete(table, filter)?;
        let mut tx = self.tx.lock().await;
        execute(&mut **tx, statement).await
    }

    async fn execute_conditional(
        &self,
        table: &ValidatedTableName,
        write: ConditionalWrite<'_>,
    ) -> Result<Option<Vec<Record>>, ModelError> {
        let Some(statement) = conditional_statement(self.atomic_writes, table, write)? else {
            return Ok(None);
        };
        let mut tx = self.tx.lock().await;
        Ok(Some(fetch_records(&mut **tx, statement).await?))
    }

    fn describe(&self) -> &'static str {
        "postgres transaction"
    }
}
