use super::statements::{execute, fetch_records};
use super::transaction::PgTransaction;
use crate::entity::Record;
use crate::errors::ModelError;
use crate::executor::{ConditionalWrite, QueryExecutor};
use crate::query_builder::{QueryFilter, SelectQuery, SqlGenerator, Statement};
use crate::validation::ValidatedTableName;
use crate::DbPool;
use async_trait::async_trait;

/// Query executor backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgExecutor {
    pub(crate) db_pool: DbPool,
    pub(crate) atomic_writes: bool,
}

impl std::fmt::Debug for PgExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExecutor")
            .field("pool_size", &self.db_pool.size())
            .field("atomic_writes", &self.atomic_writes)
            .finish()
    }
}

impl PgExecutor {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            db_pool,
            atomic_writes: false,
        }
    }

    /// Compile upsert and single-row removal into one statement each
    ///
    /// Upsert uses `ON CONFLICT`, so the table needs a unique constraint or
    /// index over exactly the model's conflict keys.
    pub fn with_atomic_writes(mut self, atomic_writes: bool) -> Self {
        self.atomic_writes = atomic_writes;
        self
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &DbPool {
        &self.db_pool
    }

    /// Begin a new database transaction
    ///
    /// The returned handle is itself a [`QueryExecutor`]; pass it to model
    /// calls through `QueryConfig::transaction`, then commit or roll back.
    pub async fn begin(&self) -> Result<PgTransaction, ModelError> {
        let tx = self.db_pool.begin().await?;
        Ok(PgTransaction::new(tx, self.atomic_writes))
    }
}

/// Statement for a conditional write, when enabled
pub(crate) fn conditional_statement(
    atomic_writes: bool,
    table: &ValidatedTableName,
    write: ConditionalWrite<'_>,
) -> Result<Option<Statement>, ModelError> {
    if !atomic_writes {
        return Ok(None);
    }
    let statement = match write {
        ConditionalWrite::Upsert {
            conflict_columns,
            record,
        } => SqlGenerator::upsert(table, conflict_columns, record)?,
        ConditionalWrite::DeleteExactlyOne { filter } => {
            SqlGenerator::delete_exactly_one(table, filter)?
        }
    };
    Ok(Some(statement))
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn select(
        &self,
        table: &ValidatedTableName,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, ModelError> {
        fetch_records(&self.db_pool, SqlGenerator::select(table, query)?).await
    }

    async fn insert(&self, table: &ValidatedTableName, record: &Record) -> Result<(), ModelError> {
        execute(&self.db_pool, SqlGenerator::insert(table, record)?).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &ValidatedTableName,
        filter: &QueryFilter,
        values: &Record,
    ) -> Result<Vec<Record>, ModelError> {
        fetch_records(&self.db_pool, SqlGenerator::update(table, filter, values)?).await
    }

    async fn delete(&self, table: &ValidatedTableName, filter: &QueryFilter) -> Result<u64, ModelError> {
        execute(&self.db_pool, SqlGenerator::delete(table, filter)?).await
    }

    async fn execute_conditional(
        &self,
        table: &ValidatedTableName,
        write: ConditionalWrite<'_>,
    ) -> Result<Option<Vec<Record>>, ModelError> {
        match conditional_statement(self.atomic_writes, table, write)? {
            Some(statement) => Ok(Some(fetch_records(&self.db_pool, statement).await?)),
            None => Ok(None),
        }
    }

    fn describe(&self) -> &'static str {
        "postgres pool"
    }
}
