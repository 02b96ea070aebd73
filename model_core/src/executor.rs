//! The query execution capability a model runs against
//!
//! A model never talks to a database directly. It hands storage-shaped
//! requests to a [`QueryExecutor`], which may be a connection pool, a
//! caller-owned transaction, or an in-memory table set. All field names on
//! this boundary are storage names.

use crate::entity::Record;
use crate::errors::ModelError;
use crate::query_builder::{QueryFilter, SelectQuery};
use crate::validation::ValidatedTableName;
use async_trait::async_trait;

/// A write whose outcome depends on the current table state
///
/// Executors that can express one of these as a single atomic statement do
/// so; the others decline and the model falls back to a read followed by a
/// write.
#[derive(Debug, Clone, Copy)]
pub enum ConditionalWrite<'a> {
    /// Insert `record`, or overwrite the row that has the same values in
    /// `conflict_columns`. Yields the surviving row.
    Upsert {
        conflict_columns: &'a [String],
        record: &'a Record,
    },
    /// Delete the rows matching `filter` only if there is exactly one.
    /// Yields the deleted row, or nothing when the count was not one.
    DeleteExactlyOne { filter: &'a QueryFilter },
}

impl ConditionalWrite<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ConditionalWrite::Upsert { .. } => "upsert",
            ConditionalWrite::DeleteExactlyOne { .. } => "delete_exactly_one",
        }
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Read rows matching the query
    async fn select(
        &self,
        table: &ValidatedTableName,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, ModelError>;

    /// Insert one row
    async fn insert(&self, table: &ValidatedTableName, record: &Record) -> Result<(), ModelError>;

    /// Apply `values` to every row matching `filter`, returning the rows as updated
    async fn update(
        &self,
        table: &ValidatedTableName,
        filter: &QueryFilter,
        values: &Record,
    ) -> Result<Vec<Record>, ModelError>;

    /// Delete every row matching `filter`, returning how many went away
    async fn delete(&self, table: &ValidatedTableName, filter: &QueryFilter) -> Result<u64, ModelError>;

    /// Run a conditional write as one statement
    ///
    /// `Ok(None)` means the executor does not support it.
    async fn execute_conditional(
        &self,
        _table: &ValidatedTableName,
        _write: ConditionalWrite<'_>,
    ) -> Result<Option<Vec<Record>>, ModelError> {
        Ok(None)
    }

    /// Short label used in log lines
    fn describe(&self) -> &'static str;
}
