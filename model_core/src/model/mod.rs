//! The generic per-table model
//!
//! A [`ModelBase`] binds one entity type to one table, one default executor
//! and an optional conflict-key policy. Every operation transcodes its input
//! to storage names, hands a storage-shaped request to the resolved
//! executor, and transcodes every returned row back before decoding it.

mod identity;
mod read;
mod write;

#[cfg(test)]
mod tests;

use crate::conflict_keys::ConflictKeys;
use crate::context::ExecutionContext;
use crate::entity::{from_record, to_record, Entity, Record};
use crate::errors::ModelError;
use crate::executor::QueryExecutor;
use crate::query_builder::{OrderSpec, QueryFilter};
use crate::transcoder::{CaseTranscoder, FieldTranscoder};
use crate::validation::ValidatedTableName;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// CRUD engine over one table
///
/// Immutable after construction; cloning shares the executor and transcoder.
///
/// ```ignore
/// let users = ModelBase::<User>::new(executor.clone(), "users", &["email"])?;
///
/// users.create(user, None).await?;
/// let jo = users
///     .fetch_one(&UserPartial::new().first_name("Jo"), None)
///     .await?;
/// ```
pub struct ModelBase<T: Entity> {
    executor: Arc<dyn QueryExecutor>,
    table: ValidatedTableName,
    conflict_keys: Option<ConflictKeys>,
    transcoder: Arc<dyn FieldTranscoder>,
    _phantom: PhantomData<T>,
}

impl<T: Entity> Clone for ModelBase<T> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            table: self.table.clone(),
            conflict_keys: self.conflict_keys.clone(),
            transcoder: Arc::clone(&self.transcoder),
            _phantom: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for ModelBase<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBase")
            .field("table", &self.table.as_str())
            .field("conflict_keys", &self.conflict_keys)
            .field("executor", &self.executor.describe())
            .finish()
    }
}

impl<T: Entity> ModelBase<T> {
    /// Build a model over `table`
    ///
    /// `conflict_keys` are external field names of `T`; pass an empty slice
    /// for a model that never upserts.
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        table: &str,
        conflict_keys: &[&str],
    ) -> Result<Self, ModelError> {
        let table = ValidatedTableName::new(table)?;

        let conflict_keys = ConflictKeys::new(conflict_keys.iter().copied()).map_err(|key| {
            ModelError::configuration(
                table.as_str(),
                format!("conflict key '{}' is listed more than once", key),
            )
        })?;

        if let Some(keys) = &conflict_keys {
            let declared = T::field_names();
            if let Some(unknown) = keys.iter().find(|key| !declared.contains(key)) {
                return Err(ModelError::configuration(
                    table.as_str(),
                    format!("conflict key '{}' is not a field of the entity", unknown),
                ));
            }
        }

        Ok(Self {
            executor,
            table,
            conflict_keys,
            transcoder: Arc::new(CaseTranscoder::default()),
            _phantom: PhantomData,
        })
    }

    /// Build a model from the table and conflict keys declared on `T`
    pub fn for_entity(executor: Arc<dyn QueryExecutor>) -> Result<Self, ModelError> {
        let table = T::table_name().ok_or_else(|| {
            ModelError::configuration(
                std::any::type_name::<T>(),
                "entity declares no table name; use ModelBase::new",
            )
        })?;
        Self::new(executor, table, T::conflict_keys())
    }

    /// Substitute the naming conventions used between callers and storage
    pub fn with_transcoder(mut self, transcoder: impl FieldTranscoder + 'static) -> Self {
        self.transcoder = Arc::new(transcoder);
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    pub fn conflict_keys(&self) -> Option<&ConflictKeys> {
        self.conflict_keys.as_ref()
    }

    /// The executor used when no transaction is supplied
    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    pub(crate) fn context<'a>(
        &'a self,
        transaction: Option<&'a dyn QueryExecutor>,
    ) -> ExecutionContext<'a> {
        ExecutionContext::resolve(self.executor.as_ref(), transaction)
    }

    /// Serialize and rename a caller value into storage shape
    pub(crate) fn storage_record<V: Serialize + ?Sized>(&self, value: &V) -> Result<Record, ModelError> {
        Ok(self.transcoder.to_storage(to_record(value)?))
    }

    /// Storage predicate built only from the fields present in `where_`
    pub(crate) fn storage_filter(&self, where_: Option<&T::Partial>) -> Result<QueryFilter, ModelError> {
        match where_ {
            Some(partial) => Ok(QueryFilter::from(self.storage_record(partial)?)),
            None => Ok(QueryFilter::new()),
        }
    }

    pub(crate) fn storage_order(&self, order_by: &OrderSpec) -> OrderSpec {
        order_by.map_fields(|field| self.transcoder.storage_key(field))
    }

    pub(crate) fn decode(&self, row: Record) -> Result<T, ModelError> {
        from_record(self.transcoder.to_external(row))
    }

    pub(crate) fn decode_all(&self, rows: Vec<Record>) -> Result<Vec<T>, ModelError> {
        rows.into_iter().map(|row| self.decode(row)).collect()
    }
}
