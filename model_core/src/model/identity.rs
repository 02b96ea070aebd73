//! Operations whose outcome depends on which rows currently exist
//!
//! Each one first tries to run as a single conditional statement. When the
//! executor declines, it runs as a read followed by a write, and the
//! read's conclusion holds only as well as the isolation of the context the
//! caller supplied.

use super::ModelBase;
use crate::context::QueryConfig;
use crate::entity::{to_record, Entity, Record};
use crate::errors::ModelError;
use crate::executor::ConditionalWrite;
use crate::query_builder::{QueryFilter, SelectQuery};
use crate::debug_log;

impl<T: Entity> ModelBase<T> {
    /// Update the row that shares `entity`'s conflict-key values, or insert
    /// `entity` when there is none
    ///
    /// Requires conflict keys; without them this fails before any I/O.
    /// When several rows already share the identity it fails with a
    /// cardinality error and writes nothing.
    /// Under concurrent callers on the two-step path, both may see no row
    /// and both insert: the result is then a duplicate row or a constraint
    /// violation from the executor.
    pub async fn upsert(&self, entity: T, config: Option<QueryConfig<'_>>) -> Result<T, ModelError> {
        let keys = self.conflict_keys.as_ref().ok_or_else(|| {
            ModelError::configuration(self.table.as_str(), "upsert requires conflict keys")
        })?;

        let external = to_record(&entity)?;
        let identity = keys.project(&external).map_err(|key| {
            ModelError::configuration(
                self.table.as_str(),
                format!("entity has no value for conflict key '{}'", key),
            )
        })?;

        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let record = self.transcoder.to_storage(external);
        let filter = QueryFilter::from(self.transcoder.to_storage(identity));
        let conflict_columns: Vec<String> =
            keys.iter().map(|key| self.transcoder.storage_key(key)).collect();

        debug_log!("[{}] upsert via {:?}: {:?}", self.table, ctx, filter);
        let write = ConditionalWrite::Upsert {
            conflict_columns: &conflict_columns,
            record: &record,
        };
        if let Some(rows) = ctx.executor().execute_conditional(&self.table, write).await? {
            return self.single_row(rows, "upsert", "the upserted row was not returned");
        }

        // Count every holder of the identity before writing anything
        let existing = ctx
            .executor()
            .select(&self.table, &SelectQuery::new(filter.clone()))
            .await?
            .len();
        match existing {
            0 => {
                ctx.executor().insert(&self.table, &record).await?;
                Ok(entity)
            }
            1 => {
                let rows = ctx.executor().update(&self.table, &filter, &record).await?;
                self.single_row(rows, "upsert", "the existing row was gone by the time it was updated")
            }
            n => Err(ModelError::cardinality(self.table.as_str(), "upsert", n)),
        }
    }

    /// Delete the single row matching `where_` and return it
    ///
    /// Fails with a cardinality error, deleting nothing, unless exactly one
    /// row matches.
    pub async fn remove_one(
        &self,
        where_: &T::Partial,
        config: Option<QueryConfig<'_>>,
    ) -> Result<T, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let filter = self.storage_filter(Some(where_))?;

        debug_log!("[{}] remove_one via {:?}: {:?}", self.table, ctx, filter);
        let write = ConditionalWrite::DeleteExactlyOne { filter: &filter };
        if let Some(mut rows) = ctx.executor().execute_conditional(&self.table, write).await? {
            if rows.len() == 1 {
                return self.decode(rows.remove(0));
            }
            // Nothing was deleted; count again so the error says what was seen
            let found = ctx
                .executor()
                .select(&self.table, &SelectQuery::new(filter))
                .await?
                .len();
            return Err(if found == 1 {
                ModelError::postcondition(
                    self.table.as_str(),
                    "remove_one",
                    "the matching rows changed while the row was being removed",
                )
            } else {
                ModelError::cardinality(self.table.as_str(), "remove_one", found)
            });
        }

        let mut captured = ctx
            .executor()
            .select(&self.table, &SelectQuery::new(filter.clone()))
            .await?;
        if captured.len() != 1 {
            return Err(ModelError::cardinality(
                self.table.as_str(),
                "remove_one",
                captured.len(),
            ));
        }
        let removed = self.decode(captured.remove(0))?;

        match ctx.executor().delete(&self.table, &filter).await? {
            1 => Ok(removed),
            0 => Err(ModelError::postcondition(
                self.table.as_str(),
                "remove_one",
                "the matching row was gone by the time it was deleted",
            )),
            n => Err(ModelError::cardinality(
                self.table.as_str(),
                "remove_one",
                n as usize,
            )),
        }
    }

    /// Delete every row matching `where_` (all rows when `None`) and return
    /// what was there
    ///
    /// The returned rows are read before the delete and follow the
    /// ordering in `config`; its limit is not applied.
    pub async fn remove_all(
        &self,
        where_: Option<&T::Partial>,
        config: Option<QueryConfig<'_>>,
    ) -> Result<Vec<T>, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let filter = self.storage_filter(where_)?;
        let query =
            SelectQuery::new(filter.clone()).order_by(self.storage_order(&config.order_by));

        debug_log!("[{}] remove_all via {:?}: {:?}", self.table, ctx, filter);
        let captured = self.decode_all(ctx.executor().select(&self.table, &query).await?)?;
        ctx.executor().delete(&self.table, &filter).await?;
        Ok(captured)
    }

    fn single_row(
        &self,
        mut rows: Vec<Record>,
        operation: &'static str,
        missing: &str,
    ) -> Result<T, ModelError> {
        match rows.len() {
            1 => self.decode(rows.remove(0)),
            0 => Err(ModelError::postcondition(self.table.as_str(), operation, missing)),
            n => Err(ModelError::cardinality(self.table.as_str(), operation, n)),
        }
    }
}
