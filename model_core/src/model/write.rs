use super::ModelBase;
use crate::context::QueryConfig;
use crate::entity::{Entity, Record};
use crate::errors::ModelError;
use crate::query_builder::SelectQuery;
use crate::debug_log;

impl<T: Entity> ModelBase<T> {
    /// Insert one row and hand `entity` back as given
    ///
    /// The row is not read back, so values the store assigns on insert
    /// (generated ids, default timestamps) are not in the result.
    pub async fn create(&self, entity: T, config: Option<QueryConfig<'_>>) -> Result<T, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let record = self.storage_record(&entity)?;

        debug_log!("[{}] create via {:?}", self.table, ctx);
        ctx.executor().insert(&self.table, &record).await?;
        Ok(entity)
    }

    /// Apply `what` to every row matching `where_` (all rows when `None`)
    ///
    /// Returns the updated rows; zero matches is an empty list.
    pub async fn update(
        &self,
        where_: Option<&T::Partial>,
        what: &T::Partial,
        config: Option<QueryConfig<'_>>,
    ) -> Result<Vec<T>, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let filter = self.storage_filter(where_)?;
        let values = self.update_values(what)?;

        debug_log!("[{}] update via {:?}: {:?}", self.table, ctx, filter);
        let rows = ctx.executor().update(&self.table, &filter, &values).await?;
        self.decode_all(rows)
    }

    /// Apply `what` to the single row matching `where_`
    ///
    /// Fails with a cardinality error, without writing, unless exactly one
    /// row matches. The match is counted before the write; a row that
    /// disappears in between is a postcondition failure.
    pub async fn update_one(
        &self,
        where_: &T::Partial,
        what: &T::Partial,
        config: Option<QueryConfig<'_>>,
    ) -> Result<T, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let filter = self.storage_filter(Some(where_))?;
        let values = self.update_values(what)?;

        debug_log!("[{}] update_one via {:?}: {:?}", self.table, ctx, filter);
        let matching = ctx
            .executor()
            .select(&self.table, &SelectQuery::new(filter.clone()))
            .await?;
        if matching.len() != 1 {
            return Err(ModelError::cardinality(
                self.table.as_str(),
                "update_one",
                matching.len(),
            ));
        }

        let mut rows = ctx.executor().update(&self.table, &filter, &values).await?;
        match rows.len() {
            1 => self.decode(rows.remove(0)),
            0 => Err(ModelError::postcondition(
                self.table.as_str(),
                "update_one",
                "the matching row was gone by the time it was updated",
            )),
            n => Err(ModelError::cardinality(self.table.as_str(), "update_one", n)),
        }
    }

    /// Storage-shaped update values; an empty set is rejected
    pub(crate) fn update_values(&self, what: &T::Partial) -> Result<Record, ModelError> {
        let values = self.storage_record(what)?;
        if values.is_empty() {
            return Err(ModelError::configuration(
                self.table.as_str(),
                "update needs at least one field to set",
            ));
        }
        Ok(values)
    }
}
