use super::ModelBase;
use crate::context::{ExecutionContext, QueryConfig};
use crate::entity::{Entity, Record};
use crate::errors::ModelError;
use crate::query_builder::{QueryFilter, SelectQuery};
use crate::debug_log;

impl<T: Entity> ModelBase<T> {
    /// Read every row matching `where_`, or every row when it is `None`
    ///
    /// Ordering and limit come from `config`. Zero matches is an empty list.
    pub async fn fetch_all(
        &self,
        where_: Option<&T::Partial>,
        config: Option<QueryConfig<'_>>,
    ) -> Result<Vec<T>, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let query = SelectQuery::new(self.storage_filter(where_)?)
            .order_by(self.storage_order(&config.order_by))
            .limit(config.limit);

        debug_log!("[{}] fetch_all via {:?}: {:?}", self.table, ctx, query);
        let rows = ctx.executor().select(&self.table, &query).await?;
        self.decode_all(rows)
    }

    /// Read the first row matching `where_`
    ///
    /// Without an ordering in `config` the store decides which row is
    /// first, and a warning is logged when several matched. With
    /// [`QueryConfig::unique`] more than one match is a cardinality error.
    pub async fn fetch_one(
        &self,
        where_: &T::Partial,
        config: Option<QueryConfig<'_>>,
    ) -> Result<Option<T>, ModelError> {
        let config = config.unwrap_or_default();
        let ctx = self.context(config.transaction);
        let filter = self.storage_filter(Some(where_))?;

        match self.first_match(ctx, filter, &config).await? {
            Some(row) => Ok(Some(self.decode(row)?)),
            None => Ok(None),
        }
    }

    /// First storage row matching `filter`, applying the `fetch_one` policy
    async fn first_match(
        &self,
        ctx: ExecutionContext<'_>,
        filter: QueryFilter,
        config: &QueryConfig<'_>,
    ) -> Result<Option<Record>, ModelError> {
        // Two rows are enough to tell "one" from "several" unless the
        // caller wants the exact count reported
        let limit = if config.unique { None } else { Some(2) };
        let query = SelectQuery::new(filter)
            .order_by(self.storage_order(&config.order_by))
            .limit(limit);

        debug_log!("[{}] fetch_one via {:?}: {:?}", self.table, ctx, query);
        let rows = ctx.executor().select(&self.table, &query).await?;

        if rows.len() > 1 {
            if config.unique {
                return Err(ModelError::cardinality(
                    self.table.as_str(),
                    "fetch_one",
                    rows.len(),
                ));
            }
            if query.order_by.is_empty() {
                tracing::warn!(
                    table = %self.table,
                    "fetch_one matched several rows without an ordering; returning an arbitrary one"
                );
            }
        }

        Ok(rows.into_iter().next())
    }
}
