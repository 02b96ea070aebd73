//! Statement execution shared by the pool and transaction executors

use super::bind::{bind_raw_query, bind_record_query};
use crate::entity::Record;
use crate::errors::ModelError;
use crate::query_builder::Statement;
use crate::trace_log;
use serde_json::Value;

/// Run a statement that returns `to_jsonb(t.*)` rows
pub(crate) async fn fetch_records<'e, E>(executor: E, statement: Statement) -> Result<Vec<Record>, ModelError>
where
    E: sqlx::PgExecutor<'e>,
{
    let (sql, params) = statement;
    trace_log!("[POSTGRES] {} ({} params)", sql, params.len());

    let rows = bind_record_query(sqlx::query_scalar::<_, Value>(&sql), params)
        .fetch_all(executor)
        .await?;

    rows.into_iter()
        .map(|row| match row {
            Value::Object(record) => Ok(record),
            other => Err(ModelError::Serialization(format!(
                "expected a row object from PostgreSQL, got {}",
                other
            ))),
        })
        .collect()
}

/// Run a statement for its effect, returning the affected row count
pub(crate) async fn execute<'e, E>(executor: E, statement: Statement) -> Result<u64, ModelError>
where
    E: sqlx::PgExecutor<'e>,
{
    let (sql, params) = statement;
    trace_log!("[POSTGRES] {} ({} params)", sql, params.len());

    let result = bind_raw_query(sqlx::query(&sql), params)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
