//! JSON parameter binding
//!
//! Every parameter is a whole record bound as `jsonb`; the statement expands
//! it with `jsonb_populate_record`, so column types are resolved server-side.

use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;
use sqlx::types::Json;
use sqlx::Postgres;

// Shared parameter binding logic
macro_rules! bind_json_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = query.bind(Json(param));
        }
        query
    }};
}

/// Bind every record to a statement that yields one JSON column per row
pub(crate) fn bind_record_query<'q>(
    query: QueryScalar<'q, Postgres, Value, PgArguments>,
    params: Vec<Value>,
) -> QueryScalar<'q, Postgres, Value, PgArguments> {
    bind_json_params!(query, params)
}

/// Bind every record to a statement whose rows are not read
pub(crate) fn bind_raw_query<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: Vec<Value>,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    bind_json_params!(query, params)
}
