//! PostgreSQL statement generation
//!
//! Every statement reads rows back as `to_jsonb(t.*)` so the executor always
//! receives flat storage records. Identifiers are validated and double-quoted;
//! values only ever travel as bound parameters.
//!
//! Values are never bound one column at a time. Each statement binds whole
//! records as `jsonb` and expands them with
//! `jsonb_populate_record(NULL::table, $n::jsonb)`, so the server converts
//! every value to the type of the column it lands in or is compared with.

use crate::entity::Record;
use crate::query_builder::filter::{QueryFilter, SelectQuery};
use crate::query_builder::ordering::OrderSpec;
use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
use serde_json::Value;

/// SQL text plus parameters in placeholder order
///
/// Every parameter is a JSON object bound as `jsonb`.
pub type Statement = (String, Vec<Value>);

const ROW_ALIAS: &str = "t";

pub struct SqlGenerator;

impl SqlGenerator {
    /// `SELECT to_jsonb(t.*) FROM table AS t WHERE ... ORDER BY ... LIMIT ...`
    pub fn select(table: &ValidatedTableName, query: &SelectQuery) -> Result<Statement, ValidationError> {
        let (where_clause, values) = Self::build_where_clause(table, &query.filter, 0)?;
        let order_clause = Self::build_order_clause(&query.order_by)?;
        let limit_clause = Self::build_limit_clause(query.limit);

        let mut sql = String::with_capacity(64 + where_clause.len() + order_clause.len());
        sql.push_str("SELECT to_jsonb(t.*) AS record FROM ");
        sql.push_str(&table.quoted());
        sql.push_str(" AS ");
        sql.push_str(ROW_ALIAS);
        for clause in [&where_clause, &order_clause, &limit_clause] {
            if !clause.is_empty() {
                sql.push(' ');
                sql.push_str(clause);
            }
        }

        Ok((sql, values))
    }

    /// `INSERT INTO table (...) SELECT ... FROM jsonb_populate_record(...)`
    pub fn insert(table: &ValidatedTableName, record: &Record) -> Result<Statement, ValidationError> {
        if record.is_empty() {
            return Ok((format!("INSERT INTO {} DEFAULT VALUES", table.quoted()), Vec::new()));
        }

        let columns = Self::quoted_columns(record.keys())?.join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            table.quoted(),
            columns,
            columns,
            Self::populated(table, 1)
        );
        Ok((sql, vec![Value::Object(record.clone())]))
    }

    /// `UPDATE table AS t SET ... WHERE ... RETURNING to_jsonb(t.*)`
    ///
    /// The SET record is `$1`; the WHERE record, if any, is `$2`.
    pub fn update(
        table: &ValidatedTableName,
        filter: &QueryFilter,
        values: &Record,
    ) -> Result<Statement, ValidationError> {
        let source = Self::populated(table, 1);
        let assignments = Self::quoted_columns(values.keys())?
            .into_iter()
            .map(|column| format!("{} = ({}).{}", column, source, column))
            .collect::<Vec<_>>();

        let mut params = vec![Value::Object(values.clone())];
        let (where_clause, where_values) = Self::build_where_clause(table, filter, params.len())?;
        params.extend(where_values);

        let mut sql = format!(
            "UPDATE {} AS {} SET {}",
            table.quoted(),
            ROW_ALIAS,
            assignments.join(", ")
        );
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }
        sql.push_str(" RETURNING to_jsonb(t.*) AS record");

        Ok((sql, params))
    }

    /// `DELETE FROM table AS t WHERE ...`
    pub fn delete(table: &ValidatedTableName, filter: &QueryFilter) -> Result<Statement, ValidationError> {
        let (where_clause, values) = Self::build_where_clause(table, filter, 0)?;
        let mut sql = format!("DELETE FROM {} AS {}", table.quoted(), ROW_ALIAS);
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }
        Ok((sql, values))
    }

    /// `INSERT ... ON CONFLICT (keys) DO UPDATE SET ... RETURNING to_jsonb(t.*)`
    ///
    /// Every inserted column is refreshed from `EXCLUDED`, conflict columns
    /// included, so the statement always returns the surviving row.
    pub fn upsert(
        table: &ValidatedTableName,
        conflict_columns: &[String],
        record: &Record,
    ) -> Result<Statement, ValidationError> {
        let columns = Self::quoted_columns(record.keys())?;
        let conflict = Self::quoted_columns(conflict_columns.iter())?;
        let refresh = columns
            .iter()
            .map(|c| format!("{} = EXCLUDED.{}", c, c))
            .collect::<Vec<_>>();

        let sql = format!(
            "INSERT INTO {} AS {} ({}) SELECT {} FROM {} ON CONFLICT ({}) DO UPDATE SET {} RETURNING to_jsonb(t.*) AS record",
            table.quoted(),
            ROW_ALIAS,
            columns.join(", "),
            columns.join(", "),
            Self::populated(table, 1),
            conflict.join(", "),
            refresh.join(", ")
        );
        Ok((sql, vec![Value::Object(record.clone())]))
    }

    /// Delete the matching rows only when there is exactly one of them
    ///
    /// The count and the delete run in one statement, so they see the same
    /// snapshot. Returns the deleted row, or nothing when the count was off.
    pub fn delete_exactly_one(
        table: &ValidatedTableName,
        filter: &QueryFilter,
    ) -> Result<Statement, ValidationError> {
        let (where_clause, values) = Self::build_where_clause(table, filter, 0)?;
        // The inner WHERE reuses the outer placeholders
        let guard = format!(
            "(SELECT count(*) FROM {} AS {} {}) = 1",
            table.quoted(),
            ROW_ALIAS,
            where_clause
        );
        let sql = if where_clause.is_empty() {
            format!(
                "DELETE FROM {} AS {} WHERE {} RETURNING to_jsonb(t.*) AS record",
                table.quoted(),
                ROW_ALIAS,
                guard
            )
        } else {
            format!(
                "DELETE FROM {} AS {} {} AND {} RETURNING to_jsonb(t.*) AS record",
                table.quoted(),
                ROW_ALIAS,
                where_clause,
                guard
            )
        };
        Ok((sql, values))
    }

    /// Build WHERE clause; its record placeholder comes after `offset`
    ///
    /// Null conditions compile to `IS NULL` and stay out of the bound record.
    pub fn build_where_clause(
        table: &ValidatedTableName,
        filter: &QueryFilter,
        offset: usize,
    ) -> Result<(String, Vec<Value>), ValidationError> {
        if filter.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let source = Self::populated(table, offset + 1);
        let mut bound = Record::new();
        let mut conditions = Vec::with_capacity(filter.len());
        for (field, value) in filter.conditions() {
            let column = ValidatedFieldName::new(field)?.quoted();
            if value.is_null() {
                conditions.push(format!("{} IS NULL", column));
            } else {
                conditions.push(format!("{} = ({}).{}", column, source, column));
                bound.insert(field.clone(), value.clone());
            }
        }

        let values = if bound.is_empty() {
            Vec::new()
        } else {
            vec![Value::Object(bound)]
        };
        Ok((format!("WHERE {}", conditions.join(" AND ")), values))
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(order_by: &OrderSpec) -> Result<String, ValidationError> {
        if order_by.is_empty() {
            return Ok(String::new());
        }

        let keys = order_by
            .keys()
            .iter()
            .map(|(field, order)| {
                ValidatedFieldName::new(field).map(|c| format!("{} {}", c.quoted(), order.to_sql()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("ORDER BY {}", keys.join(", ")))
    }

    /// Build LIMIT clause
    pub fn build_limit_clause(limit: Option<i64>) -> String {
        match limit {
            Some(limit) => format!("LIMIT {}", limit.max(0)),
            None => String::new(),
        }
    }

    /// `jsonb_populate_record(NULL::table, $n::jsonb)`
    fn populated(table: &ValidatedTableName, placeholder: usize) -> String {
        format!(
            "jsonb_populate_record(NULL::{}, ${}::jsonb)",
            table.quoted(),
            placeholder
        )
    }

    fn quoted_columns<'a>(
        fields: impl Iterator<Item = &'a String>,
    ) -> Result<Vec<String>, ValidationError> {
        fields
            .map(|field| ValidatedFieldName::new(field).map(|c| c.quoted()))
            .collect()
    }
}
