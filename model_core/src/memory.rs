//! In-process query executor
//!
//! Keeps every table as a vector of storage records. Useful for tests and
//! for exercising models without a database.

use crate::entity::Record;
use crate::errors::ModelError;
use crate::executor::{ConditionalWrite, QueryExecutor};
use crate::query_builder::{OrderSpec, QueryFilter, SelectQuery};
use crate::validation::ValidatedTableName;
use crate::trace_log;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("duplicate key value violates unique constraint on {table} ({columns})")]
    UniqueViolation { table: String, columns: String },
}

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Record>,
    unique: Vec<Vec<String>>,
}

impl MemoryTable {
    fn check_unique(&self, table: &str, candidate: &Record, skip: Option<usize>) -> Result<(), ModelError> {
        self.check_unique_against(&self.rows, table, candidate, skip)
    }

    /// Check `candidate` against `rows`, which may be a staged copy of the table
    fn check_unique_against(
        &self,
        rows: &[Record],
        table: &str,
        candidate: &Record,
        skip: Option<usize>,
    ) -> Result<(), ModelError> {
        for columns in &self.unique {
            let clash = rows.iter().enumerate().any(|(i, row)| {
                Some(i) != skip
                    && columns.iter().all(|c| {
                        let value = candidate.get(c).unwrap_or(&Value::Null);
                        // NULLs never collide, as in PostgreSQL
                        !value.is_null() && row.get(c) == Some(value)
                    })
            });
            if clash {
                return Err(ModelError::collaborator(MemoryError::UniqueViolation {
                    table: table.to_string(),
                    columns: columns.join(", "),
                }));
            }
        }
        Ok(())
    }

    fn position_of(&self, columns: &[String], record: &Record) -> Option<usize> {
        let mut filter = QueryFilter::new();
        for column in columns {
            filter = filter.eq(column, record.get(column).cloned().unwrap_or(Value::Null));
        }
        self.rows.iter().position(|row| filter.matches(row))
    }
}

/// Executor over in-memory tables
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<HashMap<String, MemoryTable>>,
    atomic_writes: bool,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve conditional writes as single steps under the table lock
    pub fn with_atomic_writes(mut self, atomic_writes: bool) -> Self {
        self.atomic_writes = atomic_writes;
        self
    }

    /// Reject rows that repeat a non-null value combination in `columns`
    pub fn with_unique(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables
            .get_mut()
            .entry(table.to_string())
            .or_default()
            .unique
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Snapshot of a table's rows in insertion order
    pub async fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Load rows directly, bypassing constraints
    pub async fn seed(&self, table: &str, rows: impl IntoIterator<Item = Record>) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .rows
            .extend(rows);
    }
}

/// Total order over JSON scalars: null < bool < number < string < other
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_rows(rows: &mut [Record], order_by: &OrderSpec) {
    if order_by.is_empty() {
        return;
    }
    // sort_by is stable, so rows equal on every key keep insertion order
    rows.sort_by(|a, b| {
        order_by
            .keys()
            .iter()
            .map(|(field, order)| order.apply(compare_values(a.get(field), b.get(field))))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn select(
        &self,
        table: &ValidatedTableName,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, ModelError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Record> = tables
            .get(table.as_str())
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| query.filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_rows(&mut rows, &query.order_by);
        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }

        trace_log!("[MEMORY] select from {} -> {} rows", table, rows.len());
        Ok(rows)
    }

    async fn insert(&self, table: &ValidatedTableName, record: &Record) -> Result<(), ModelError> {
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.as_str().to_string()).or_default();
        entry.check_unique(table.as_str(), record, None)?;
        entry.rows.push(record.clone());
        Ok(())
    }

    async fn update(
        &self,
        table: &ValidatedTableName,
        filter: &QueryFilter,
        values: &Record,
    ) -> Result<Vec<Record>, ModelError> {
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.get_mut(table.as_str()) else {
            return Ok(Vec::new());
        };

        // Stage the whole table first so a constraint failure leaves it untouched
        let mut staged = entry.rows.clone();
        let mut changed = Vec::new();
        for (i, row) in staged.iter_mut().enumerate() {
            if filter.matches(row) {
                for (field, value) in values {
                    row.insert(field.clone(), value.clone());
                }
                changed.push(i);
            }
        }
        // Updated rows are checked against each other as well as the rest
        for &i in &changed {
            entry.check_unique_against(&staged, table.as_str(), &staged[i], Some(i))?;
        }

        let updated = changed.iter().map(|&i| staged[i].clone()).collect();
        entry.rows = staged;
        Ok(updated)
    }

    async fn delete(&self, table: &ValidatedTableName, filter: &QueryFilter) -> Result<u64, ModelError> {
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.get_mut(table.as_str()) else {
            return Ok(0);
        };
        let before = entry.rows.len();
        entry.rows.retain(|row| !filter.matches(row));
        Ok((before - entry.rows.len()) as u64)
    }

    async fn execute_conditional(
        &self,
        table: &ValidatedTableName,
        write: ConditionalWrite<'_>,
    ) -> Result<Option<Vec<Record>>, ModelError> {
        if !self.atomic_writes {
            return Ok(None);
        }

        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.as_str().to_string()).or_default();

        match write {
            ConditionalWrite::Upsert {
                conflict_columns,
                record,
            } => match entry.position_of(conflict_columns, record) {
                Some(i) => {
                    let mut next = entry.rows[i].clone();
                    for (field, value) in record {
                        next.insert(field.clone(), value.clone());
                    }
                    entry.check_unique(table.as_str(), &next, Some(i))?;
                    entry.rows[i] = next.clone();
                    Ok(Some(vec![next]))
                }
                None => {
                    entry.check_unique(table.as_str(), record, None)?;
                    entry.rows.push(record.clone());
                    Ok(Some(vec![record.clone()]))
                }
            },
            ConditionalWrite::DeleteExactlyOne { filter } => {
                let matching: Vec<usize> = entry
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| filter.matches(row))
                    .map(|(i, _)| i)
                    .collect();
                match matching.as_slice() {
                    [only] => Ok(Some(vec![entry.rows.remove(*only)])),
                    _ => Ok(Some(Vec::new())),
                }
            }
        }
    }

    fn describe(&self) -> &'static str {
        "memory"
    }
}
