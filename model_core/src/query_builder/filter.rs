//! Equality filters
//!
//! A filter is the conjunction of `field = value` for every entry. A JSON
//! null value matches rows where the field is NULL.

use crate::entity::Record;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    conditions: Record,
}

impl QueryFilter {
    /// Filter matching every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition; a repeated field replaces the earlier value
    pub fn eq(mut self, field: &str, value: Value) -> Self {
        self.conditions.insert(field.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Conditions as (field, value) pairs
    pub fn conditions(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.conditions.iter()
    }

    /// True when `row` satisfies every condition
    pub fn matches(&self, row: &Record) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            match (row.get(field), expected) {
                (None, Value::Null) | (Some(Value::Null), Value::Null) => true,
                (Some(actual), expected) => values_equal(actual, expected),
                (None, _) => false,
            }
        })
    }
}

impl From<Record> for QueryFilter {
    fn from(conditions: Record) -> Self {
        Self { conditions }
    }
}

/// Equality that treats `1` and `1.0` as the same number
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// A storage-side read request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub filter: QueryFilter,
    pub order_by: super::OrderSpec,
    pub limit: Option<i64>,
}

impl SelectQuery {
    pub fn new(filter: QueryFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, order_by: super::OrderSpec) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }
}
