//! Per-call options and execution context resolution

use crate::executor::QueryExecutor;
use crate::query_builder::{OrderSpec, SortOrder};
use std::fmt;

/// Optional trailing options accepted by every model operation
///
/// Defaults: the model's own executor, no ordering, no limit, and
/// `fetch_one` returning the first of several matches.
#[derive(Clone, Default)]
pub struct QueryConfig<'a> {
    /// Caller-owned transaction to run in instead of the model's executor
    pub transaction: Option<&'a dyn QueryExecutor>,
    /// Sort keys, in external field names
    pub order_by: OrderSpec,
    /// Maximum number of rows to read
    pub limit: Option<i64>,
    /// Make `fetch_one` fail when more than one row matches
    pub unique: bool,
}

impl<'a> QueryConfig<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run in `transaction` instead of the model's default executor
    pub fn transaction(mut self, transaction: &'a dyn QueryExecutor) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn order_by(mut self, order_by: OrderSpec) -> Self {
        self.order_by = order_by;
        self
    }

    /// Append one sort key
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = self.order_by.then(field, order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Require `fetch_one` to see at most one match
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

impl fmt::Debug for QueryConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConfig")
            .field("transaction", &self.transaction.map(|tx| tx.describe()))
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("unique", &self.unique)
            .finish()
    }
}

/// Where a single operation runs
#[derive(Clone, Copy)]
pub enum ExecutionContext<'a> {
    /// The model's own executor
    Default(&'a dyn QueryExecutor),
    /// A transaction supplied by the caller
    Transaction(&'a dyn QueryExecutor),
}

impl<'a> ExecutionContext<'a> {
    /// An explicit transaction wins; otherwise the model's executor is used
    pub fn resolve(
        default: &'a dyn QueryExecutor,
        transaction: Option<&'a dyn QueryExecutor>,
    ) -> Self {
        match transaction {
            Some(tx) => ExecutionContext::Transaction(tx),
            None => ExecutionContext::Default(default),
        }
    }

    pub fn executor(&self) -> &'a dyn QueryExecutor {
        match self {
            ExecutionContext::Default(executor) | ExecutionContext::Transaction(executor) => {
                *executor
            }
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, ExecutionContext::Transaction(_))
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Default(executor) => {
                write!(f, "Default({})", executor.describe())
            }
            ExecutionContext::Transaction(executor) => {
                write!(f, "Transaction({})", executor.describe())
            }
        }
    }
}
