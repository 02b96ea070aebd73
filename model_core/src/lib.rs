//! Model Core - generic table models for ModelBase
//!
//! This crate provides the per-table CRUD engine, the field-name transcoder,
//! the query executor capability with its PostgreSQL and in-memory
//! implementations, and the validation utilities they share.

// Lets `#[derive(Entity)]` output resolve `model_core::...` inside this crate's own tests
extern crate self as model_core;

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod conflict_keys;
pub mod context;
pub mod entity;
pub mod errors;
pub mod executor;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod prelude;
pub mod query_builder;
pub mod transcoder;
pub mod validation;

pub use conflict_keys::ConflictKeys;
pub use context::{ExecutionContext, QueryConfig};
pub use entity::{from_record, to_record, Entity, Record};
pub use errors::{BoxError, ModelError};
pub use executor::{ConditionalWrite, QueryExecutor};
pub use memory::{MemoryError, MemoryExecutor};
pub use model::ModelBase;
pub use postgres::{PgExecutor, PgTransaction};
pub use query_builder::{OrderSpec, QueryFilter, SelectQuery, SortOrder, SqlGenerator};
pub use transcoder::{CaseTranscoder, FieldTranscoder, NamingConvention};
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

use sqlx::PgPool;

pub type DbPool = PgPool;
