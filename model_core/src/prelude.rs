//! Convenience re-exports for common model usage

// Core model types
pub use crate::model::ModelBase;
pub use crate::context::{ExecutionContext, QueryConfig};
pub use crate::conflict_keys::ConflictKeys;
pub use crate::entity::{Entity, Record};

// Executors
pub use crate::executor::{ConditionalWrite, QueryExecutor};
pub use crate::memory::MemoryExecutor;
pub use crate::postgres::{PgExecutor, PgTransaction};

// Error types
pub use crate::errors::ModelError;

// Naming conventions
pub use crate::transcoder::{CaseTranscoder, FieldTranscoder, NamingConvention};

// Query building
pub use crate::query_builder::{OrderSpec, QueryFilter, SortOrder};

// Validation
pub use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
pub use uuid::Uuid;
