use crate::validation::ValidationError;
use thiserror::Error;

/// Boxed error raised by a non-sqlx query executor
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// The model is not set up for the requested operation
    #[error("Configuration error on table '{table}': {message}")]
    Configuration { table: String, message: String },

    /// An operation that requires exactly one matching row saw a different count
    #[error("Cardinality error on table '{table}' during {operation}: expected exactly one row, found {found}")]
    Cardinality {
        table: String,
        operation: &'static str,
        found: usize,
    },

    /// A row expected to exist right after a successful write was not there
    #[error("Postcondition failed on table '{table}' during {operation}: {message}")]
    Postcondition {
        table: String,
        operation: &'static str,
        message: String,
    },

    /// Failure reported by the PostgreSQL executor, passed through as is
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Failure reported by any other executor, passed through as is
    #[error(transparent)]
    Collaborator(BoxError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ModelError {
    pub(crate) fn configuration(table: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn cardinality(table: &str, operation: &'static str, found: usize) -> Self {
        Self::Cardinality {
            table: table.to_string(),
            operation,
            found,
        }
    }

    pub(crate) fn postcondition(
        table: &str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Postcondition {
            table: table.to_string(),
            operation,
            message: message.into(),
        }
    }

    /// Wrap an error raised by a custom executor
    pub fn collaborator<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Collaborator(Box::new(error))
    }

    /// True for failures that came from the executor rather than the model
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Collaborator(_))
    }

    /// Number of matching rows observed, for cardinality failures
    pub fn found_rows(&self) -> Option<usize> {
        match self {
            Self::Cardinality { found, .. } => Some(*found),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
