//! Error types for the ModelBase crate
//!
//! This module contains the error type returned by the `Database` bootstrap.
//! Model operations return `model_core::ModelError` directly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelBaseError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error(transparent)]
    Model(#[from] model_core::ModelError),
}
