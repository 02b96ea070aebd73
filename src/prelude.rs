//! Convenience re-exports for common ModelBase usage
//!
//! # Example
//!
//! ```rust
//! use modelbase::prelude::*;
//!
//! // Models, executors, entity macros and config types are now in scope
//! ```

// Core ModelBase components
pub use crate::core::Database;
pub use crate::errors::ModelBaseError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, ExecutorConfig};

// Re-export commonly used model types for convenience
pub use model_core::prelude::*;

// Re-export model_core and serde for macro-generated code
pub use model_core;
pub use serde;

// Entity derive and attribute
pub use entity_derive::{entity, Entity};

// Common external dependencies
pub use anyhow;
pub use sqlx;
pub use tokio;
