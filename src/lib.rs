//! # ModelBase
//!
//! Generic per-table models for PostgreSQL: typed entities, camelCase ↔
//! snake_case field transcoding, caller-owned transactions, and upsert /
//! single-row removal with cardinality checks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modelbase::prelude::*;
//!
//! #[entity]
//! #[table(name = "users")]
//! pub struct User {
//!     #[conflict_key]
//!     pub email: String,
//!     pub first_name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::new(
//!         "localhost".to_string(), 5432, "modelbase".to_string(),
//!         "postgres".to_string(), "password".to_string(),
//!         1, 5, 30, 600, 3600,
//!     );
//!
//!     let db = Database::connect(config).await?;
//!     let users = db.model_for::<User>()?;
//!
//!     users
//!         .upsert(
//!             User {
//!                 email: "jo@example.com".to_string(),
//!                 first_name: "Jo".to_string(),
//!             },
//!             None,
//!         )
//!         .await?;
//!
//!     let jo = users
//!         .fetch_one(&UserPartial::new().first_name("Jo"), None)
//!         .await?;
//!     println!("Found: {:?}", jo);
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::Database;
pub use crate::errors::ModelBaseError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, ExecutorConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use entity_derive;
pub use model_core;

// Re-export external dependencies used in public API
pub use async_trait;
pub use serde;
pub use serde_json;
pub use sqlx;
