//! Query builder utilities
//!
//! Storage-side request shapes handed to a [`QueryExecutor`](crate::QueryExecutor),
//! and the PostgreSQL text they compile to.

pub mod filter;
pub mod ordering;
pub mod sql_generation;


pub use filter::{QueryFilter, SelectQuery};
pub use ordering::{OrderSpec, SortOrder};
pub use sql_generation::{SqlGenerator, Statement};
