//! PostgreSQL query executors built on sqlx

mod bind;
mod executor;
mod statements;
mod transaction;

pub use executor::PgExecutor;
pub use transaction::PgTransaction;
