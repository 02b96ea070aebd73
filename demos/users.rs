//! # Users Walkthrough
//!
//! Demonstrates a model over a `users` table:
//! - Defining an entity with the `#[entity]` macro
//! - Upserting on a conflict key
//! - Filtering and ordering with the generated `UserPartial`
//! - Threading one transaction through several calls
//! - Cardinality failures from `remove_one`
//!
//! Runs against PostgreSQL when `modelbase.toml` (or `MODELBASE_CONFIG`)
//! can be loaded, and against the in-memory executor otherwise. The
//! PostgreSQL table must already exist:
//!
//! ```sql
//! CREATE TABLE users (
//!     email TEXT PRIMARY KEY,
//!     first_name TEXT NOT NULL,
//!     team TEXT NOT NULL,
//!     age BIGINT NOT NULL
//! );
//! ```

use modelbase::prelude::*;
use std::sync::Arc;

#[entity]
#[table(name = "users")]
pub struct User {
    #[conflict_key]
    pub email: String,
    pub first_name: String,
    pub team: String,
    pub age: i64,
}

fn user(email: &str, first_name: &str, team: &str, age: i64) -> User {
    User {
        email: email.to_string(),
        first_name: first_name.to_string(),
        team: team.to_string(),
        age,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("ModelBase Users Walkthrough");
    println!("===========================");

    let database = match AppConfig::load() {
        Ok(config) => Some(Database::from_config(config).await?),
        Err(e) => {
            println!("No database configuration ({}); using the in-memory executor", e);
            None
        }
    };

    let executor: Arc<dyn QueryExecutor> = match &database {
        Some(db) => db.executor(),
        None => Arc::new(MemoryExecutor::new()),
    };
    let users = ModelBase::<User>::for_entity(executor)?;

    // 1. Upsert: insert, then update in place
    println!("\nStep 1: upsert");
    users.upsert(user("jo@example.com", "Jo", "core", 31), None).await?;
    users.upsert(user("al@example.com", "Al", "core", 45), None).await?;
    users.upsert(user("mo@example.com", "Mo", "infra", 27), None).await?;
    let jo = users.upsert(user("jo@example.com", "Joanna", "core", 32), None).await?;
    println!("Upserted: {:?}", jo);

    // 2. Filtered, ordered reads
    println!("\nStep 2: fetch");
    let core = users
        .fetch_all(
            Some(&UserPartial::new().team("core")),
            Some(QueryConfig::new().sort("age", SortOrder::Desc)),
        )
        .await?;
    for member in &core {
        println!("  core: {} ({})", member.first_name, member.age);
    }

    // 3. Several calls in one transaction
    if let Some(db) = &database {
        println!("\nStep 3: transaction");
        let tx = db.begin().await?;
        let config = || QueryConfig::new().transaction(&tx);
        users
            .update_one(
                &UserPartial::new().email("mo@example.com"),
                &UserPartial::new().team("core"),
                Some(config()),
            )
            .await?;
        users
            .update_one(
                &UserPartial::new().email("al@example.com"),
                &UserPartial::new().team("infra"),
                Some(config()),
            )
            .await?;
        tx.commit().await?;
        println!("Swapped teams for Mo and Al");
    }

    // 4. remove_one refuses ambiguous filters
    println!("\nStep 4: remove_one");
    match users.remove_one(&UserPartial::new().team("core"), None).await {
        Err(ModelError::Cardinality { found, .. }) => {
            println!("Refused to remove: {} rows matched", found)
        }
        Err(e) => return Err(e.into()),
        Ok(removed) => println!("Removed the only core member: {:?}", removed),
    }

    let removed = users.remove_all(None, None).await?;
    println!("\nCleaned up {} users", removed.len());

    Ok(())
}
