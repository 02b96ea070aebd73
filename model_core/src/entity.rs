//! Typed entity shapes
//!
//! Callers work with concrete structs; the model only flattens them into a
//! [`Record`] when it has to rename keys or hand values to an executor.

use crate::errors::ModelError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;

/// Flat key/value view of one row
pub type Record = Map<String, Value>;

/// A statically shaped row type bound to one table
///
/// Usually derived with `#[derive(Entity)]` (or the `#[entity]` attribute),
/// which also generates the matching `Partial` struct.
///
/// ```ignore
/// #[entity]
/// #[table(name = "users")]
/// pub struct User {
///     #[conflict_key]
///     pub email: String,
///     pub first_name: String,
/// }
///
/// let filter = UserPartial::new().first_name("Jo");
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Subset of the entity's fields, used for where clauses and update values
    type Partial: Serialize + Default + Clone + Debug + Send + Sync;

    /// External (serialized) names of every declared field
    fn field_names() -> &'static [&'static str];

    /// Table this entity is stored in, if declared on the type
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Fields that identify an entity for upsert, if declared on the type
    fn conflict_keys() -> &'static [&'static str] {
        &[]
    }
}

/// Serialize an entity or partial into a flat record
pub fn to_record<V: Serialize + ?Sized>(value: &V) -> Result<Record, ModelError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::Serialization(format!(
            "expected a flat record, got {}",
            json_kind(&other)
        ))),
    }
}

/// Deserialize a record into `T`, ignoring keys outside its declared shape
pub fn from_record<T: Entity>(mut record: Record) -> Result<T, ModelError> {
    let declared = T::field_names();
    record.retain(|key, _| declared.contains(&key.as_str()));
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
