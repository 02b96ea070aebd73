//! Identity fields used by upsert

use crate::entity::Record;

/// Ordered, non-empty, duplicate-free list of external field names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictKeys(Vec<String>);

impl ConflictKeys {
    /// Build the policy; `None` when `keys` is empty
    ///
    /// Returns the offending name as the error when a key repeats.
    pub fn new<I, S>(keys: I) -> Result<Option<Self>, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if collected.contains(&key) {
                return Err(key);
            }
            collected.push(key);
        }

        Ok(if collected.is_empty() {
            None
        } else {
            Some(Self(collected))
        })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Pick the conflict-key entries out of an external record
    ///
    /// Returns the first key that has no entry as the error.
    pub fn project(&self, record: &Record) -> Result<Record, String> {
        self.0
            .iter()
            .map(|key| match record.get(key) {
                Some(value) => Ok((key.clone(), value.clone())),
                None => Err(key.clone()),
            })
            .collect()
    }
}
