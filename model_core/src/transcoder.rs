//! Field-name transcoding
//!
//! Renames the top-level keys of a record between the external naming
//! convention (what callers serialize) and the storage convention (column
//! names). Values, including nested objects, pass through untouched.
//!
//! Renaming is purely lexical. Two external keys that map to the same storage
//! key (`userID` and `userId` both become `user_id`) collapse into one entry,
//! and the later key wins. Nothing detects this.

use crate::entity::Record;
use convert_case::{Case, Casing};

/// Key renaming between the external and storage conventions
pub trait FieldTranscoder: Send + Sync {
    /// Rename one storage key to its external form
    fn external_key(&self, key: &str) -> String;

    /// Rename one external key to its storage form
    fn storage_key(&self, key: &str) -> String;

    /// Rename every top-level key from storage to external convention
    fn to_external(&self, record: Record) -> Record {
        record
            .into_iter()
            .map(|(key, value)| (self.external_key(&key), value))
            .collect()
    }

    /// Rename every top-level key from external to storage convention
    fn to_storage(&self, record: Record) -> Record {
        record
            .into_iter()
            .map(|(key, value)| (self.storage_key(&key), value))
            .collect()
    }
}

/// Naming conventions understood by [`CaseTranscoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    /// `firstName`
    Camel,
    /// `FirstName`
    Pascal,
    /// `first_name`
    Snake,
    /// `FIRST_NAME`
    UpperSnake,
    /// `first-name`
    Kebab,
}

impl NamingConvention {
    /// Rewrite `key` in this convention
    pub fn apply(self, key: &str) -> String {
        match self {
            NamingConvention::Camel => key.to_case(Case::Camel),
            NamingConvention::Pascal => key.to_case(Case::Pascal),
            NamingConvention::Snake => key.to_case(Case::Snake),
            NamingConvention::UpperSnake => key.to_case(Case::UpperSnake),
            NamingConvention::Kebab => key.to_case(Case::Kebab),
        }
    }
}

/// Transcoder backed by case conversion, camelCase ↔ snake_case by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseTranscoder {
    external: NamingConvention,
    storage: NamingConvention,
}

impl CaseTranscoder {
    pub fn new(external: NamingConvention, storage: NamingConvention) -> Self {
        Self { external, storage }
    }

    pub fn external(&self) -> NamingConvention {
        self.external
    }

    pub fn storage(&self) -> NamingConvention {
        self.storage
    }
}

impl Default for CaseTranscoder {
    fn default() -> Self {
        Self::new(NamingConvention::Camel, NamingConvention::Snake)
    }
}

impl FieldTranscoder for CaseTranscoder {
    fn external_key(&self, key: &str) -> String {
        self.external.apply(key)
    }

    fn storage_key(&self, key: &str) -> String {
        self.storage.apply(key)
    }
}
