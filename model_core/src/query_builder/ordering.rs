//! Result ordering

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Orient an ascending comparison result
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Ordered sort keys; earlier keys take precedence
///
/// Ties beyond the listed keys are left to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSpec {
    keys: Vec<(String, SortOrder)>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort key
    pub fn then(mut self, field: &str, order: SortOrder) -> Self {
        self.keys.push((field.to_string(), order));
        self
    }

    pub fn asc(self, field: &str) -> Self {
        self.then(field, SortOrder::Asc)
    }

    pub fn desc(self, field: &str) -> Self {
        self.then(field, SortOrder::Desc)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    /// Rename every key, keeping directions and precedence
    pub fn map_fields<F>(&self, mut rename: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            keys: self
                .keys
                .iter()
                .map(|(field, order)| (rename(field), *order))
                .collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, SortOrder)> for OrderSpec {
    fn from_iter<I: IntoIterator<Item = (S, SortOrder)>>(iter: I) -> Self {
        Self {
            keys: iter
                .into_iter()
                .map(|(field, order)| (field.into(), order))
                .collect(),
        }
    }
}
