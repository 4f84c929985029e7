use std::collections::{BTreeMap, BTreeSet};

use super::model::{Record, Value};

// ---------------------------------------------------------------------------
// Criterion: the constraint one sidebar widget places on one column
// ---------------------------------------------------------------------------

/// A constraint on a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Multi-choice widget: the value must be one of the selected ones.
    /// An empty set matches nothing.
    OneOf(BTreeSet<Value>),
    /// Single-choice widget with a concrete selection.
    Equals(Value),
    /// Single-choice widget left on its "all" entry.
    Any,
    /// Free-text search, case-insensitive.
    Contains(String),
}

impl Criterion {
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Criterion::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn contains(pattern: &str) -> Self {
        Criterion::Contains(pattern.to_lowercase())
    }

    /// Whether `value` satisfies this criterion. Null only satisfies `Any`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Criterion::Any => true,
            _ if value.is_null() => false,
            Criterion::OneOf(accepted) => accepted.contains(value),
            Criterion::Equals(expected) => expected == value,
            Criterion::Contains(pattern) => value
                .as_text()
                .is_some_and(|text| text.to_lowercase().contains(&pattern.to_lowercase())),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterCriteria: all active constraints, keyed by column
// ---------------------------------------------------------------------------

/// Per-column constraints derived from the current widget selections.
/// A column absent from the map is unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    constraints: BTreeMap<String, Criterion>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, criterion: Criterion) -> Self {
        self.set(column, criterion);
        self
    }

    /// Add or replace the constraint on `column`.
    pub fn set(&mut self, column: impl Into<String>, criterion: Criterion) {
        self.constraints.insert(column.into(), criterion);
    }

    pub fn remove(&mut self, column: &str) -> Option<Criterion> {
        self.constraints.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&Criterion> {
        self.constraints.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.constraints.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Criterion)> {
        self.constraints.iter()
    }

    /// A record passes when every constrained column matches. Stops at the
    /// first failing column.
    pub fn accepts(&self, record: &Record) -> bool {
        self.constraints
            .iter()
            .all(|(col, criterion)| criterion.matches(record.get(col)))
    }
}
