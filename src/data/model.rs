use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, as read from a spreadsheet column.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Numbers sort by magnitude whatever their variant; an integer and a
    /// float of equal magnitude sort integer first.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering::{Equal, Greater, Less};
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
                Date(_) => 4,
            }
        }
        let (ra, rb) = (rank(self), rank(other));
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Greater),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) | Value::Date(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value for summing. Text, booleans, null and NaN
    /// have no numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if !v.is_nan() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text view used by substring search. `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) | Value::Date(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

static NULL: Value = Value::Null;

/// One row of the source table: column name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for constructing rows by hand.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Value of `column`, or null when the row has no such field.
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn null_sorts_first_and_text_sorts_lexically() {
        let set: BTreeSet<Value> = [
            Value::from("B"),
            Value::Null,
            Value::from("A"),
            Value::Integer(3),
        ]
        .into_iter()
        .collect();
        let ordered: Vec<Value> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![Value::Null, Value::Integer(3), Value::from("A"), Value::from("B")]
        );
    }

    #[test]
    fn integers_and_floats_sort_by_magnitude() {
        let set: BTreeSet<Value> = [
            Value::Integer(10),
            Value::Float(2.5),
            Value::Integer(1),
            Value::Float(-3.0),
            Value::Float(10.0),
        ]
        .into_iter()
        .collect();
        let ordered: Vec<Value> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Value::Float(-3.0),
                Value::Integer(1),
                Value::Float(2.5),
                Value::Integer(10),
                Value::Float(10.0),
            ]
        );
    }

    #[test]
    fn numeric_reading() {
        assert_eq!(Value::Integer(4).as_f64(), Some(4.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
        assert_eq!(Value::from("12").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn missing_field_reads_as_null() {
        let rec = Record::new().with("TECNICO", "Ana");
        assert_eq!(rec.get("TECNICO"), &Value::from("Ana"));
        assert!(rec.get("DISTRITO").is_null());
    }

    #[test]
    fn text_view_skips_null() {
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::Integer(7).as_text().as_deref(), Some("7"));
        assert_eq!(Value::from("Sítio").as_text().as_deref(), Some("Sítio"));
    }
}
