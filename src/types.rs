use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Default mask token used by the suppressor
pub const DEFAULT_MASK: &str = "***";

/// Default prefix for pseudonym labels (e.g. "Subject_A")
pub const DEFAULT_PSEUDONYM_PREFIX: &str = "Subject";

/// A single cell value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Finite numeric view of the value; text is parsed, missing has none.
    ///
    /// NaN and infinities (stored or spelled out as text) are not numbers here.
    pub fn as_f64(&self) -> Option<f64> {
        let x = match self {
            Value::Integer(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Missing => return None,
        };
        x.is_finite().then_some(x)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Integer(_) => 1,
            Value::Float(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

// Floats compare by bit pattern so values can be used as grouping keys.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Missing => {}
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "NA"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Numeric,
    Categorical,
}

/// Privacy role of an attribute, supplied by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRole {
    /// Directly identifying (name, patient id)
    Identifier,
    /// Identifying in combination with other attributes (age, gender)
    QuasiIdentifier,
    /// The attribute whose disclosure is the privacy concern
    Sensitive,
    #[default]
    Other,
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_equality_is_variant_strict() {
        assert_eq!(Value::Integer(1), Value::Integer(1));
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::text("1"), Value::Integer(1));
        assert_eq!(Value::Missing, Value::Missing);
    }

    #[test]
    fn test_value_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(Value::Float(0.5));
        set.insert(Value::Float(0.5));
        set.insert(Value::text("F"));
        set.insert(Value::text("F"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_value_ordering() {
        let mut values = vec![
            Value::text("b"),
            Value::Integer(3),
            Value::Missing,
            Value::text("a"),
            Value::Integer(-1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Missing,
                Value::Integer(-1),
                Value::Integer(3),
                Value::text("a"),
                Value::text("b"),
            ]
        );
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Value::Integer(34).as_f64(), Some(34.0));
        assert_eq!(Value::text(" 2.5 ").as_f64(), Some(2.5));
        assert_eq!(Value::text("F").as_f64(), None);
        assert_eq!(Value::Missing.as_f64(), None);
    }

    #[test]
    fn test_as_f64_rejects_non_finite() {
        assert_eq!(Value::text("NaN").as_f64(), None);
        assert_eq!(Value::text("inf").as_f64(), None);
        assert_eq!(Value::text("-infinity").as_f64(), None);
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_f64(), None);
    }

    #[test]
    fn test_role_serde() {
        let role: AttributeRole = serde_json::from_str("\"quasi_identifier\"").unwrap();
        assert_eq!(role, AttributeRole::QuasiIdentifier);
        assert_eq!(AttributeRole::default(), AttributeRole::Other);
    }
}
