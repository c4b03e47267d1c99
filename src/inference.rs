use crate::types::{ColumnType, Value};

/// Missing value tokens
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "NULL", "null", "NaN", "nan", ".", "-", "--", "missing",
    "MISSING", "None", "none", "#N/A", "#VALUE!", "#REF!", "#DIV/0!", "#NUM!", "#NAME?", "#NULL!",
];

/// Type inference state for a column.
///
/// The type only ever widens: integer -> numeric -> categorical.
#[derive(Debug, Clone)]
pub struct TypeInferencer {
    /// Current inferred type, `None` until a non-missing value is seen
    current_type: Option<ColumnType>,
    /// Number of non-missing values seen
    values_seen: u64,
}

impl TypeInferencer {
    pub fn new() -> Self {
        Self {
            current_type: None,
            values_seen: 0,
        }
    }

    /// Add a raw value for type inference
    pub fn observe(&mut self, value: &str) {
        if is_missing(value) {
            return;
        }
        self.values_seen += 1;

        let observed = if is_integer(value) {
            ColumnType::Integer
        } else if is_numeric(value) {
            ColumnType::Numeric
        } else {
            ColumnType::Categorical
        };
        self.current_type = Some(match (self.current_type, observed) {
            (None, t) => t,
            (Some(ColumnType::Categorical), _) | (_, ColumnType::Categorical) => {
                ColumnType::Categorical
            }
            (Some(ColumnType::Numeric), _) | (_, ColumnType::Numeric) => ColumnType::Numeric,
            _ => ColumnType::Integer,
        });
    }

    pub fn values_seen(&self) -> u64 {
        self.values_seen
    }

    /// Get the current inferred type; all-missing columns are categorical
    pub fn inferred_type(&self) -> ColumnType {
        self.current_type.unwrap_or(ColumnType::Categorical)
    }
}

impl Default for TypeInferencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a value represents a missing value
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Check if a value is an integer
pub fn is_integer(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.parse::<i64>().is_ok()
}

/// Check if a value is numeric (integer or float)
pub fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Convert a raw field to a typed value for a column of `column_type`
pub fn parse_value(raw: &str, column_type: ColumnType) -> Value {
    if is_missing(raw) {
        return Value::Missing;
    }
    let trimmed = raw.trim();
    match column_type {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::text(trimmed)),
        ColumnType::Numeric => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::text(trimmed)),
        ColumnType::Categorical => Value::text(trimmed),
    }
}
