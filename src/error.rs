use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Domain error on '{attribute}': value {value} {reason}")]
    Domain {
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("Schema error on '{attribute}': {reason}")]
    Schema { attribute: String, reason: String },

    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("{model} rejected the table: {} violating class(es), first {}", .offending.len(), .offending.first().map(String::as_str).unwrap_or("-"))]
    PrivacyRejected { model: String, offending: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn schema(attribute: &str, reason: impl Into<String>) -> Self {
        Error::Schema {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for the most common schema failure
    pub fn missing_attribute(attribute: &str) -> Self {
        Self::schema(attribute, "attribute not present in table")
    }

    pub fn domain(attribute: &str, value: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Error::Domain {
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
