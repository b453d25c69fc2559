//! Error types for the query engine.

use thiserror::Error;

/// Errors raised while rendering templates, coercing arguments, or gating SQL.
///
/// Every variant is deterministic for a given input and is raised before any
/// SQL reaches the execution collaborator, so messages are safe to hand back
/// to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Template name not present in the catalog.
    #[error("unknown template '{name}'. Available templates: {}{}", .available.join(", "), suggestion_text(.suggestion))]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    /// A parameter declared required was not supplied.
    #[error("missing required parameter '{name}' ({description})")]
    MissingParameter { name: String, description: String },

    /// A supplied value failed coercion for its declared field kind.
    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A name was not found in a lookup table.
    #[error("unknown {table} '{name}'. Valid names: {}{}", .valid.join(", "), suggestion_text(.suggestion))]
    UnknownName {
        table: &'static str,
        name: String,
        valid: Vec<String>,
        suggestion: Option<String>,
    },

    /// SQL rejected by the safety validator.
    #[error("query rejected: {reason}")]
    DangerousQuery { reason: String },
}

impl QueryError {
    /// Create an invalid-parameter error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-parameter error.
    pub fn missing(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::MissingParameter {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Rejection for a mutating keyword found in the SQL.
    pub fn dangerous_keyword(keyword: &str) -> Self {
        Self::DangerousQuery {
            reason: format!(
                "dangerous keyword '{}' detected. Only SELECT queries are allowed",
                keyword.to_uppercase()
            ),
        }
    }

    /// Rejection for more than one statement in the SQL.
    pub fn multiple_statements() -> Self {
        Self::DangerousQuery {
            reason: "multiple SQL statements are not allowed".to_string(),
        }
    }
}

fn suggestion_text(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{s}'?"),
        None => String::new(),
    }
}

/// Result type alias for query-engine operations.
pub type QueryResult<T> = Result<T, QueryError>;
