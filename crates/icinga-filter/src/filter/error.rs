//! Error types for the filter parser.

use thiserror::Error;

/// A specialized Result type for strict filter parsing.
pub type FilterResult<T> = Result<T, FilterError>;

/// Problems found while parsing a filter query string.
///
/// The lenient parser records these as it drops the offending fragment;
/// strict parsing returns the first one as an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A conjunct has an operator but no column.
    #[error("missing column before '{operator}' at position {position}")]
    EmptyColumn {
        /// The operator token that had no column.
        operator: String,
        /// Byte offset in the query string.
        position: usize,
    },

    /// The column is not a valid identifier.
    #[error("invalid column '{column}' at position {position}")]
    InvalidColumn {
        /// The decoded column text.
        column: String,
        /// Byte offset in the query string.
        position: usize,
    },

    /// The column is not in the caller's allow-list.
    #[error("unknown column '{column}' at position {position}{}", suggestion_suffix(.suggestion))]
    UnknownColumn {
        /// The rejected column.
        column: String,
        /// Byte offset in the query string.
        position: usize,
        /// Closest allowed column, if any is close enough.
        suggestion: Option<String>,
    },

    /// An operator is not followed by a value.
    #[error("missing value for '{column}' at position {position}")]
    MissingValue {
        /// The column whose value is missing.
        column: String,
        /// Byte offset in the query string.
        position: usize,
    },

    /// A token appeared where no conjunct can start.
    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token text.
        token: String,
        /// Byte offset in the query string.
        position: usize,
    },

    /// An opening parenthesis was never closed.
    #[error("unclosed parenthesis at position {position}")]
    UnclosedParenthesis {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// Parentheses are nested deeper than the parser follows.
    #[error("parentheses nested too deeply at position {position}")]
    NestingTooDeep {
        /// Byte offset of the first parenthesis past the limit.
        position: usize,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

impl FilterError {
    /// Byte offset in the query string where the problem was found.
    pub fn position(&self) -> usize {
        match self {
            FilterError::EmptyColumn { position, .. }
            | FilterError::InvalidColumn { position, .. }
            | FilterError::UnknownColumn { position, .. }
            | FilterError::MissingValue { position, .. }
            | FilterError::UnexpectedToken { position, .. }
            | FilterError::UnclosedParenthesis { position }
            | FilterError::NestingTooDeep { position } => *position,
        }
    }

    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates a missing value error.
    pub fn missing_value(column: impl Into<String>, position: usize) -> Self {
        FilterError::MissingValue {
            column: column.into(),
            position,
        }
    }
}
