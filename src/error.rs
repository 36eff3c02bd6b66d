//! Error types for parsing and binding query expressions.
//!
//! Every failure aborts the whole parse or bind call; no partial tree is ever
//! returned alongside an error.
//!
//! Parse errors carry the character position of the offending input. Token
//! trees hold no positions (two parses of equivalent text compare equal), so
//! bind errors name the offending property, function, operator or type in
//! `text` instead.

use thiserror::Error;

/// The error type for every parse and bind operation in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    // ========== Parse Errors ==========
    /// Unexpected token, missing delimiter, malformed argument list or trailing input.
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        message: String,
        text: String,
        position: usize,
    },

    /// Literal text that cannot be converted to its target primitive type.
    #[error("Unrecognized '{type_name}' literal '{text}' at position {position}")]
    LiteralFormat {
        type_name: String,
        text: String,
        position: usize,
    },

    /// Nesting deeper than the configured maximum. The position is `None`
    /// when the limit was hit while walking an already built tree.
    #[error("Recursion limit of {limit} exceeded{}", at_position(.position))]
    RecursionLimit {
        limit: usize,
        position: Option<usize>,
    },

    // ========== Bind Errors ==========
    /// Incompatible operand types, or a lambda over a non-collection.
    #[error("Type binding error: {message}")]
    TypeBinding { message: String, text: String },

    /// Unknown property on a closed type, or no (or an ambiguous) function overload.
    #[error("Resolution error: {message}")]
    Resolution { message: String, text: String },
}

/// Result type alias for query front-end operations
pub type Result<T> = std::result::Result<T, QueryError>;

fn at_position(position: &Option<usize>) -> String {
    position.map_or_else(String::new, |p| format!(" at position {}", p))
}

impl QueryError {
    pub fn syntax(message: impl Into<String>, text: impl Into<String>, position: usize) -> Self {
        QueryError::Syntax {
            message: message.into(),
            text: text.into(),
            position,
        }
    }

    pub fn literal_format(
        type_name: impl Into<String>,
        text: impl Into<String>,
        position: usize,
    ) -> Self {
        QueryError::LiteralFormat {
            type_name: type_name.into(),
            text: text.into(),
            position,
        }
    }

    /// `text` is the operator, property, function or type the error is about.
    pub fn type_binding(message: impl Into<String>, text: impl Into<String>) -> Self {
        QueryError::TypeBinding {
            message: message.into(),
            text: text.into(),
        }
    }

    /// `text` is the name that failed to resolve.
    pub fn resolution(message: impl Into<String>, text: impl Into<String>) -> Self {
        QueryError::Resolution {
            message: message.into(),
            text: text.into(),
        }
    }

    /// Zero-based character position in the input, for errors raised while parsing.
    pub fn position(&self) -> Option<usize> {
        match self {
            QueryError::Syntax { position, .. } | QueryError::LiteralFormat { position, .. } => {
                Some(*position)
            }
            QueryError::RecursionLimit { position, .. } => *position,
            QueryError::TypeBinding { .. } | QueryError::Resolution { .. } => None,
        }
    }

    /// The offending input text or name, when there is one.
    pub fn text(&self) -> Option<&str> {
        match self {
            QueryError::Syntax { text, .. }
            | QueryError::LiteralFormat { text, .. }
            | QueryError::TypeBinding { text, .. }
            | QueryError::Resolution { text, .. } => Some(text),
            QueryError::RecursionLimit { .. } => None,
        }
    }

    /// Shifts the position of a parse error by `offset` characters.
    ///
    /// Used when the parsed text is a slice of a larger input, such as one
    /// value of a query string.
    pub fn offset_by(mut self, offset: usize) -> Self {
        match &mut self {
            QueryError::Syntax { position, .. } | QueryError::LiteralFormat { position, .. } => {
                *position += offset
            }
            QueryError::RecursionLimit {
                position: Some(position),
                ..
            } => *position += offset,
            _ => {}
        }
        self
    }

    /// Returns true if this error was raised by the lexer or parser rather than the binder
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            QueryError::Syntax { .. }
                | QueryError::LiteralFormat { .. }
                | QueryError::RecursionLimit {
                    position: Some(_),
                    ..
                }
        )
    }
}
