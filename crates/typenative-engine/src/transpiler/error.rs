//! Translation errors
//!
//! A translation either produces complete Go text or fails with one of
//! these. There is no partial output.

use crate::parser::{LexError, ParseError, Span};
use thiserror::Error;

/// Errors that abort translation of a file
#[derive(Debug, Error, Clone)]
pub enum TranspileError {
    /// The source could not be tokenized
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The source could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An operator with no Go lowering
    #[error("Operator '{operator}' is not supported")]
    UnsupportedOperator {
        /// Operator as written in source
        operator: String,
        span: Span,
    },

    /// A type alias that refers back to itself
    #[error("Type alias '{name}' is cyclic: {}", chain.join(" -> "))]
    CyclicTypeAlias {
        /// Alias that closed the cycle
        name: String,
        /// Aliases visited, in resolution order
        chain: Vec<String>,
        span: Span,
    },

    /// A node is missing a part the lowering needs
    #[error("Malformed syntax tree: {message}")]
    MalformedTree { message: String, span: Span },

    /// A construct that would take the fallback path in strict mode
    #[error("{construct} is not supported in strict mode")]
    UnsupportedConstruct { construct: String, span: Span },
}

impl TranspileError {
    pub fn malformed(message: impl Into<String>, span: Span) -> Self {
        TranspileError::MalformedTree {
            message: message.into(),
            span,
        }
    }

    pub fn unsupported_operator(operator: impl Into<String>, span: Span) -> Self {
        TranspileError::UnsupportedOperator {
            operator: operator.into(),
            span,
        }
    }

    /// Source location of the error
    pub fn span(&self) -> Span {
        match self {
            TranspileError::Lex(e) => *e.span(),
            TranspileError::Parse(e) => e.span,
            TranspileError::UnsupportedOperator { span, .. }
            | TranspileError::CyclicTypeAlias { span, .. }
            | TranspileError::MalformedTree { span, .. }
            | TranspileError::UnsupportedConstruct { span, .. } => *span,
        }
    }

    /// Short stable code used in rendered diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            TranspileError::Lex(_) => "E0001",
            TranspileError::Parse(_) => "E0002",
            TranspileError::UnsupportedOperator { .. } => "E0101",
            TranspileError::CyclicTypeAlias { .. } => "E0102",
            TranspileError::MalformedTree { .. } => "E0103",
            TranspileError::UnsupportedConstruct { .. } => "E0104",
        }
    }
}

pub type TranspileResult<T> = Result<T, TranspileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_alias_message() {
        let err = TranspileError::CyclicTypeAlias {
            name: "A".to_string(),
            chain: vec!["A".to_string(), "B".to_string(), "A".to_string()],
            span: Span::default(),
        };
        assert_eq!(err.to_string(), "Type alias 'A' is cyclic: A -> B -> A");
        assert_eq!(err.code(), "E0102");
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = ParseError::invalid_syntax("bad", Span::new(4, 5, 1, 5));
        let err: TranspileError = parse.into();
        assert_eq!(err.span().start, 4);
        assert!(err.to_string().contains("bad"));
    }
}
