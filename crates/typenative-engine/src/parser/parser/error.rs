//! Parse error types

use crate::parser::token::{Span, Token};
use std::fmt;

/// A parse error with location and an optional fix-it hint.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,

    pub span: Span,

    /// Human-readable error message
    pub message: String,

    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken { expected: Vec<Token>, found: Token },

    UnexpectedEof { expected: Vec<Token> },

    InvalidSyntax { reason: String },

    /// Syntax the translator deliberately rejects (labels, destructuring, ...)
    Unsupported { feature: String },

    /// Nesting or loop limit hit
    ParserLimitExceeded { message: String },

    /// Position did not advance
    ParserStuck { message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.span.line, self.span.column, self.message
        )?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

fn describe(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ParseError {
    pub fn unexpected_token(expected: Vec<Token>, found: Token, span: Span) -> Self {
        let message = match expected.len() {
            0 => format!("Unexpected token '{}'", found),
            1 => format!("Expected {}, found '{}'", describe(&expected), found),
            _ => format!("Expected one of {}, found '{}'", describe(&expected), found),
        };

        Self {
            kind: ParseErrorKind::UnexpectedToken { expected, found },
            span,
            message,
            suggestion: None,
        }
    }

    pub fn unexpected_eof(expected: Vec<Token>, span: Span) -> Self {
        let message = if expected.is_empty() {
            "Unexpected end of file".to_string()
        } else {
            format!("Unexpected end of file, expected {}", describe(&expected))
        };

        Self {
            kind: ParseErrorKind::UnexpectedEof { expected },
            span,
            message,
            suggestion: None,
        }
    }

    pub fn invalid_syntax(reason: impl Into<String>, span: Span) -> Self {
        let reason = reason.into();
        Self {
            message: format!("Invalid syntax: {}", reason),
            kind: ParseErrorKind::InvalidSyntax { reason },
            span,
            suggestion: None,
        }
    }

    pub fn unsupported(feature: impl Into<String>, span: Span) -> Self {
        let feature = feature.into();
        Self {
            message: format!("{} is not supported", feature),
            kind: ParseErrorKind::Unsupported { feature },
            span,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn parser_limit_exceeded(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        Self {
            kind: ParseErrorKind::ParserLimitExceeded {
                message: message.clone(),
            },
            span,
            message: format!("Parser limit exceeded: {}", message),
            suggestion: None,
        }
    }

    pub fn parser_stuck(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        Self {
            kind: ParseErrorKind::ParserStuck {
                message: message.clone(),
            },
            span,
            message: format!("Parser stuck: {}", message),
            suggestion: None,
        }
    }

    /// Render with the offending source line and a caret underneath.
    pub fn format_with_source(&self, source: &str) -> String {
        let line_text = source
            .lines()
            .nth(self.span.line.saturating_sub(1) as usize)
            .unwrap_or("");
        let caret_pad = " ".repeat(self.span.column.saturating_sub(1) as usize);
        let caret_len = self.span.len().clamp(1, line_text.len().max(1));
        let mut out = format!(
            "error: {}\n --> {}:{}\n  |\n  | {}\n  | {}{}",
            self.message,
            self.span.line,
            self.span.column,
            line_text,
            caret_pad,
            "^".repeat(caret_len)
        );
        if let Some(suggestion) = &self.suggestion {
            out.push_str(&format!("\n  = help: {}", suggestion));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::unexpected_token(
            vec![Token::Semicolon],
            Token::RightParen,
            Span::new(4, 5, 1, 5),
        );
        assert_eq!(err.message, "Expected ';', found ')'");
        assert_eq!(err.to_string(), "Parse error at 1:5: Expected ';', found ')'");
    }

    #[test]
    fn test_format_with_source_points_at_column() {
        let err = ParseError::unsupported("Labeled statements", Span::new(6, 11, 2, 1))
            .with_suggestion("remove the label");
        let rendered = err.format_with_source("let x;\nouter: for (;;) {}");
        assert!(rendered.contains("outer: for"));
        assert!(rendered.contains("^^^^^"));
        assert!(rendered.contains("help: remove the label"));
    }
}
