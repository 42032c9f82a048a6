//! TypeScript-subset to Go translator
//!
//! Pipeline: lex, parse, split the top level into executable statements
//! and hoistable declarations, register every declaration, lower the
//! executable statements into the entry point, lower the hoisted
//! declarations, assemble and re-indent.

pub mod capability;
pub mod context;
pub mod desugar;
pub mod env;
pub mod error;
pub mod format;
pub mod hoist;
pub mod infer;
pub mod lower;
pub mod types;
pub mod usage;

pub use capability::{Capabilities, Capability};
pub use error::{TranspileError, TranspileResult};
pub use lower::Lowerer;
pub use types::{FuncSig, TypeDesc};

use crate::config::TranspileOptions;
use crate::parser::ast::Module;
use crate::parser::{Interner, Parser, Span};
use serde::Serialize;

/// Severity of a non-fatal diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Note,
}

/// Something the translator wants the user to know about; translation
/// still produced output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip)]
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            line: span.line,
            column: span.column,
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Result of a successful translation
#[derive(Debug, Clone)]
pub struct Transpilation {
    /// Complete Go source file
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Translate one source file
pub fn transpile(source: &str, options: &TranspileOptions) -> TranspileResult<Transpilation> {
    tracing::debug!(bytes = source.len(), "lex");
    let parser = Parser::new(source).map_err(|errors| match errors.into_iter().next() {
        Some(first) => TranspileError::from(first),
        None => TranspileError::malformed("lexer reported failure without an error", Span::default()),
    })?;

    tracing::debug!("parse");
    let (module, interner) = parser.parse().map_err(|errors| match errors.into_iter().next() {
        Some(first) => TranspileError::from(first),
        None => TranspileError::malformed("parser reported failure without an error", Span::default()),
    })?;

    transpile_module(&module, interner, options)
}

/// Translate an already parsed module
pub fn transpile_module(
    module: &Module,
    interner: Interner,
    options: &TranspileOptions,
) -> TranspileResult<Transpilation> {
    Lowerer::new(interner, options.clone()).lower_module(module)
}
