//! TypeNative Engine
//!
//! Translates a statically typed subset of TypeScript into a single Go
//! source file:
//! - **Parser**: lexer, parser and syntax tree (`parser` module)
//! - **Transpiler**: declaration registry, type inference and lowering to
//!   Go text (`transpiler` module)
//! - **Report**: source-annotated rendering of errors and diagnostics
//!
//! # Example
//!
//! ```rust,ignore
//! use typenative_engine::{transpile, TranspileOptions};
//!
//! let out = transpile("console.log('hi', 3);", &TranspileOptions::default()).unwrap();
//! assert!(out.code.contains("fmt.Println(\"hi\", 3)"));
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

// ============================================================================
// Core Modules
// ============================================================================

/// Translation options
pub mod config;

/// Lexer, parser and syntax tree
pub mod parser;

/// Rendering of errors and diagnostics against the source
pub mod report;

/// Lowering from the syntax tree to Go
pub mod transpiler;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{TranspileOptions, GENERATED_HEADER};
pub use parser::{ast, Interner, LexError, ParseError, Parser, Span, Symbol};
pub use report::{single_file, Report};
pub use transpiler::{
    transpile, transpile_module, Capability, Diagnostic, Severity, Transpilation, TranspileError,
    TranspileResult,
};
