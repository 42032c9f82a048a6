//! Front end for the TypeScript subset accepted by TypeNative.
//!
//! Lexical analysis is done by [`Lexer`], syntactic analysis by [`Parser`].
//!
//! # Example
//!
//! ```ignore
//! use typenative_engine::parser::Parser;
//!
//! let parser = Parser::new("const x: number = 1 + 2;").unwrap();
//! let (module, interner) = parser.parse().unwrap();
//! assert_eq!(module.statements.len(), 1);
//! ```

pub mod ast;
pub mod interner;
pub mod lexer;
pub mod parser;
pub mod token;

pub use interner::{Interner, Symbol};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use token::{Span, TemplatePart, Token};
