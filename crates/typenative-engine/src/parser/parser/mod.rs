//! Recursive-descent parser for the TypeNative TypeScript subset.
//!
//! The lexer runs to completion first; the parser then walks the token
//! vector with arbitrary lookahead. Ambiguous heads (arrow functions,
//! generic call arguments) are parsed speculatively and rewound through
//! [`Snapshot`] when they turn out to be something else.

pub mod error;
pub mod expr;
pub mod guards;
pub mod precedence;
pub mod recovery;
pub mod stmt;
pub mod types;

use crate::parser::ast::*;
use crate::parser::interner::{Interner, Symbol};
use crate::parser::lexer::{LexError, Lexer};
use crate::parser::token::{Span, Token};

pub use error::{ParseError, ParseErrorKind};

/// Parser state.
pub struct Parser {
    /// Pre-tokenized input, always terminated by `Token::Eof`
    tokens: Vec<(Token, Span)>,

    /// Current position in token stream
    pos: usize,

    /// Accumulated parse errors (parsing continues at statement boundaries)
    errors: Vec<ParseError>,

    /// Current statement/expression nesting
    depth: usize,

    interner: Interner,

    /// Compound `>>`-style tokens split while closing type arguments,
    /// kept so a failed speculation can put them back.
    splits: Vec<(usize, (Token, Span))>,
}

/// Saved parser position for speculative parsing.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pos: usize,
    errors: usize,
    splits: usize,
}

impl Parser {
    /// Tokenize `source` and create a parser positioned on the first token.
    pub fn new(source: &str) -> Result<Self, Vec<LexError>> {
        let (tokens, interner) = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(tokens, interner))
    }

    /// Create a parser over an already lexed token stream.
    pub fn from_tokens(mut tokens: Vec<(Token, Span)>, interner: Interner) -> Self {
        if !matches!(tokens.last(), Some((Token::Eof, _))) {
            let eof_span = match tokens.last() {
                Some((_, last)) => Span::new(last.end, last.end, last.line, last.column),
                None => Span::new(0, 0, 1, 1),
            };
            tokens.push((Token::Eof, eof_span));
        }

        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            depth: 0,
            interner,
            splits: Vec::new(),
        }
    }

    /// Parse the whole file.
    ///
    /// Returns the module together with the interner its symbols refer to,
    /// or every error collected along the way.
    pub fn parse(mut self) -> Result<(Module, Interner), Vec<ParseError>> {
        let start_span = self.current_span();
        let mut statements = Vec::new();

        while !self.at_eof() {
            let before = self.pos;
            match stmt::parse_statement(&mut self) {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    recovery::sync_to_statement_boundary(&mut self);
                    if self.pos == before && !self.at_eof() {
                        self.advance();
                    }
                }
            }
        }

        let span = match statements.last() {
            Some(last) => self.combine_spans(&start_span, last.span()),
            None => start_span,
        };

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        Ok((Module::new(statements, span), self.interner))
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.peek_nth(1)
    }

    /// Look `n` tokens ahead of the current one.
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].1
        }
    }

    /// Advance to the next token, returning the token that was current.
    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    pub fn check_any(&self, expected: &[Token]) -> bool {
        expected.iter().any(|tok| self.check(tok))
    }

    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Consume the current token if it has the expected kind.
    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(&[expected]))
        }
    }

    pub fn expect_any(&mut self, expected: &[Token]) -> Result<Token, ParseError> {
        if self.check_any(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(expected))
        }
    }

    /// Consume the current token when it matches; report whether it did.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True when the current token is the identifier `name`.
    ///
    /// Used for contextual keywords such as `type`, `of` and `as`.
    pub fn check_contextual(&self, name: &str) -> bool {
        matches!(self.current(), Token::Identifier(sym) if self.interner.resolve(*sym) == name)
    }

    /// Contextual keyword check `n` tokens ahead.
    pub fn peek_contextual(&self, n: usize, name: &str) -> bool {
        matches!(self.peek_nth(n), Some(Token::Identifier(sym)) if self.interner.resolve(*sym) == name)
    }

    /// True when a line break separates the previous token from the current one.
    pub fn newline_before_current(&self) -> bool {
        self.pos > 0 && self.tokens[self.pos - 1].1.line < self.current_span().line
    }

    /// True when a line break separates the current token from the next one.
    pub fn newline_after_current(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|(_, span)| span.line > self.current_span().line)
    }

    pub fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current_span();
        match self.current() {
            Token::Identifier(name) => {
                let name = *name;
                self.advance();
                Ok(Identifier::new(name, span))
            }
            Token::LeftBrace | Token::LeftBracket => Err(ParseError::unsupported(
                "Destructuring patterns",
                span,
            )
            .with_suggestion("bind the value to a name and read its members")),
            _ => Err(self.expected_identifier()),
        }
    }

    /// Property names after `.` and in object literals may be keywords.
    pub fn expect_property_name(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current_span();
        if let Token::Identifier(name) = self.current() {
            let name = *name;
            self.advance();
            return Ok(Identifier::new(name, span));
        }
        if self.current().is_keyword() || matches!(self.current(), Token::True | Token::False | Token::Null) {
            let text = self.current().to_string();
            let name = self.interner.intern(&text);
            self.advance();
            return Ok(Identifier::new(name, span));
        }
        Err(self.expected_identifier())
    }

    /// Consume a `>` closing a type argument or parameter list.
    ///
    /// Compound tokens that start with `>` are split so that
    /// `Map<string, Array<number>>` closes both lists.
    pub fn expect_closing_angle(&mut self) -> Result<(), ParseError> {
        let rest = match self.current() {
            Token::Greater => {
                self.advance();
                return Ok(());
            }
            Token::GreaterGreater => Token::Greater,
            Token::GreaterGreaterGreater => Token::GreaterGreater,
            Token::GreaterEqual => Token::Equal,
            Token::GreaterGreaterEqual => Token::GreaterEqual,
            Token::GreaterGreaterGreaterEqual => Token::GreaterGreaterEqual,
            _ => return Err(self.unexpected_token(&[Token::Greater])),
        };

        let (original, span) = self.tokens[self.pos].clone();
        self.splits.push((self.pos, (original, span)));
        let head = Span::new(span.start, span.start + 1, span.line, span.column);
        let tail = Span::new(span.start + 1, span.end, span.line, span.column + 1);
        self.tokens[self.pos] = (Token::Greater, head);
        self.tokens.insert(self.pos + 1, (rest, tail));
        self.advance();
        Ok(())
    }

    // ========================================================================
    // Speculation
    // ========================================================================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            errors: self.errors.len(),
            splits: self.splits.len(),
        }
    }

    /// Rewind to `snapshot`, undoing any token splits made since.
    pub fn restore(&mut self, snapshot: Snapshot) {
        while self.splits.len() > snapshot.splits {
            if let Some((index, original)) = self.splits.pop() {
                self.tokens.remove(index + 1);
                self.tokens[index] = original;
            }
        }
        self.errors.truncate(snapshot.errors);
        self.pos = snapshot.pos;
    }

    // ========================================================================
    // Nesting
    // ========================================================================

    /// Enter one nesting level, failing past `MAX_PARSE_DEPTH`.
    pub fn enter(&mut self, name: &'static str) -> Result<(), ParseError> {
        guards::check_depth(self.depth, name, self.current_span())?;
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Parse a token run lifted out of a template literal hole.
    pub fn parse_embedded<T>(
        &mut self,
        tokens: Vec<(Token, Span)>,
        parse: impl FnOnce(&mut Parser) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let interner = std::mem::take(&mut self.interner);
        let mut sub = Parser::from_tokens(tokens, interner);
        sub.depth = self.depth;

        let result = parse(&mut sub).and_then(|value| {
            if sub.at_eof() {
                Ok(value)
            } else {
                Err(sub.unexpected_token(&[Token::RightBrace]))
            }
        });

        self.interner = sub.interner;
        result
    }

    // ========================================================================
    // Interning
    // ========================================================================

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    // ========================================================================
    // Errors and spans
    // ========================================================================

    pub fn unexpected_token(&self, expected: &[Token]) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected.to_vec(), span)
        } else {
            ParseError::unexpected_token(expected.to_vec(), self.current().clone(), span)
        }
    }

    /// "Expected identifier" error at the current token.
    pub fn expected_identifier(&self) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            let mut err = ParseError::unexpected_eof(Vec::new(), span);
            err.message = "Unexpected end of file, expected identifier".to_string();
            return err;
        }
        let mut err = ParseError::unexpected_token(Vec::new(), self.current().clone(), span);
        err.message = format!("Expected identifier, found '{}'", self.current());
        err
    }

    pub fn combine_spans(&self, start: &Span, end: &Span) -> Span {
        Span {
            start: start.start,
            end: end.end.max(start.end),
            line: start.line,
            column: start.column,
        }
    }

    /// Span from `start` through the last consumed token.
    pub fn span_from(&self, start: &Span) -> Span {
        self.combine_spans(start, &self.previous_span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_new() {
        let parser = Parser::new("let x = 42;").unwrap();
        assert!(matches!(parser.current(), Token::Let));
    }

    #[test]
    fn test_parser_advance_and_peek() {
        let mut parser = Parser::new("let x").unwrap();
        assert!(matches!(parser.peek(), Some(Token::Identifier(_))));
        let tok = parser.advance();
        assert!(matches!(tok, Token::Let));
        assert!(matches!(parser.current(), Token::Identifier(_)));
        parser.advance();
        assert!(parser.at_eof());
    }

    #[test]
    fn test_contextual_keyword() {
        let parser = Parser::new("type Id = number;").unwrap();
        assert!(parser.check_contextual("type"));
        assert!(!parser.check_contextual("of"));
    }

    #[test]
    fn test_closing_angle_split_and_restore() {
        let mut parser = Parser::new("a>>b").unwrap();
        parser.advance();
        let snapshot = parser.snapshot();
        parser.expect_closing_angle().unwrap();
        assert!(matches!(parser.current(), Token::Greater));
        parser.restore(snapshot);
        assert!(matches!(parser.current(), Token::GreaterGreater));
        assert!(matches!(parser.peek(), Some(Token::Identifier(_))));
    }

    #[test]
    fn test_newline_before_current() {
        let mut parser = Parser::new("a\nb").unwrap();
        parser.advance();
        assert!(parser.newline_before_current());
    }

    #[test]
    fn test_keyword_property_name() {
        let mut parser = Parser::new("default").unwrap();
        let name = parser.expect_property_name().unwrap();
        assert_eq!(parser.resolve(name.name), "default");
    }
}
