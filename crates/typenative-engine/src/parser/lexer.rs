//! Lexer for the TypeNative TypeScript subset.
//!
//! Regular tokens come from a logos-generated automaton. Whitespace,
//! comments, template literals and regex literals are scanned by hand
//! because they depend on state logos cannot see (brace nesting inside
//! `${}` and the previous significant token).

use crate::parser::interner::Interner;
use crate::parser::token::{Span, TemplatePart, Token};
use logos::Logos;

/// Logos-based token enum, converted to [`Token`] after lexing.
#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[token("function")]
    Function,
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("enum")]
    Enum,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("async")]
    Async,
    #[token("await")]
    Await,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("import")]
    Import,
    #[token("export")]
    Export,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("extends")]
    Extends,
    #[token("typeof")]
    Typeof,
    #[token("instanceof")]
    Instanceof,
    #[token("delete")]
    Delete,
    #[token("void")]
    Void,
    #[token("in")]
    In,
    #[token("debugger")]
    Debugger,
    #[token("yield")]
    Yield,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Identifiers (after keywords)
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Numbers with numeric separator support
    #[regex(r"0[xX][0-9a-fA-F]+(_[0-9a-fA-F]+)*", parse_hex)]
    #[regex(r"0[bB][01]+(_[01]+)*", parse_binary)]
    #[regex(r"0[oO][0-7]+(_[0-7]+)*", parse_octal)]
    #[regex(r"[0-9]+(_[0-9]+)*", parse_int)]
    IntLiteral(Integer),

    #[regex(r"[0-9]+(_[0-9]+)*\.[0-9]*(_[0-9]+)*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+(_[0-9]+)*[eE][+-]?[0-9]+", parse_float)]
    #[regex(r"\.[0-9]+(_[0-9]+)*([eE][+-]?[0-9]+)?", parse_float)]
    FloatLiteral(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[regex(r"'([^'\\\n]|\\.)*'", parse_string)]
    StringLiteral(String),

    #[token("===")]
    EqualEqualEqual,
    #[token("!==")]
    BangEqualEqual,
    #[token(">>>")]
    GreaterGreaterGreater,
    #[token(">>>=")]
    GreaterGreaterGreaterEqual,
    #[token("**")]
    StarStar,
    #[token("**=")]
    StarStarEqual,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("&&=")]
    AmpAmpEqual,
    #[token("||=")]
    PipePipeEqual,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("<<")]
    LessLess,
    #[token(">>")]
    GreaterGreater,
    #[token("<<=")]
    LessLessEqual,
    #[token(">>=")]
    GreaterGreaterEqual,
    #[token("?.")]
    QuestionDot,
    #[token("??=")]
    QuestionQuestionEqual,
    #[token("??")]
    QuestionQuestion,
    #[token("=>")]
    Arrow,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("%=")]
    PercentEqual,
    #[token("&=")]
    AmpEqual,
    #[token("|=")]
    PipeEqual,
    #[token("^=")]
    CaretEqual,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("=")]
    Equal,
    #[token("?")]
    Question,
    #[token("...")]
    DotDotDot,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
}

/// Integer literal value; digits past `i64` keep the nearest float
#[derive(Debug, Clone, Copy, PartialEq)]
enum Integer {
    Exact(i64),
    Wide(f64),
}

fn parse_digits(digits: &str, radix: u32) -> Option<Integer> {
    if let Ok(n) = i64::from_str_radix(digits, radix) {
        return Some(Integer::Exact(n));
    }
    if radix == 10 {
        return digits.parse().ok().map(Integer::Wide);
    }
    digits
        .chars()
        .try_fold(0f64, |acc, c| c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d)))
        .map(Integer::Wide)
}

fn parse_radix(lex: &mut logos::Lexer<'_, LogosToken>, radix: u32) -> Option<Integer> {
    parse_digits(&lex.slice()[2..].replace('_', ""), radix)
}

fn parse_hex(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<Integer> {
    parse_radix(lex, 16)
}

fn parse_binary(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<Integer> {
    parse_radix(lex, 2)
}

fn parse_octal(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<Integer> {
    parse_radix(lex, 8)
}

fn parse_int(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<Integer> {
    parse_digits(&lex.slice().replace('_', ""), 10)
}

fn parse_float(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<f64> {
    lex.slice().replace('_', "").parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<String> {
    let s = lex.slice();
    Some(unescape_string(&s[1..s.len() - 1]))
}

/// Decode the escape sequences of a quoted string or template segment.
pub fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('v') => result.push('\u{b}'),
            Some('0') => result.push('\0'),
            Some('\n') => {}
            Some('u') => {
                let mut hex = String::new();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    while let Some(&ch) = chars.peek() {
                        chars.next();
                        if ch == '}' {
                            break;
                        }
                        hex.push(ch);
                    }
                } else {
                    for _ in 0..4 {
                        match chars.peek() {
                            Some(ch) if ch.is_ascii_hexdigit() => {
                                hex.push(*ch);
                                chars.next();
                            }
                            _ => break,
                        }
                    }
                }
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push_str("\\u");
                        result.push_str(&hex);
                    }
                }
            }
            Some('x') => {
                let mut hex = String::new();
                for _ in 0..2 {
                    match chars.peek() {
                        Some(ch) if ch.is_ascii_hexdigit() => {
                            hex.push(*ch);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 => result.push(byte as char),
                    _ => {
                        result.push_str("\\x");
                        result.push_str(&hex);
                    }
                }
            }
            Some(other) => result.push(other),
            None => break,
        }
    }

    result
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    UnterminatedTemplate { span: Span },
    UnterminatedRegex { span: Span },
    UnterminatedComment { span: Span },
    InvalidNumber { text: String, span: Span },
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
    interner: Interner,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
            interner: Interner::with_capacity(256),
        }
    }

    /// Lexer sharing its parent's interner, used for `${}` template holes.
    fn with_interner(source: &'a str, interner: Interner) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
            interner,
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tokenize(mut self) -> Result<(Vec<(Token, Span)>, Interner), Vec<LexError>> {
        let mut pos = 0;
        let mut line = 1u32;
        let mut column = 1u32;
        let bytes = self.source.as_bytes();

        while pos < bytes.len() {
            // Whitespace and comments
            while pos < bytes.len() {
                match bytes[pos] {
                    b' ' | b'\t' | b'\r' => {
                        column += 1;
                        pos += 1;
                    }
                    b'\n' => {
                        line += 1;
                        column = 1;
                        pos += 1;
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => {
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            pos += 1;
                        }
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'*' => {
                        let start = Span::new(pos, pos + 2, line, column);
                        pos += 2;
                        column += 2;
                        let mut closed = false;
                        while pos < bytes.len() {
                            if bytes[pos] == b'*' && pos + 1 < bytes.len() && bytes[pos + 1] == b'/' {
                                pos += 2;
                                column += 2;
                                closed = true;
                                break;
                            }
                            if bytes[pos] == b'\n' {
                                line += 1;
                                column = 1;
                            } else {
                                column += 1;
                            }
                            pos += 1;
                        }
                        if !closed {
                            self.errors.push(LexError::UnterminatedComment { span: start });
                        }
                    }
                    _ => break,
                }
            }

            if pos >= bytes.len() {
                break;
            }

            let start_span = Span::new(pos, pos + 1, line, column);

            if bytes[pos] == b'`' {
                match self.lex_template(pos + 1, start_span) {
                    Ok((template, end_pos)) => {
                        let span = Span::new(pos, end_pos, line, column);
                        self.tokens.push((Token::TemplateLiteral(template), span));
                        advance_position(&self.source[pos..end_pos], &mut line, &mut column);
                        pos = end_pos;
                    }
                    Err(err) => {
                        self.errors.push(err);
                        break;
                    }
                }
                continue;
            }

            if bytes[pos] == b'/' && self.regex_allowed() {
                match self.lex_regex(pos, start_span) {
                    Ok((token, end_pos)) => {
                        let span = Span::new(pos, end_pos, line, column);
                        self.tokens.push((token, span));
                        column += (end_pos - pos) as u32;
                        pos = end_pos;
                    }
                    Err(err) => {
                        self.errors.push(err);
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            pos += 1;
                        }
                    }
                }
                continue;
            }

            let mut logos_lexer = LogosToken::lexer(&self.source[pos..]);
            let Some(token_result) = logos_lexer.next() else {
                break;
            };
            let range = logos_lexer.span();
            let abs_start = pos + range.start;
            let abs_end = pos + range.end;
            let span = Span::new(abs_start, abs_end, line, column);

            match token_result {
                Ok(logos_token) => {
                    let token = self.convert_token(logos_token);
                    self.tokens.push((token, span));
                }
                Err(_) => {
                    let text = &self.source[abs_start..abs_end];
                    let ch = self.source[abs_start..].chars().next().unwrap_or('\0');
                    let error = if ch == '"' || ch == '\'' {
                        LexError::UnterminatedString { span }
                    } else if ch.is_ascii_digit() {
                        LexError::InvalidNumber {
                            text: text.to_string(),
                            span,
                        }
                    } else {
                        LexError::UnexpectedCharacter { char: ch, span }
                    };
                    self.errors.push(error);
                }
            }

            // Always make progress, even on a zero-width error
            let consumed_end = abs_end.max(pos + self.source[pos..].chars().next().map_or(1, char::len_utf8));
            advance_position(&self.source[pos..consumed_end], &mut line, &mut column);
            pos = consumed_end;
        }

        let eof_span = Span::new(self.source.len(), self.source.len(), line, column);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok((self.tokens, self.interner))
        } else {
            Err(self.errors)
        }
    }

    /// A `/` starts a regex unless the previous token can end an expression.
    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some((token, _)) => !token.ends_expression(),
        }
    }

    fn lex_regex(&mut self, start: usize, start_span: Span) -> Result<(Token, usize), LexError> {
        let bytes = self.source.as_bytes();
        let mut pos = start + 1;
        let mut in_class = false;

        loop {
            match bytes.get(pos) {
                None | Some(b'\n') => {
                    return Err(LexError::UnterminatedRegex { span: start_span });
                }
                Some(b'\\') => pos += 2,
                Some(b'[') => {
                    in_class = true;
                    pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    pos += 1;
                }
                Some(b'/') if !in_class => break,
                Some(_) => pos += 1,
            }
        }

        let pattern = &self.source[start + 1..pos];
        pos += 1;
        let flags_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let flags = &self.source[flags_start..pos];

        let token = Token::RegexLiteral {
            pattern: self.interner.intern(pattern),
            flags: self.interner.intern(flags),
        };
        Ok((token, pos))
    }

    fn convert_token(&mut self, logos_token: LogosToken) -> Token {
        match logos_token {
            LogosToken::Function => Token::Function,
            LogosToken::Class => Token::Class,
            LogosToken::Interface => Token::Interface,
            LogosToken::Enum => Token::Enum,
            LogosToken::Let => Token::Let,
            LogosToken::Const => Token::Const,
            LogosToken::Var => Token::Var,
            LogosToken::If => Token::If,
            LogosToken::Else => Token::Else,
            LogosToken::Switch => Token::Switch,
            LogosToken::Case => Token::Case,
            LogosToken::Default => Token::Default,
            LogosToken::For => Token::For,
            LogosToken::While => Token::While,
            LogosToken::Do => Token::Do,
            LogosToken::Break => Token::Break,
            LogosToken::Continue => Token::Continue,
            LogosToken::Return => Token::Return,
            LogosToken::Async => Token::Async,
            LogosToken::Await => Token::Await,
            LogosToken::Try => Token::Try,
            LogosToken::Catch => Token::Catch,
            LogosToken::Finally => Token::Finally,
            LogosToken::Throw => Token::Throw,
            LogosToken::Import => Token::Import,
            LogosToken::Export => Token::Export,
            LogosToken::New => Token::New,
            LogosToken::This => Token::This,
            LogosToken::Super => Token::Super,
            LogosToken::Extends => Token::Extends,
            LogosToken::Typeof => Token::Typeof,
            LogosToken::Instanceof => Token::Instanceof,
            LogosToken::Delete => Token::Delete,
            LogosToken::Void => Token::Void,
            LogosToken::In => Token::In,
            LogosToken::Debugger => Token::Debugger,
            LogosToken::Yield => Token::Yield,
            LogosToken::True => Token::True,
            LogosToken::False => Token::False,
            LogosToken::Null => Token::Null,
            LogosToken::Identifier(s) => Token::Identifier(self.interner.intern(&s)),
            LogosToken::IntLiteral(Integer::Exact(n)) => Token::IntLiteral(n),
            LogosToken::IntLiteral(Integer::Wide(n)) => Token::FloatLiteral(n),
            LogosToken::FloatLiteral(n) => Token::FloatLiteral(n),
            LogosToken::StringLiteral(s) => Token::StringLiteral(self.interner.intern(&s)),
            LogosToken::EqualEqualEqual => Token::EqualEqualEqual,
            LogosToken::BangEqualEqual => Token::BangEqualEqual,
            LogosToken::GreaterGreaterGreater => Token::GreaterGreaterGreater,
            LogosToken::GreaterGreaterGreaterEqual => Token::GreaterGreaterGreaterEqual,
            LogosToken::StarStar => Token::StarStar,
            LogosToken::StarStarEqual => Token::StarStarEqual,
            LogosToken::EqualEqual => Token::EqualEqual,
            LogosToken::BangEqual => Token::BangEqual,
            LogosToken::LessEqual => Token::LessEqual,
            LogosToken::GreaterEqual => Token::GreaterEqual,
            LogosToken::AmpAmp => Token::AmpAmp,
            LogosToken::PipePipe => Token::PipePipe,
            LogosToken::AmpAmpEqual => Token::AmpAmpEqual,
            LogosToken::PipePipeEqual => Token::PipePipeEqual,
            LogosToken::PlusPlus => Token::PlusPlus,
            LogosToken::MinusMinus => Token::MinusMinus,
            LogosToken::LessLess => Token::LessLess,
            LogosToken::GreaterGreater => Token::GreaterGreater,
            LogosToken::LessLessEqual => Token::LessLessEqual,
            LogosToken::GreaterGreaterEqual => Token::GreaterGreaterEqual,
            LogosToken::QuestionDot => Token::QuestionDot,
            LogosToken::QuestionQuestionEqual => Token::QuestionQuestionEqual,
            LogosToken::QuestionQuestion => Token::QuestionQuestion,
            LogosToken::Arrow => Token::Arrow,
            LogosToken::PlusEqual => Token::PlusEqual,
            LogosToken::MinusEqual => Token::MinusEqual,
            LogosToken::StarEqual => Token::StarEqual,
            LogosToken::SlashEqual => Token::SlashEqual,
            LogosToken::PercentEqual => Token::PercentEqual,
            LogosToken::AmpEqual => Token::AmpEqual,
            LogosToken::PipeEqual => Token::PipeEqual,
            LogosToken::CaretEqual => Token::CaretEqual,
            LogosToken::Plus => Token::Plus,
            LogosToken::Minus => Token::Minus,
            LogosToken::Star => Token::Star,
            LogosToken::Slash => Token::Slash,
            LogosToken::Percent => Token::Percent,
            LogosToken::Bang => Token::Bang,
            LogosToken::Tilde => Token::Tilde,
            LogosToken::Less => Token::Less,
            LogosToken::Greater => Token::Greater,
            LogosToken::Amp => Token::Amp,
            LogosToken::Pipe => Token::Pipe,
            LogosToken::Caret => Token::Caret,
            LogosToken::Equal => Token::Equal,
            LogosToken::Question => Token::Question,
            LogosToken::DotDotDot => Token::DotDotDot,
            LogosToken::Dot => Token::Dot,
            LogosToken::Colon => Token::Colon,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
            LogosToken::Semicolon => Token::Semicolon,
            LogosToken::Comma => Token::Comma,
            // Skipped by logos before conversion
            LogosToken::Whitespace => Token::Eof,
        }
    }

    fn lex_template(
        &mut self,
        start: usize,
        start_span: Span,
    ) -> Result<(Vec<TemplatePart>, usize), LexError> {
        let mut parts = Vec::new();
        let mut raw_segment = String::new();
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while pos < bytes.len() {
            match bytes[pos] {
                b'`' => {
                    if !raw_segment.is_empty() {
                        let sym = self.interner.intern(&unescape_string(&raw_segment));
                        parts.push(TemplatePart::String(sym));
                    }
                    return Ok((parts, pos + 1));
                }
                b'\\' if pos + 1 < bytes.len() => {
                    // Kept raw, decoded once the segment is complete
                    let escaped_len = self.source[pos + 1..].chars().next().map_or(1, char::len_utf8);
                    raw_segment.push_str(&self.source[pos..pos + 1 + escaped_len]);
                    pos += 1 + escaped_len;
                }
                b'$' if pos + 1 < bytes.len() && bytes[pos + 1] == b'{' => {
                    if !raw_segment.is_empty() {
                        let sym = self.interner.intern(&unescape_string(&raw_segment));
                        parts.push(TemplatePart::String(sym));
                        raw_segment.clear();
                    }

                    pos += 2;
                    let expr_start = pos;
                    let mut brace_depth = 1;
                    while pos < bytes.len() {
                        match bytes[pos] {
                            b'{' => brace_depth += 1,
                            b'}' => {
                                brace_depth -= 1;
                                if brace_depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                        pos += 1;
                    }
                    if brace_depth != 0 {
                        return Err(LexError::UnterminatedTemplate { span: start_span });
                    }

                    // The sub-lexer borrows our interner and hands it back
                    let expr_source = &self.source[expr_start..pos];
                    let interner = std::mem::take(&mut self.interner);
                    let sub_lexer = Lexer::with_interner(expr_source, interner);
                    match sub_lexer.tokenize() {
                        Ok((tokens, interner)) => {
                            self.interner = interner;
                            let tokens = tokens
                                .into_iter()
                                .filter(|(t, _)| !matches!(t, Token::Eof))
                                .map(|(t, s)| {
                                    let shifted = Span::new(
                                        s.start + expr_start,
                                        s.end + expr_start,
                                        start_span.line + s.line - 1,
                                        s.column,
                                    );
                                    (t, shifted)
                                })
                                .collect();
                            parts.push(TemplatePart::Expression(tokens));
                        }
                        Err(mut errors) => {
                            return Err(errors
                                .pop()
                                .unwrap_or(LexError::UnterminatedTemplate { span: start_span }));
                        }
                    }
                    pos += 1;
                }
                _ => {
                    let ch_len = self.source[pos..].chars().next().map_or(1, char::len_utf8);
                    raw_segment.push_str(&self.source[pos..pos + ch_len]);
                    pos += ch_len;
                }
            }
        }

        Err(LexError::UnterminatedTemplate { span: start_span })
    }
}

fn advance_position(text: &str, line: &mut u32, column: &mut u32) {
    for c in text.chars() {
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedTemplate { span }
            | LexError::UnterminatedRegex { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. } => span,
        }
    }

    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedTemplate { .. } => "Unterminated template literal".to_string(),
            LexError::UnterminatedRegex { .. } => "Unterminated regular expression".to_string(),
            LexError::UnterminatedComment { .. } => "Unterminated block comment".to_string(),
            LexError::InvalidNumber { text, .. } => format!("Invalid number '{}'", text),
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote on the same line".to_string())
            }
            LexError::UnterminatedTemplate { .. } => {
                Some("Add a closing backtick (`) to terminate the template literal".to_string())
            }
            LexError::UnterminatedRegex { .. } => {
                Some("Regular expression literals must close with '/' on the same line".to_string())
            }
            LexError::UnterminatedComment { .. } => Some("Close the comment with '*/'".to_string()),
            _ => None,
        }
    }

    /// Format the error with the offending source line and a caret.
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        );

        if let Some(error_line) = source.lines().nth(span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, Interner) {
        let (tokens, interner) = Lexer::new(source).tokenize().expect("should lex");
        (tokens.into_iter().map(|(t, _)| t).collect(), interner)
    }

    #[test]
    fn test_keywords_and_contextual_identifiers() {
        let (tokens, interner) = lex("interface enum type of");
        assert_eq!(tokens[0], Token::Interface);
        assert_eq!(tokens[1], Token::Enum);
        match (&tokens[2], &tokens[3]) {
            (Token::Identifier(a), Token::Identifier(b)) => {
                assert_eq!(interner.resolve(*a), "type");
                assert_eq!(interner.resolve(*b), "of");
            }
            other => panic!("expected identifiers, got {:?}", other),
        }
    }

    #[test]
    fn test_regex_literal_after_assignment() {
        let (tokens, interner) = lex(r"let re = /^[a-z\/]+$/gi;");
        match &tokens[3] {
            Token::RegexLiteral { pattern, flags } => {
                assert_eq!(interner.resolve(*pattern), r"^[a-z\/]+$");
                assert_eq!(interner.resolve(*flags), "gi");
            }
            other => panic!("expected regex literal, got {:?}", other),
        }
    }

    #[test]
    fn test_division_after_identifier() {
        let (tokens, _) = lex("a / b / c");
        assert_eq!(tokens[1], Token::Slash);
        assert_eq!(tokens[3], Token::Slash);
    }

    #[test]
    fn test_template_with_expressions() {
        let (tokens, interner) = lex("`hello ${name}!\\n`");
        let Token::TemplateLiteral(parts) = &tokens[0] else {
            panic!("expected template, got {:?}", tokens[0]);
        };
        assert_eq!(parts.len(), 3);
        match &parts[0] {
            TemplatePart::String(sym) => assert_eq!(interner.resolve(*sym), "hello "),
            other => panic!("expected string part, got {:?}", other),
        }
        match &parts[1] {
            TemplatePart::Expression(tokens) => assert_eq!(tokens.len(), 1),
            other => panic!("expected expression part, got {:?}", other),
        }
        match &parts[2] {
            TemplatePart::String(sym) => assert_eq!(interner.resolve(*sym), "!\n"),
            other => panic!("expected string part, got {:?}", other),
        }
    }

    #[test]
    fn test_string_escapes() {
        let (tokens, interner) = lex(r#"'it\'s' "tab\there""#);
        match (&tokens[0], &tokens[1]) {
            (Token::StringLiteral(a), Token::StringLiteral(b)) => {
                assert_eq!(interner.resolve(*a), "it's");
                assert_eq!(interner.resolve(*b), "tab\there");
            }
            other => panic!("expected strings, got {:?}", other),
        }
    }

    #[test]
    fn test_numbers() {
        let (tokens, _) = lex("42 1_000 0xff 1.5 2e3");
        assert_eq!(tokens[0], Token::IntLiteral(42));
        assert_eq!(tokens[1], Token::IntLiteral(1000));
        assert_eq!(tokens[2], Token::IntLiteral(255));
        assert_eq!(tokens[3], Token::FloatLiteral(1.5));
        assert_eq!(tokens[4], Token::FloatLiteral(2000.0));
    }

    #[test]
    fn test_integers_past_i64_become_floats() {
        let (tokens, _) = lex("99999999999999999999999 0x1_0000_0000_0000_0000 9223372036854775807");
        assert_eq!(tokens[0], Token::FloatLiteral(1e23));
        assert_eq!(tokens[1], Token::FloatLiteral(18446744073709551616.0));
        assert_eq!(tokens[2], Token::IntLiteral(i64::MAX));
    }

    #[test]
    fn test_comments_skipped() {
        let (tokens, _) = lex("// line\nlet /* block */ x = 1;");
        assert_eq!(tokens[0], Token::Let);
        assert!(matches!(tokens[1], Token::Identifier(_)));
    }

    #[test]
    fn test_unterminated_string_reported() {
        let errors = Lexer::new("let s = 'abc\n;").tokenize().expect_err("should fail");
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn test_unterminated_template_reported() {
        let errors = Lexer::new("`abc").tokenize().expect_err("should fail");
        assert!(matches!(errors[0], LexError::UnterminatedTemplate { .. }));
        assert!(errors[0].format_with_source("`abc").contains("backtick"));
    }
}
