//! Binary operator precedence, following the TypeScript table.

use crate::parser::token::Token;

/// Operator precedence level (higher binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Assignment = 1,      // =, +=, -=, etc.
    Conditional = 2,     // ?:
    NullCoalescing = 3,  // ??
    LogicalOr = 4,       // ||
    LogicalAnd = 5,      // &&
    BitwiseOr = 6,       // |
    BitwiseXor = 7,      // ^
    BitwiseAnd = 8,      // &
    Equality = 9,        // ==, !=, ===, !==
    Relational = 10,     // <, >, <=, >=, instanceof, in, as
    Shift = 11,          // <<, >>, >>>
    Additive = 12,       // +, -
    Multiplicative = 13, // *, /, %
    Exponentiation = 14, // **
    Unary = 15,          // !, ~, +, -, ++, --, typeof, void, delete, await
    Postfix = 16,        // ++, --
    Call = 17,           // (), [], ., ?.
    Member = 18,
    Primary = 19,
}

impl Precedence {
    /// The next tighter level, used for left-associative operands.
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Conditional,
            Precedence::Conditional => Precedence::NullCoalescing,
            Precedence::NullCoalescing => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::BitwiseOr,
            Precedence::BitwiseOr => Precedence::BitwiseXor,
            Precedence::BitwiseXor => Precedence::BitwiseAnd,
            Precedence::BitwiseAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Shift,
            Precedence::Shift => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Exponentiation,
            Precedence::Exponentiation => Precedence::Unary,
            Precedence::Unary => Precedence::Postfix,
            Precedence::Postfix => Precedence::Call,
            Precedence::Call => Precedence::Member,
            Precedence::Member | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Precedence of a binary operator token; `None` for anything else.
pub fn get_precedence(token: &Token) -> Precedence {
    match token {
        Token::QuestionQuestion => Precedence::NullCoalescing,
        Token::PipePipe => Precedence::LogicalOr,
        Token::AmpAmp => Precedence::LogicalAnd,
        Token::Pipe => Precedence::BitwiseOr,
        Token::Caret => Precedence::BitwiseXor,
        Token::Amp => Precedence::BitwiseAnd,

        Token::EqualEqual | Token::BangEqual | Token::EqualEqualEqual | Token::BangEqualEqual => {
            Precedence::Equality
        }

        Token::Less
        | Token::LessEqual
        | Token::Greater
        | Token::GreaterEqual
        | Token::Instanceof
        | Token::In => Precedence::Relational,

        Token::LessLess | Token::GreaterGreater | Token::GreaterGreaterGreater => Precedence::Shift,

        Token::Plus | Token::Minus => Precedence::Additive,

        Token::Star | Token::Slash | Token::Percent => Precedence::Multiplicative,

        Token::StarStar => Precedence::Exponentiation,

        _ => Precedence::None,
    }
}

/// `**` is the only right-associative binary operator.
pub fn is_right_associative(token: &Token) -> bool {
    matches!(token, Token::StarStar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        assert!(get_precedence(&Token::Star) > get_precedence(&Token::Plus));
        assert!(get_precedence(&Token::AmpAmp) > get_precedence(&Token::PipePipe));
        assert!(get_precedence(&Token::PipePipe) > get_precedence(&Token::QuestionQuestion));
        assert_eq!(get_precedence(&Token::Semicolon), Precedence::None);
    }

    #[test]
    fn test_next_level() {
        assert_eq!(Precedence::Additive.next(), Precedence::Multiplicative);
        assert_eq!(Precedence::Primary.next(), Precedence::Primary);
    }

    #[test]
    fn test_exponent_is_right_associative() {
        assert!(is_right_associative(&Token::StarStar));
        assert!(!is_right_associative(&Token::Minus));
    }
}
