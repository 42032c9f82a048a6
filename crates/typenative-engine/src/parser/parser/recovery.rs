//! Error recovery: after a failed statement, skip ahead to a point where
//! statement parsing can resume so later errors are reported too.

use super::guards::LoopGuard;
use super::Parser;
use crate::parser::token::Token;

/// Skip tokens until the next statement boundary.
pub fn sync_to_statement_boundary(parser: &mut Parser) {
    let mut guard = LoopGuard::new("statement_recovery");

    while !parser.at_eof() {
        if guard.check().is_err() {
            return;
        }

        match parser.current() {
            Token::Function
            | Token::Class
            | Token::Interface
            | Token::Enum
            | Token::Let
            | Token::Const
            | Token::Var
            | Token::If
            | Token::While
            | Token::Do
            | Token::For
            | Token::Switch
            | Token::Try
            | Token::Return
            | Token::Break
            | Token::Continue
            | Token::Throw
            | Token::Import
            | Token::Export => return,

            Token::Semicolon | Token::RightBrace => {
                parser.advance();
                return;
            }

            _ => {
                parser.advance();
            }
        }
    }
}
