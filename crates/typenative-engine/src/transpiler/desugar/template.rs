//! Template literals
//!
//! `` `a ${x} b` `` becomes a left-to-right `+` chain of quoted literal
//! segments and stringified expressions.

use super::{go_quote, paren, stringify};
use crate::transpiler::capability::Capability;
use crate::transpiler::types::TypeDesc;

/// One segment of a template after its expressions were lowered
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Literal(String),
    Value { text: String, ty: TypeDesc },
}

/// Concatenate template pieces, with the packages the stringified values
/// reference
pub fn concat(pieces: &[Piece]) -> (String, Vec<Capability>) {
    let mut parts = Vec::new();
    let mut capabilities = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Literal(text) if text.is_empty() => {}
            Piece::Literal(text) => parts.push(go_quote(text)),
            Piece::Value { text, ty } => {
                let (stringified, needs) = stringify(text, ty);
                if ty.is_string() {
                    parts.push(paren(&stringified));
                } else {
                    parts.push(stringified);
                }
                capabilities.extend(needs);
            }
        }
    }

    if parts.is_empty() {
        return ("\"\"".to_string(), capabilities);
    }
    (parts.join(" + "), capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str, ty: TypeDesc) -> Piece {
        Piece::Value {
            text: text.to_string(),
            ty,
        }
    }

    #[test]
    fn test_literal_and_string_value() {
        let (text, capabilities) = concat(&[Piece::Literal("hello ".to_string()), value("name", TypeDesc::String)]);
        assert_eq!(text, "\"hello \" + name");
        assert!(capabilities.is_empty());
    }

    #[test]
    fn test_numbers_are_stringified() {
        let (text, capabilities) = concat(&[
            Piece::Literal("value: ".to_string()),
            value("x + 2", TypeDesc::Number),
            value("ok", TypeDesc::Boolean),
        ]);
        assert_eq!(text, "\"value: \" + strconv.FormatFloat(x + 2, 'f', -1, 64) + fmt.Sprint(ok)");
        assert_eq!(capabilities, vec![Capability::Strconv, Capability::Fmt]);
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(concat(&[]), ("\"\"".to_string(), Vec::new()));
        assert_eq!(concat(&[Piece::Literal(String::new())]).0, "\"\"");
    }

    #[test]
    fn test_string_operands_are_grouped() {
        let (text, _) = concat(&[
            value("a + b", TypeDesc::String),
            Piece::Literal("-".to_string()),
            value("c", TypeDesc::String),
        ]);
        assert_eq!(text, "(a + b) + \"-\" + c");
    }
}
