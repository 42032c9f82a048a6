//! Type annotation parsing

use super::guards::LoopGuard;
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Parse a full type: `A | B`, `T[]`, `(x: number) => void`, ...
pub fn parse_type_annotation(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    parser.enter("type")?;
    let result = parse_union_type(parser);
    parser.leave();
    result
}

fn parse_union_type(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    let start = parser.current_span();
    parser.eat(&Token::Pipe);

    let mut types = vec![parse_postfix_type(parser)?];
    let mut guard = LoopGuard::new("union_type");
    while parser.eat(&Token::Pipe) {
        guard.check()?;
        types.push(parse_postfix_type(parser)?);
    }

    if parser.check(&Token::Amp) {
        return Err(ParseError::unsupported("Intersection types", parser.current_span())
            .with_suggestion("declare an interface that extends both types"));
    }

    if types.len() == 1 {
        return Ok(types.remove(0));
    }

    Ok(TypeAnnotation {
        ty: Type::Union(UnionType { types }),
        span: parser.span_from(&start),
    })
}

fn parse_postfix_type(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    let start = parser.current_span();
    let mut ty = parse_primary_type(parser)?;

    let mut guard = LoopGuard::new("array_type");
    while parser.check(&Token::LeftBracket) && !parser.newline_before_current() {
        guard.check()?;
        if !matches!(parser.peek(), Some(Token::RightBracket)) {
            return Err(ParseError::unsupported("Indexed access types", parser.current_span()));
        }
        parser.advance();
        parser.advance();
        ty = TypeAnnotation {
            ty: Type::Array(ArrayType {
                element_type: Box::new(ty),
            }),
            span: parser.span_from(&start),
        };
    }

    Ok(ty)
}

fn parse_primary_type(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    let start = parser.current_span();

    let ty = match parser.current().clone() {
        Token::LeftParen => return parse_parenthesized_or_function_type(parser),
        Token::LeftBrace => Type::Object(ObjectType {
            members: parse_object_type_body(parser)?,
        }),
        Token::LeftBracket => {
            parser.advance();
            let mut element_types = Vec::new();
            let mut guard = LoopGuard::new("tuple_type");
            while !parser.check(&Token::RightBracket) && !parser.at_eof() {
                guard.check()?;
                element_types.push(parse_type_annotation(parser)?);
                if !parser.eat(&Token::Comma) {
                    break;
                }
            }
            parser.expect(Token::RightBracket)?;
            Type::Tuple(TupleType { element_types })
        }
        Token::StringLiteral(value) => {
            parser.advance();
            Type::StringLiteral(value)
        }
        Token::IntLiteral(value) => {
            parser.advance();
            Type::NumberLiteral(value as f64)
        }
        Token::FloatLiteral(value) => {
            parser.advance();
            Type::NumberLiteral(value)
        }
        Token::Minus => {
            parser.advance();
            match parser.advance() {
                Token::IntLiteral(value) => Type::NumberLiteral(-(value as f64)),
                Token::FloatLiteral(value) => Type::NumberLiteral(-value),
                found => {
                    return Err(ParseError::unexpected_token(
                        vec![Token::IntLiteral(0)],
                        found,
                        parser.previous_span(),
                    ))
                }
            }
        }
        Token::True => {
            parser.advance();
            Type::BooleanLiteral(true)
        }
        Token::False => {
            parser.advance();
            Type::BooleanLiteral(false)
        }
        Token::Null => {
            parser.advance();
            Type::Primitive(PrimitiveType::Null)
        }
        Token::Void => {
            parser.advance();
            Type::Primitive(PrimitiveType::Void)
        }
        Token::Typeof => {
            return Err(ParseError::unsupported("Type queries (typeof T)", start));
        }
        Token::New => {
            return Err(ParseError::unsupported("Constructor types", start));
        }
        Token::Identifier(sym) => {
            let name = parser.resolve(sym);
            if matches!(name, "keyof" | "infer" | "unique") {
                return Err(ParseError::unsupported(format!("'{}' type operators", name), start));
            }
            if let Some(primitive) = PrimitiveType::from_name(name) {
                parser.advance();
                Type::Primitive(primitive)
            } else {
                return parse_type_reference(parser);
            }
        }
        _ => return Err(parser.unexpected_token(&[])),
    };

    Ok(TypeAnnotation {
        ty,
        span: parser.span_from(&start),
    })
}

/// A named type with optional arguments: `Promise<string>`.
pub fn parse_type_reference(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    let start = parser.current_span();
    let name = parser.expect_identifier()?;

    if parser.check(&Token::Dot) {
        return Err(ParseError::unsupported("Qualified type names", parser.current_span()));
    }

    let type_args = if parser.check(&Token::Less) {
        Some(parse_type_arguments(parser)?)
    } else {
        None
    };

    Ok(TypeAnnotation {
        ty: Type::Reference(TypeReference { name, type_args }),
        span: parser.span_from(&start),
    })
}

/// `<A, B>` in a type or call position.
pub fn parse_type_arguments(parser: &mut Parser) -> Result<Vec<TypeAnnotation>, ParseError> {
    parser.expect(Token::Less)?;
    let mut args = Vec::new();
    let mut guard = LoopGuard::new("type_arguments");
    loop {
        guard.check()?;
        args.push(parse_type_annotation(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect_closing_angle()?;
    Ok(args)
}

fn parse_parenthesized_or_function_type(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    let start = parser.current_span();
    let snapshot = parser.snapshot();

    if let Ok(ty) = parse_function_type(parser) {
        return Ok(ty);
    }
    parser.restore(snapshot);

    parser.expect(Token::LeftParen)?;
    let inner = parse_type_annotation(parser)?;
    parser.expect(Token::RightParen)?;
    Ok(TypeAnnotation {
        ty: Type::Parenthesized(Box::new(inner)),
        span: parser.span_from(&start),
    })
}

fn parse_function_type(parser: &mut Parser) -> Result<TypeAnnotation, ParseError> {
    let start = parser.current_span();
    let params = parse_function_type_params(parser)?;
    parser.expect(Token::Arrow)?;
    let return_type = parse_type_annotation(parser)?;
    Ok(TypeAnnotation {
        ty: Type::Function(FunctionType {
            params,
            return_type: Box::new(return_type),
        }),
        span: parser.span_from(&start),
    })
}

/// `(a: number, b?: string)` in a function type or method signature.
pub fn parse_function_type_params(parser: &mut Parser) -> Result<Vec<FunctionTypeParam>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut params = Vec::new();
    let mut guard = LoopGuard::new("function_type_params");

    while !parser.check(&Token::RightParen) && !parser.at_eof() {
        guard.check()?;
        let param_start = parser.current_span();
        let is_rest = parser.eat(&Token::DotDotDot);
        let name = parser.expect_identifier()?;
        let optional = parser.eat(&Token::Question);
        let ty = if parser.eat(&Token::Colon) {
            parse_type_annotation(parser)?
        } else {
            TypeAnnotation {
                ty: Type::Primitive(PrimitiveType::Any),
                span: param_start,
            }
        };
        let ty = if is_rest && !matches!(ty.ty, Type::Array(_)) {
            let span = ty.span;
            TypeAnnotation {
                ty: Type::Array(ArrayType {
                    element_type: Box::new(ty),
                }),
                span,
            }
        } else {
            ty
        };
        params.push(FunctionTypeParam {
            name: Some(name),
            ty,
            optional,
        });
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(params)
}

/// `{ x: number; y?: string; area(): number }`, shared by interfaces and
/// object type literals.
pub fn parse_object_type_body(parser: &mut Parser) -> Result<Vec<ObjectTypeMember>, ParseError> {
    parser.expect(Token::LeftBrace)?;
    let mut members = Vec::new();
    let mut guard = LoopGuard::new("object_type_members");

    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        if parser.eat(&Token::Semicolon) || parser.eat(&Token::Comma) {
            continue;
        }
        members.push(parse_object_type_member(parser)?);
    }

    parser.expect(Token::RightBrace)?;
    Ok(members)
}

fn parse_object_type_member(parser: &mut Parser) -> Result<ObjectTypeMember, ParseError> {
    let start = parser.current_span();

    let readonly = parser.check_contextual("readonly")
        && !matches!(
            parser.peek(),
            Some(Token::Colon | Token::Question | Token::LeftParen | Token::Semicolon)
        );
    if readonly {
        parser.advance();
    }

    match parser.current() {
        Token::LeftBracket => {
            return Err(ParseError::unsupported("Index signatures", start)
                .with_suggestion("use Map<K, V> or a typed array instead"));
        }
        Token::LeftParen | Token::Less => {
            return Err(ParseError::unsupported("Call signatures", start));
        }
        _ => {}
    }

    let name = match parser.current().clone() {
        Token::StringLiteral(sym) => {
            let span = parser.current_span();
            parser.advance();
            Identifier::new(sym, span)
        }
        _ => parser.expect_property_name()?,
    };
    let optional = parser.eat(&Token::Question);

    if parser.check(&Token::LeftParen) || parser.check(&Token::Less) {
        if parser.check(&Token::Less) {
            // Method-level generics are erased from the signature
            parse_type_arguments(parser)?;
        }
        let params = parse_function_type_params(parser)?;
        let return_type = if parser.eat(&Token::Colon) {
            parse_type_annotation(parser)?
        } else {
            TypeAnnotation {
                ty: Type::Primitive(PrimitiveType::Void),
                span: parser.previous_span(),
            }
        };
        return Ok(ObjectTypeMember::Method(ObjectTypeMethod {
            name,
            params,
            return_type,
            span: parser.span_from(&start),
        }));
    }

    parser.expect(Token::Colon)?;
    let ty = parse_type_annotation(parser)?;
    Ok(ObjectTypeMember::Property(ObjectTypeProperty {
        name,
        ty,
        optional,
        readonly,
        span: parser.span_from(&start),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_type(source: &str) -> (TypeAnnotation, Parser) {
        let mut parser = Parser::new(source).unwrap();
        let ty = parse_type_annotation(&mut parser).unwrap();
        (ty, parser)
    }

    #[test]
    fn test_primitive_and_array() {
        let (ty, _) = parse_type("number[][]");
        let Type::Array(outer) = ty.ty else {
            panic!("expected array type");
        };
        let Type::Array(inner) = outer.element_type.ty else {
            panic!("expected nested array type");
        };
        assert_eq!(inner.element_type.ty, Type::Primitive(PrimitiveType::Number));
    }

    #[test]
    fn test_nilable_union() {
        let (ty, _) = parse_type("string | null | undefined");
        let Type::Union(union) = ty.ty else {
            panic!("expected union");
        };
        assert_eq!(union.types.len(), 3);
        assert_eq!(union.types[1].ty, Type::Primitive(PrimitiveType::Null));
    }

    #[test]
    fn test_nested_generic_closes_shift_token() {
        let (ty, parser) = parse_type("Promise<Array<number>>");
        assert!(parser.at_eof());
        let Type::Reference(reference) = ty.ty else {
            panic!("expected reference");
        };
        assert_eq!(parser.resolve(reference.name.name), "Promise");
        let args = reference.type_args.unwrap();
        assert!(matches!(args[0].ty, Type::Reference(_)));
    }

    #[test]
    fn test_function_type() {
        let (ty, _) = parse_type("(value: string, index?: number) => void");
        let Type::Function(func) = ty.ty else {
            panic!("expected function type");
        };
        assert_eq!(func.params.len(), 2);
        assert!(func.params[1].optional);
        assert_eq!(func.return_type.ty, Type::Primitive(PrimitiveType::Void));
    }

    #[test]
    fn test_parenthesized_type() {
        let (ty, _) = parse_type("(string | number)[]");
        let Type::Array(array) = ty.ty else {
            panic!("expected array");
        };
        assert!(matches!(array.element_type.ty, Type::Parenthesized(_)));
    }

    #[test]
    fn test_object_type_members() {
        let (ty, parser) = parse_type("{ readonly x: number; y?: string, area(): number }");
        let Type::Object(object) = ty.ty else {
            panic!("expected object type");
        };
        assert_eq!(object.members.len(), 3);
        match &object.members[0] {
            ObjectTypeMember::Property(prop) => {
                assert!(prop.readonly);
                assert_eq!(parser.resolve(prop.name.name), "x");
            }
            other => panic!("unexpected member {:?}", other),
        }
        assert!(matches!(&object.members[1], ObjectTypeMember::Property(p) if p.optional));
        assert!(matches!(&object.members[2], ObjectTypeMember::Method(_)));
    }

    #[test]
    fn test_literal_types() {
        let (ty, _) = parse_type("'up' | 'down' | -1");
        let Type::Union(union) = ty.ty else {
            panic!("expected union");
        };
        assert!(matches!(union.types[0].ty, Type::StringLiteral(_)));
        assert_eq!(union.types[2].ty, Type::NumberLiteral(-1.0));
    }

    #[test]
    fn test_intersection_rejected() {
        let mut parser = Parser::new("A & B").unwrap();
        let err = parse_type_annotation(&mut parser).unwrap_err();
        assert!(err.message.contains("Intersection types"));
    }
}
