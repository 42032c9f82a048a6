//! Expression parsing
//!
//! Precedence climbing over the binary operator table, with hand-written
//! prefix, postfix and primary layers.

use super::guards::LoopGuard;
use super::precedence::{get_precedence, is_right_associative, Precedence};
use super::stmt::{parse_block_statement, parse_function_parameters, parse_return_type, parse_type_parameters};
use super::types::{parse_type_annotation, parse_type_arguments, parse_type_reference};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::{Span, TemplatePart as TokenPart, Token};

/// Parse an expression, including assignments and arrow functions.
pub fn parse_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.enter("expression")?;
    let result = parse_assignment(parser);
    parser.leave();
    result
}

fn parse_assignment(parser: &mut Parser) -> Result<Expression, ParseError> {
    if let Some(arrow) = try_parse_arrow(parser)? {
        return Ok(arrow);
    }

    let start = parser.current_span();
    let left = parse_conditional(parser)?;

    let Some(operator) = assignment_operator(parser.current()) else {
        return Ok(left);
    };
    if !is_assignment_target(&left) {
        return Err(ParseError::invalid_syntax(
            "Invalid assignment target",
            *left.span(),
        ));
    }
    parser.advance();

    let right = parse_expression(parser)?;
    Ok(Expression::Assignment(AssignmentExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        span: parser.span_from(&start),
    }))
}

fn is_assignment_target(expr: &Expression) -> bool {
    match expr {
        Expression::Identifier(_) | Expression::Member(_) | Expression::Index(_) => true,
        Expression::Parenthesized(p) => is_assignment_target(&p.expression),
        Expression::NonNull(n) => is_assignment_target(&n.expression),
        Expression::TypeCast(c) => is_assignment_target(&c.object),
        _ => false,
    }
}

fn assignment_operator(token: &Token) -> Option<AssignmentOperator> {
    Some(match token {
        Token::Equal => AssignmentOperator::Assign,
        Token::PlusEqual => AssignmentOperator::AddAssign,
        Token::MinusEqual => AssignmentOperator::SubAssign,
        Token::StarEqual => AssignmentOperator::MulAssign,
        Token::SlashEqual => AssignmentOperator::DivAssign,
        Token::PercentEqual => AssignmentOperator::ModAssign,
        Token::StarStarEqual => AssignmentOperator::ExpAssign,
        Token::AmpEqual => AssignmentOperator::AndAssign,
        Token::PipeEqual => AssignmentOperator::OrAssign,
        Token::CaretEqual => AssignmentOperator::XorAssign,
        Token::LessLessEqual => AssignmentOperator::LeftShiftAssign,
        Token::GreaterGreaterEqual => AssignmentOperator::RightShiftAssign,
        Token::GreaterGreaterGreaterEqual => AssignmentOperator::UnsignedRightShiftAssign,
        Token::AmpAmpEqual => AssignmentOperator::LogicalAndAssign,
        Token::PipePipeEqual => AssignmentOperator::LogicalOrAssign,
        Token::QuestionQuestionEqual => AssignmentOperator::NullishAssign,
        _ => return None,
    })
}

// ============================================================================
// Arrow functions
// ============================================================================

/// Arrow functions are recognised speculatively: a parenthesised head is
/// parsed as a parameter list and rewound if no `=>` follows it.
fn try_parse_arrow(parser: &mut Parser) -> Result<Option<Expression>, ParseError> {
    let start = parser.current_span();
    let is_async = parser.check(&Token::Async)
        && matches!(
            parser.peek(),
            Some(Token::Identifier(_) | Token::LeftParen | Token::Less)
        );
    let offset = usize::from(is_async);

    match parser.peek_nth(offset) {
        Some(Token::Identifier(_)) if matches!(parser.peek_nth(offset + 1), Some(Token::Arrow)) => {
            if is_async {
                parser.advance();
            }
            let name = parser.expect_identifier()?;
            parser.expect(Token::Arrow)?;
            let param = Parameter {
                span: name.span,
                name,
                type_annotation: None,
                default_value: None,
                optional: false,
                is_rest: false,
                property: None,
            };
            let body = parse_arrow_body(parser)?;
            Ok(Some(Expression::Arrow(ArrowFunction {
                params: vec![param],
                return_type: None,
                body,
                is_async,
                span: parser.span_from(&start),
            })))
        }
        Some(Token::LeftParen | Token::Less) => {
            let snapshot = parser.snapshot();
            if is_async {
                parser.advance();
            }
            match parse_arrow_head(parser) {
                Ok((params, return_type)) if parser.check(&Token::Arrow) => {
                    parser.advance();
                    let body = parse_arrow_body(parser)?;
                    Ok(Some(Expression::Arrow(ArrowFunction {
                        params,
                        return_type,
                        body,
                        is_async,
                        span: parser.span_from(&start),
                    })))
                }
                _ => {
                    parser.restore(snapshot);
                    Ok(None)
                }
            }
        }
        _ => Ok(None),
    }
}

fn parse_arrow_head(
    parser: &mut Parser,
) -> Result<(Vec<Parameter>, Option<TypeAnnotation>), ParseError> {
    // Generic arrows keep their parameter names; the bounds are erased
    parse_type_parameters(parser)?;
    let params = parse_function_parameters(parser)?;
    let return_type = parse_return_type(parser)?;
    Ok((params, return_type))
}

fn parse_arrow_body(parser: &mut Parser) -> Result<ArrowBody, ParseError> {
    if parser.check(&Token::LeftBrace) {
        Ok(ArrowBody::Block(parse_block_statement(parser)?))
    } else {
        Ok(ArrowBody::Expression(Box::new(parse_expression(parser)?)))
    }
}

// ============================================================================
// Conditional and binary
// ============================================================================

fn parse_conditional(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let test = parse_binary(parser, Precedence::NullCoalescing)?;

    if !parser.eat(&Token::Question) {
        return Ok(test);
    }

    let consequent = parse_expression(parser)?;
    parser.expect(Token::Colon)?;
    let alternate = parse_expression(parser)?;

    Ok(Expression::Conditional(ConditionalExpression {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
        span: parser.span_from(&start),
    }))
}

fn parse_binary(parser: &mut Parser, min_prec: Precedence) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let mut left = parse_unary(parser)?;
    let mut guard = LoopGuard::new("binary_expression");

    loop {
        guard.check()?;

        // `x as T` binds like a relational operator
        if min_prec <= Precedence::Relational
            && parser.check_contextual("as")
            && !parser.newline_before_current()
        {
            parser.advance();
            if parser.eat(&Token::Const) {
                continue;
            }
            let target_type = parse_type_annotation(parser)?;
            left = Expression::TypeCast(TypeCastExpression {
                object: Box::new(left),
                target_type,
                span: parser.span_from(&start),
            });
            continue;
        }
        if parser.check_contextual("satisfies") && !parser.newline_before_current() {
            parser.advance();
            parse_type_annotation(parser)?;
            continue;
        }

        let token = parser.current().clone();
        let prec = get_precedence(&token);
        if prec == Precedence::None || prec < min_prec {
            break;
        }
        parser.advance();

        match token {
            Token::Instanceof => {
                let type_name = parse_type_reference(parser)?;
                left = Expression::InstanceOf(InstanceOfExpression {
                    object: Box::new(left),
                    type_name,
                    span: parser.span_from(&start),
                });
            }
            Token::In => {
                let object = parse_binary(parser, prec.next())?;
                left = Expression::In(InExpression {
                    key: Box::new(left),
                    object: Box::new(object),
                    span: parser.span_from(&start),
                });
            }
            _ => {
                let next_min = if is_right_associative(&token) {
                    prec
                } else {
                    prec.next()
                };
                let right = parse_binary(parser, next_min)?;
                left = combine_binary(&token, left, right, parser.span_from(&start));
            }
        }
    }

    Ok(left)
}

fn combine_binary(token: &Token, left: Expression, right: Expression, span: Span) -> Expression {
    let left = Box::new(left);
    let right = Box::new(right);

    let logical = match token {
        Token::AmpAmp => Some(LogicalOperator::And),
        Token::PipePipe => Some(LogicalOperator::Or),
        Token::QuestionQuestion => Some(LogicalOperator::NullishCoalescing),
        _ => None,
    };
    if let Some(operator) = logical {
        return Expression::Logical(LogicalExpression {
            operator,
            left,
            right,
            span,
        });
    }

    let operator = match token {
        Token::Plus => BinaryOperator::Add,
        Token::Minus => BinaryOperator::Subtract,
        Token::Star => BinaryOperator::Multiply,
        Token::Slash => BinaryOperator::Divide,
        Token::Percent => BinaryOperator::Modulo,
        Token::StarStar => BinaryOperator::Exponent,
        Token::EqualEqual => BinaryOperator::Equal,
        Token::BangEqual => BinaryOperator::NotEqual,
        Token::EqualEqualEqual => BinaryOperator::StrictEqual,
        Token::BangEqualEqual => BinaryOperator::StrictNotEqual,
        Token::Less => BinaryOperator::LessThan,
        Token::LessEqual => BinaryOperator::LessEqual,
        Token::Greater => BinaryOperator::GreaterThan,
        Token::GreaterEqual => BinaryOperator::GreaterEqual,
        Token::Amp => BinaryOperator::BitwiseAnd,
        Token::Pipe => BinaryOperator::BitwiseOr,
        Token::Caret => BinaryOperator::BitwiseXor,
        Token::LessLess => BinaryOperator::LeftShift,
        Token::GreaterGreater => BinaryOperator::RightShift,
        _ => BinaryOperator::UnsignedRightShift,
    };
    Expression::Binary(BinaryExpression {
        operator,
        left,
        right,
        span,
    })
}

// ============================================================================
// Unary and postfix
// ============================================================================

fn parse_unary(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();

    let operator = match parser.current() {
        Token::Bang => Some(UnaryOperator::Not),
        Token::Minus => Some(UnaryOperator::Minus),
        Token::Plus => Some(UnaryOperator::Plus),
        Token::Tilde => Some(UnaryOperator::BitwiseNot),
        Token::PlusPlus => Some(UnaryOperator::PrefixIncrement),
        Token::MinusMinus => Some(UnaryOperator::PrefixDecrement),
        _ => None,
    };
    if let Some(operator) = operator {
        parser.advance();
        let operand = parse_nested_unary(parser)?;
        return Ok(Expression::Unary(UnaryExpression {
            operator,
            operand: Box::new(operand),
            span: parser.span_from(&start),
        }));
    }

    match parser.current() {
        Token::Typeof => {
            parser.advance();
            let argument = Box::new(parse_nested_unary(parser)?);
            Ok(Expression::Typeof(TypeofExpression {
                argument,
                span: parser.span_from(&start),
            }))
        }
        Token::Void => {
            parser.advance();
            let argument = Box::new(parse_nested_unary(parser)?);
            Ok(Expression::Void(VoidExpression {
                argument,
                span: parser.span_from(&start),
            }))
        }
        Token::Delete => {
            parser.advance();
            let argument = Box::new(parse_nested_unary(parser)?);
            Ok(Expression::Delete(DeleteExpression {
                argument,
                span: parser.span_from(&start),
            }))
        }
        Token::Await => {
            parser.advance();
            let argument = Box::new(parse_nested_unary(parser)?);
            Ok(Expression::Await(AwaitExpression {
                argument,
                span: parser.span_from(&start),
            }))
        }
        Token::Less => {
            // Angle-bracket assertion: <T>value
            parser.advance();
            let target_type = parse_type_annotation(parser)?;
            parser.expect_closing_angle()?;
            let object = Box::new(parse_nested_unary(parser)?);
            Ok(Expression::TypeCast(TypeCastExpression {
                object,
                target_type,
                span: parser.span_from(&start),
            }))
        }
        _ => parse_postfix_update(parser),
    }
}

fn parse_nested_unary(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.enter("unary expression")?;
    let result = parse_unary(parser);
    parser.leave();
    result
}

fn parse_postfix_update(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let expr = parse_call_member(parser)?;

    if parser.newline_before_current() {
        return Ok(expr);
    }
    let operator = match parser.current() {
        Token::PlusPlus => UnaryOperator::PostfixIncrement,
        Token::MinusMinus => UnaryOperator::PostfixDecrement,
        _ => return Ok(expr),
    };
    if !is_assignment_target(&expr) {
        return Err(ParseError::invalid_syntax(
            "Invalid increment/decrement operand",
            *expr.span(),
        ));
    }
    parser.advance();
    Ok(Expression::Unary(UnaryExpression {
        operator,
        operand: Box::new(expr),
        span: parser.span_from(&start),
    }))
}

/// Member access, indexing, calls, optional chains and `!` assertions.
fn parse_call_member(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let mut expr = parse_primary(parser)?;
    let mut guard = LoopGuard::new("call_member");

    loop {
        guard.check()?;
        match parser.current() {
            Token::Dot => {
                parser.advance();
                let property = parser.expect_property_name()?;
                expr = Expression::Member(MemberExpression {
                    object: Box::new(expr),
                    property,
                    optional: false,
                    span: parser.span_from(&start),
                });
            }
            Token::QuestionDot => {
                parser.advance();
                expr = match parser.current() {
                    Token::LeftParen => {
                        let arguments = parse_arguments(parser)?;
                        Expression::Call(CallExpression {
                            callee: Box::new(expr),
                            type_args: None,
                            arguments,
                            optional: true,
                            span: parser.span_from(&start),
                        })
                    }
                    Token::LeftBracket => {
                        parser.advance();
                        let index = parse_expression(parser)?;
                        parser.expect(Token::RightBracket)?;
                        Expression::Index(IndexExpression {
                            object: Box::new(expr),
                            index: Box::new(index),
                            optional: true,
                            span: parser.span_from(&start),
                        })
                    }
                    _ => {
                        let property = parser.expect_property_name()?;
                        Expression::Member(MemberExpression {
                            object: Box::new(expr),
                            property,
                            optional: true,
                            span: parser.span_from(&start),
                        })
                    }
                };
            }
            Token::LeftBracket => {
                parser.advance();
                let index = parse_expression(parser)?;
                parser.expect(Token::RightBracket)?;
                expr = Expression::Index(IndexExpression {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: false,
                    span: parser.span_from(&start),
                });
            }
            Token::LeftParen => {
                let arguments = parse_arguments(parser)?;
                expr = Expression::Call(CallExpression {
                    callee: Box::new(expr),
                    type_args: None,
                    arguments,
                    optional: false,
                    span: parser.span_from(&start),
                });
            }
            Token::Less => {
                let Some(type_args) = try_parse_call_type_arguments(parser) else {
                    break;
                };
                let arguments = parse_arguments(parser)?;
                expr = Expression::Call(CallExpression {
                    callee: Box::new(expr),
                    type_args: Some(type_args),
                    arguments,
                    optional: false,
                    span: parser.span_from(&start),
                });
            }
            Token::Bang if !parser.newline_before_current() => {
                parser.advance();
                expr = Expression::NonNull(NonNullExpression {
                    expression: Box::new(expr),
                    span: parser.span_from(&start),
                });
            }
            Token::TemplateLiteral(_) if !parser.newline_before_current() => {
                return Err(ParseError::unsupported(
                    "Tagged template literals",
                    parser.current_span(),
                ));
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// `f<T>(...)`: only a type argument list directly followed by `(` counts;
/// anything else is rewound and read as a comparison.
fn try_parse_call_type_arguments(parser: &mut Parser) -> Option<Vec<TypeAnnotation>> {
    let snapshot = parser.snapshot();
    match parse_type_arguments(parser) {
        Ok(args) if parser.check(&Token::LeftParen) => Some(args),
        _ => {
            parser.restore(snapshot);
            None
        }
    }
}

/// `(a, ...rest)` call arguments.
pub fn parse_arguments(parser: &mut Parser) -> Result<Vec<Argument>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut arguments = Vec::new();
    let mut guard = LoopGuard::new("call_arguments");

    while !parser.check(&Token::RightParen) && !parser.at_eof() {
        guard.check()?;
        if parser.eat(&Token::DotDotDot) {
            arguments.push(Argument::Spread(parse_expression(parser)?));
        } else {
            arguments.push(Argument::Expression(parse_expression(parser)?));
        }
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(arguments)
}

// ============================================================================
// Primary expressions
// ============================================================================

fn parse_primary(parser: &mut Parser) -> Result<Expression, ParseError> {
    let span = parser.current_span();

    match parser.current().clone() {
        Token::IntLiteral(value) => {
            parser.advance();
            Ok(Expression::IntLiteral(IntLiteral { value, span }))
        }
        Token::FloatLiteral(value) => {
            parser.advance();
            Ok(Expression::FloatLiteral(FloatLiteral { value, span }))
        }
        Token::StringLiteral(value) => {
            parser.advance();
            Ok(Expression::StringLiteral(StringLiteral { value, span }))
        }
        Token::TemplateLiteral(parts) => {
            parser.advance();
            parse_template_literal(parser, parts, span)
        }
        Token::RegexLiteral { pattern, flags } => {
            parser.advance();
            Ok(Expression::RegexLiteral(RegexLiteral {
                pattern,
                flags,
                span,
            }))
        }
        Token::True | Token::False => {
            let value = matches!(parser.advance(), Token::True);
            Ok(Expression::BooleanLiteral(BooleanLiteral { value, span }))
        }
        Token::Null => {
            parser.advance();
            Ok(Expression::NullLiteral(span))
        }
        Token::Identifier(name) => {
            parser.advance();
            Ok(Expression::Identifier(Identifier::new(name, span)))
        }
        Token::This => {
            parser.advance();
            Ok(Expression::This(span))
        }
        Token::Super => {
            parser.advance();
            Ok(Expression::Super(span))
        }
        Token::LeftParen => {
            parser.advance();
            let expression = parse_expression(parser)?;
            parser.expect(Token::RightParen)?;
            Ok(Expression::Parenthesized(ParenthesizedExpression {
                expression: Box::new(expression),
                span: parser.span_from(&span),
            }))
        }
        Token::LeftBracket => parse_array_literal(parser),
        Token::LeftBrace => parse_object_literal(parser),
        Token::Function => parse_function_expression(parser, false),
        Token::Async if matches!(parser.peek(), Some(Token::Function)) => {
            parser.advance();
            parse_function_expression(parser, true)
        }
        Token::New => parse_new(parser),
        Token::Class => Err(ParseError::unsupported("Class expressions", span)
            .with_suggestion("declare the class at the top level")),
        Token::Yield => Err(ParseError::unsupported("Generators", span)),
        _ => Err(parser.unexpected_token(&[])),
    }
}

fn parse_template_literal(
    parser: &mut Parser,
    parts: Vec<TokenPart>,
    span: Span,
) -> Result<Expression, ParseError> {
    let mut lowered = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            TokenPart::String(text) => lowered.push(TemplatePart::String(text)),
            TokenPart::Expression(tokens) => {
                if tokens.is_empty() {
                    return Err(ParseError::invalid_syntax(
                        "Empty template literal substitution",
                        span,
                    ));
                }
                let expression = parser.parse_embedded(tokens, parse_expression)?;
                lowered.push(TemplatePart::Expression(Box::new(expression)));
            }
        }
    }
    Ok(Expression::TemplateLiteral(TemplateLiteral {
        parts: lowered,
        span,
    }))
}

fn parse_array_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftBracket)?;
    let mut elements = Vec::new();
    let mut guard = LoopGuard::new("array_literal");

    while !parser.check(&Token::RightBracket) && !parser.at_eof() {
        guard.check()?;
        if parser.check(&Token::Comma) {
            return Err(ParseError::unsupported("Array holes", parser.current_span()));
        }
        if parser.eat(&Token::DotDotDot) {
            elements.push(ArrayElement::Spread(parse_expression(parser)?));
        } else {
            elements.push(ArrayElement::Expression(parse_expression(parser)?));
        }
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBracket)?;
    Ok(Expression::Array(ArrayExpression {
        elements,
        span: parser.span_from(&start),
    }))
}

fn parse_object_literal(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftBrace)?;
    let mut properties = Vec::new();
    let mut guard = LoopGuard::new("object_literal");

    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        properties.push(parse_object_property(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBrace)?;
    Ok(Expression::Object(ObjectExpression {
        properties,
        span: parser.span_from(&start),
    }))
}

fn ends_property_key(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(Token::Colon | Token::Comma | Token::RightBrace | Token::LeftParen | Token::Less)
    )
}

fn parse_object_property(parser: &mut Parser) -> Result<ObjectProperty, ParseError> {
    let start = parser.current_span();

    if parser.eat(&Token::DotDotDot) {
        let argument = parse_expression(parser)?;
        return Ok(ObjectProperty::Spread(SpreadProperty {
            argument,
            span: parser.span_from(&start),
        }));
    }

    if (parser.check_contextual("get") || parser.check_contextual("set"))
        && !ends_property_key(parser.peek())
    {
        return Err(ParseError::unsupported("Object literal accessors", start));
    }

    let is_async = parser.check(&Token::Async) && !ends_property_key(parser.peek());
    if is_async {
        parser.advance();
    }

    let key_span = parser.current_span();
    let key = match parser.current().clone() {
        Token::StringLiteral(value) => {
            parser.advance();
            PropertyKey::StringLiteral(StringLiteral {
                value,
                span: key_span,
            })
        }
        Token::IntLiteral(value) => {
            parser.advance();
            PropertyKey::IntLiteral(IntLiteral {
                value,
                span: key_span,
            })
        }
        Token::LeftBracket => {
            parser.advance();
            let expression = parse_expression(parser)?;
            parser.expect(Token::RightBracket)?;
            PropertyKey::Computed(expression)
        }
        _ => PropertyKey::Identifier(parser.expect_property_name()?),
    };

    // Method shorthand: { area() { ... } }
    if parser.check(&Token::LeftParen) || parser.check(&Token::Less) {
        let type_params = parse_type_parameters(parser)?;
        let params = parse_function_parameters(parser)?;
        let return_type = parse_return_type(parser)?;
        let body = parse_block_statement(parser)?;
        let value = Expression::Function(FunctionExpression {
            name: None,
            type_params,
            params,
            return_type,
            body,
            is_async,
            span: parser.span_from(&key_span),
        });
        return Ok(ObjectProperty::Property(Property {
            key,
            value,
            span: parser.span_from(&start),
        }));
    }

    if parser.eat(&Token::Colon) {
        let value = parse_expression(parser)?;
        return Ok(ObjectProperty::Property(Property {
            key,
            value,
            span: parser.span_from(&start),
        }));
    }

    // Shorthand: { x }
    match key {
        PropertyKey::Identifier(id) => Ok(ObjectProperty::Property(Property {
            value: Expression::Identifier(id.clone()),
            key: PropertyKey::Identifier(id),
            span: parser.span_from(&start),
        })),
        _ => Err(parser.unexpected_token(&[Token::Colon])),
    }
}

fn parse_function_expression(parser: &mut Parser, is_async: bool) -> Result<Expression, ParseError> {
    let start = if is_async {
        parser.previous_span()
    } else {
        parser.current_span()
    };
    parser.expect(Token::Function)?;
    if parser.check(&Token::Star) {
        return Err(ParseError::unsupported("Generator functions", parser.current_span()));
    }

    let name = if matches!(parser.current(), Token::Identifier(_)) {
        Some(parser.expect_identifier()?)
    } else {
        None
    };
    let type_params = parse_type_parameters(parser)?;
    let params = parse_function_parameters(parser)?;
    let return_type = parse_return_type(parser)?;
    let body = parse_block_statement(parser)?;

    Ok(Expression::Function(FunctionExpression {
        name,
        type_params,
        params,
        return_type,
        body,
        is_async,
        span: parser.span_from(&start),
    }))
}

fn parse_new(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::New)?;

    if parser.check(&Token::Dot) {
        return Err(ParseError::unsupported("new.target", start));
    }

    let mut callee = if parser.check(&Token::New) {
        parse_new(parser)?
    } else {
        parse_primary(parser)?
    };

    let mut guard = LoopGuard::new("new_callee");
    while parser.eat(&Token::Dot) {
        guard.check()?;
        let property = parser.expect_property_name()?;
        callee = Expression::Member(MemberExpression {
            object: Box::new(callee),
            property,
            optional: false,
            span: parser.span_from(&start),
        });
    }

    let type_args = if parser.check(&Token::Less) {
        Some(parse_type_arguments(parser)?)
    } else {
        None
    };
    let arguments = if parser.check(&Token::LeftParen) {
        parse_arguments(parser)?
    } else {
        Vec::new()
    };

    Ok(Expression::New(NewExpression {
        callee: Box::new(callee),
        type_args,
        arguments,
        span: parser.span_from(&start),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> (Expression, Parser) {
        let mut parser = Parser::new(source).unwrap();
        let expr = parse_expression(&mut parser).unwrap();
        (expr, parser)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    #[test]
    fn test_multiplication_binds_tighter() {
        let (expr, _) = parse_expr("1 + 2 * 3");
        let Expression::Binary(add) = expr else {
            panic!("expected binary");
        };
        assert_eq!(add.operator, BinaryOperator::Add);
        assert!(matches!(*add.right, Expression::Binary(ref mul) if mul.operator == BinaryOperator::Multiply));
    }

    #[test]
    fn test_exponent_right_associative() {
        let (expr, _) = parse_expr("2 ** 3 ** 2");
        let Expression::Binary(outer) = expr else {
            panic!("expected binary");
        };
        assert!(matches!(*outer.left, Expression::IntLiteral(_)));
        assert!(matches!(*outer.right, Expression::Binary(_)));
    }

    #[test]
    fn test_nullish_is_logical() {
        let (expr, _) = parse_expr("a ?? 'b'");
        assert!(matches!(
            expr,
            Expression::Logical(LogicalExpression {
                operator: LogicalOperator::NullishCoalescing,
                ..
            })
        ));
    }

    #[test]
    fn test_compound_assignment_right_associative() {
        let (expr, _) = parse_expr("a = b += 1");
        let Expression::Assignment(outer) = expr else {
            panic!("expected assignment");
        };
        assert_eq!(outer.operator, AssignmentOperator::Assign);
        assert!(matches!(*outer.right, Expression::Assignment(ref inner) if inner.operator == AssignmentOperator::AddAssign));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let mut parser = Parser::new("1 = 2").unwrap();
        let err = parse_expression(&mut parser).unwrap_err();
        assert!(err.message.contains("Invalid assignment target"));
    }

    #[test]
    fn test_conditional() {
        let (expr, _) = parse_expr("n > 0 ? 'pos' : 'neg'");
        assert!(matches!(expr, Expression::Conditional(_)));
    }

    #[test]
    fn test_postfix_and_prefix_update() {
        let (expr, _) = parse_expr("i++");
        assert!(matches!(expr, Expression::Unary(ref u) if u.operator == UnaryOperator::PostfixIncrement));
        let (expr, _) = parse_expr("--i");
        assert!(matches!(expr, Expression::Unary(ref u) if u.operator == UnaryOperator::PrefixDecrement));
    }

    // ========================================================================
    // Arrows and calls
    // ========================================================================

    #[test]
    fn test_single_param_arrow() {
        let (expr, _) = parse_expr("x => x * 2");
        let Expression::Arrow(arrow) = expr else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.params.len(), 1);
        assert!(matches!(arrow.body, ArrowBody::Expression(_)));
    }

    #[test]
    fn test_typed_async_arrow_with_block() {
        let (expr, _) = parse_expr("async (a: number, b?: string): Promise<void> => { return; }");
        let Expression::Arrow(arrow) = expr else {
            panic!("expected arrow");
        };
        assert!(arrow.is_async);
        assert_eq!(arrow.params.len(), 2);
        assert!(arrow.params[1].optional);
        assert!(arrow.return_type.is_some());
        assert!(matches!(arrow.body, ArrowBody::Block(_)));
    }

    #[test]
    fn test_parenthesized_is_not_arrow() {
        let (expr, _) = parse_expr("(a + b) * c");
        let Expression::Binary(bin) = expr else {
            panic!("expected binary");
        };
        assert!(matches!(*bin.left, Expression::Parenthesized(_)));
    }

    #[test]
    fn test_generic_call() {
        let (expr, parser) = parse_expr("identity<string>('a')");
        let Expression::Call(call) = expr else {
            panic!("expected call");
        };
        assert_eq!(call.type_args.as_ref().map(Vec::len), Some(1));
        assert!(parser.at_eof());
    }

    #[test]
    fn test_less_than_is_not_generic_call() {
        let (expr, _) = parse_expr("i < n");
        assert!(matches!(expr, Expression::Binary(ref b) if b.operator == BinaryOperator::LessThan));
    }

    #[test]
    fn test_method_chain_with_callbacks() {
        let (expr, _) = parse_expr("[1, 2].map(x => x * 2).filter((x) => x >= 6).join('-')");
        let Expression::Call(join) = expr else {
            panic!("expected call");
        };
        let Expression::Member(member) = *join.callee else {
            panic!("expected member callee");
        };
        assert!(matches!(*member.object, Expression::Call(_)));
    }

    #[test]
    fn test_optional_chain() {
        let (expr, parser) = parse_expr("user?.profile?.getName()");
        let Expression::Call(call) = expr else {
            panic!("expected call");
        };
        let Expression::Member(member) = call.callee.as_ref() else {
            panic!("expected member");
        };
        assert!(member.optional);
        assert_eq!(parser.resolve(member.property.name), "getName");
        assert!(call.callee.is_optional_chain());
    }

    #[test]
    fn test_spread_argument() {
        let (expr, _) = parse_expr("Math.max(...values)");
        let Expression::Call(call) = expr else {
            panic!("expected call");
        };
        assert!(matches!(call.arguments[0], Argument::Spread(_)));
    }

    #[test]
    fn test_new_with_type_args() {
        let (expr, _) = parse_expr("new Promise<string>((resolve) => resolve('done'))");
        let Expression::New(new) = expr else {
            panic!("expected new");
        };
        assert!(new.type_args.is_some());
        assert!(matches!(new.arguments[0], Argument::Expression(Expression::Arrow(_))));
    }

    #[test]
    fn test_new_then_member_call() {
        let (expr, _) = parse_expr("new Counter().increment()");
        let Expression::Call(call) = expr else {
            panic!("expected call");
        };
        assert!(matches!(*call.callee, Expression::Member(ref m) if matches!(*m.object, Expression::New(_))));
    }

    // ========================================================================
    // Literals and assertions
    // ========================================================================

    #[test]
    fn test_template_literal_holes() {
        let (expr, parser) = parse_expr("`Hello, ${user.name}! You are ${age + 1}`");
        let Expression::TemplateLiteral(template) = expr else {
            panic!("expected template");
        };
        assert_eq!(template.parts.len(), 4);
        match &template.parts[0] {
            TemplatePart::String(text) => assert_eq!(parser.resolve(*text), "Hello, "),
            other => panic!("unexpected part {:?}", other),
        }
        assert!(matches!(&template.parts[1], TemplatePart::Expression(e) if matches!(**e, Expression::Member(_))));
        assert!(matches!(&template.parts[3], TemplatePart::Expression(e) if matches!(**e, Expression::Binary(_))));
    }

    #[test]
    fn test_object_literal_forms() {
        let (expr, _) = parse_expr("{ x: 1, y, 'z-key': 2, ...rest, area() { return 0; } }");
        let Expression::Object(object) = expr else {
            panic!("expected object");
        };
        assert_eq!(object.properties.len(), 5);
        assert!(matches!(object.properties[3], ObjectProperty::Spread(_)));
        match &object.properties[4] {
            ObjectProperty::Property(p) => assert!(matches!(p.value, Expression::Function(_))),
            other => panic!("unexpected property {:?}", other),
        }
    }

    #[test]
    fn test_as_cast_and_non_null() {
        let (expr, _) = parse_expr("value as string");
        assert!(matches!(expr, Expression::TypeCast(_)));
        let (expr, _) = parse_expr("<number>value");
        assert!(matches!(expr, Expression::TypeCast(_)));
        let (expr, _) = parse_expr("map.get(key)!");
        assert!(matches!(expr, Expression::NonNull(_)));
    }

    #[test]
    fn test_instanceof_and_typeof() {
        let (expr, _) = parse_expr("pet instanceof Dog");
        assert!(matches!(expr, Expression::InstanceOf(_)));
        let (expr, _) = parse_expr("typeof x === 'string'");
        let Expression::Binary(bin) = expr else {
            panic!("expected binary");
        };
        assert!(matches!(*bin.left, Expression::Typeof(_)));
    }

    #[test]
    fn test_regex_literal_expression() {
        let (expr, parser) = parse_expr("/^[a-z]+$/i.test(input)");
        let Expression::Call(call) = expr else {
            panic!("expected call");
        };
        let Expression::Member(member) = *call.callee else {
            panic!("expected member");
        };
        let Expression::RegexLiteral(regex) = *member.object else {
            panic!("expected regex");
        };
        assert_eq!(parser.resolve(regex.pattern), "^[a-z]+$");
        assert_eq!(parser.resolve(regex.flags), "i");
    }

    #[test]
    fn test_array_hole_rejected() {
        let mut parser = Parser::new("[1, , 2]").unwrap();
        let err = parse_expression(&mut parser).unwrap_err();
        assert!(err.message.contains("Array holes"));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let mut parser = Parser::new(&source).unwrap();
        let err = parse_expression(&mut parser).unwrap_err();
        assert!(matches!(err.kind, super::super::ParseErrorKind::ParserLimitExceeded { .. }));
    }
}
