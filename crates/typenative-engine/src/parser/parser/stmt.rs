//! Statement parsing

use super::expr::parse_expression;
use super::guards::LoopGuard;
use super::types::{parse_object_type_body, parse_type_annotation, parse_type_reference};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::{Span, Token};

/// Parse a statement.
pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    parser.enter("statement")?;
    let result = parse_statement_inner(parser);
    parser.leave();
    result
}

fn parse_statement_inner(parser: &mut Parser) -> Result<Statement, ParseError> {
    match parser.current() {
        Token::Let | Token::Var => parse_variable_statement(parser),
        Token::Const => {
            if matches!(parser.peek(), Some(Token::Enum)) {
                parser.advance();
                parse_enum_declaration(parser, true)
            } else {
                parse_variable_statement(parser)
            }
        }
        Token::Function => parse_function_declaration(parser, false),
        Token::Async if matches!(parser.peek(), Some(Token::Function)) => {
            parser.advance();
            parse_function_declaration(parser, true)
        }
        Token::Class => parse_class_declaration(parser, false),
        Token::Interface => parse_interface_declaration(parser),
        Token::Enum => parse_enum_declaration(parser, false),
        Token::If => parse_if_statement(parser),
        Token::While => parse_while_statement(parser),
        Token::Do => parse_do_while_statement(parser),
        Token::For => parse_for_statement(parser),
        Token::Switch => parse_switch_statement(parser),
        Token::Try => parse_try_statement(parser),
        Token::Return => parse_return_statement(parser),
        Token::Break => {
            let span = parser.current_span();
            parser.advance();
            reject_label(parser)?;
            parser.eat(&Token::Semicolon);
            Ok(Statement::Break(BreakStatement { span }))
        }
        Token::Continue => {
            let span = parser.current_span();
            parser.advance();
            reject_label(parser)?;
            parser.eat(&Token::Semicolon);
            Ok(Statement::Continue(ContinueStatement { span }))
        }
        Token::Throw => {
            let start = parser.current_span();
            parser.advance();
            let value = parse_expression(parser)?;
            parser.eat(&Token::Semicolon);
            Ok(Statement::Throw(ThrowStatement {
                value,
                span: parser.span_from(&start),
            }))
        }
        Token::Import => parse_import_declaration(parser),
        Token::Export => parse_export_declaration(parser),
        Token::LeftBrace => Ok(Statement::Block(parse_block_statement(parser)?)),
        Token::Semicolon => {
            let span = parser.current_span();
            parser.advance();
            Ok(Statement::Empty(span))
        }
        Token::Debugger => Err(ParseError::unsupported("debugger statements", parser.current_span())),
        Token::Identifier(_) => {
            if parser.check_contextual("abstract") && matches!(parser.peek(), Some(Token::Class)) {
                parser.advance();
                return parse_class_declaration(parser, true);
            }
            if parser.check_contextual("type") && matches!(parser.peek(), Some(Token::Identifier(_))) {
                return parse_type_alias_declaration(parser);
            }
            if parser.check_contextual("declare") && !parser.newline_after_current() {
                return Err(ParseError::unsupported("Ambient declarations", parser.current_span()));
            }
            if (parser.check_contextual("namespace") || parser.check_contextual("module"))
                && matches!(parser.peek(), Some(Token::Identifier(_)))
            {
                return Err(ParseError::unsupported("Namespaces", parser.current_span())
                    .with_suggestion("declare the members at the top level"));
            }
            if matches!(parser.peek(), Some(Token::Colon)) {
                return Err(ParseError::unsupported("Labeled statements", parser.current_span()));
            }
            parse_expression_statement(parser)
        }
        _ => parse_expression_statement(parser),
    }
}

fn parse_expression_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let expression = parse_expression(parser)?;
    parser.eat(&Token::Semicolon);
    Ok(Statement::Expression(ExpressionStatement {
        expression,
        span: parser.span_from(&start),
    }))
}

fn reject_label(parser: &Parser) -> Result<(), ParseError> {
    if matches!(parser.current(), Token::Identifier(_)) && !parser.newline_before_current() {
        return Err(ParseError::unsupported("Labeled break/continue", parser.current_span()));
    }
    Ok(())
}

/// `{ statements }`
pub fn parse_block_statement(parser: &mut Parser) -> Result<BlockStatement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftBrace)?;

    let mut statements = Vec::new();
    let mut guard = LoopGuard::new("block_statements");
    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        statements.push(parse_statement(parser)?);
    }

    parser.expect(Token::RightBrace)?;
    Ok(BlockStatement {
        statements,
        span: parser.span_from(&start),
    })
}

// ============================================================================
// Variable Declarations
// ============================================================================

fn parse_variable_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let decl = parse_variable_declaration(parser)?;
    parser.eat(&Token::Semicolon);
    Ok(Statement::VariableDecl(decl))
}

/// `let x: number = 1, y = 2` without the trailing semicolon.
pub fn parse_variable_declaration(parser: &mut Parser) -> Result<VariableDecl, ParseError> {
    let start = parser.current_span();
    let kind = match parser.expect_any(&[Token::Let, Token::Const, Token::Var])? {
        Token::Let => VariableKind::Let,
        Token::Const => VariableKind::Const,
        _ => VariableKind::Var,
    };

    let mut declarations = Vec::new();
    let mut guard = LoopGuard::new("variable_declarators");
    loop {
        guard.check()?;
        let decl_start = parser.current_span();
        let name = parser.expect_identifier()?;
        // Definite assignment assertion: let x!: number;
        parser.eat(&Token::Bang);
        let type_annotation = parse_return_type(parser)?;
        let initializer = if parser.eat(&Token::Equal) {
            Some(parse_expression(parser)?)
        } else {
            None
        };
        declarations.push(VariableDeclarator {
            name,
            type_annotation,
            initializer,
            span: parser.span_from(&decl_start),
        });
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    Ok(VariableDecl {
        kind,
        declarations,
        span: parser.span_from(&start),
    })
}

// ============================================================================
// Functions
// ============================================================================

fn parse_function_declaration(parser: &mut Parser, is_async: bool) -> Result<Statement, ParseError> {
    let start = if is_async {
        parser.previous_span()
    } else {
        parser.current_span()
    };
    parser.expect(Token::Function)?;
    if parser.check(&Token::Star) {
        return Err(ParseError::unsupported("Generator functions", parser.current_span()));
    }

    let name = parser.expect_identifier()?;
    let type_params = parse_type_parameters(parser)?;
    let params = parse_function_parameters(parser)?;
    let return_type = parse_return_type(parser)?;

    if !parser.check(&Token::LeftBrace) {
        return Err(ParseError::unsupported("Function overload signatures", parser.current_span())
            .with_suggestion("keep only the implementation signature"));
    }
    let body = parse_block_statement(parser)?;

    Ok(Statement::FunctionDecl(FunctionDecl {
        name,
        type_params,
        params,
        return_type,
        body,
        is_async,
        span: parser.span_from(&start),
    }))
}

/// `: T` when present.
pub fn parse_return_type(parser: &mut Parser) -> Result<Option<TypeAnnotation>, ParseError> {
    if parser.eat(&Token::Colon) {
        Ok(Some(parse_type_annotation(parser)?))
    } else {
        Ok(None)
    }
}

/// `<T, U extends Shape = Circle>` when present.
pub fn parse_type_parameters(parser: &mut Parser) -> Result<Option<Vec<TypeParameter>>, ParseError> {
    if !parser.eat(&Token::Less) {
        return Ok(None);
    }

    let mut params = Vec::new();
    let mut guard = LoopGuard::new("type_parameters");
    loop {
        guard.check()?;
        let start = parser.current_span();
        parser.eat(&Token::Const);
        let name = parser.expect_identifier()?;
        let constraint = if parser.eat(&Token::Extends) {
            Some(parse_type_annotation(parser)?)
        } else {
            None
        };
        let default = if parser.eat(&Token::Equal) {
            Some(parse_type_annotation(parser)?)
        } else {
            None
        };
        params.push(TypeParameter {
            name,
            constraint,
            default,
            span: parser.span_from(&start),
        });
        if !parser.eat(&Token::Comma) || parser.check(&Token::Greater) {
            break;
        }
    }
    parser.expect_closing_angle()?;

    Ok(Some(params))
}

/// `(a: number, b = 2, ...rest: string[])`, including constructor
/// parameter properties (`private readonly name: string`).
pub fn parse_function_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut params = Vec::new();
    let mut guard = LoopGuard::new("function_parameters");

    while !parser.check(&Token::RightParen) && !parser.at_eof() {
        guard.check()?;
        let start = parser.current_span();

        let property = parse_parameter_modifiers(parser);
        let is_rest = parser.eat(&Token::DotDotDot);
        if parser.check(&Token::This) {
            return Err(ParseError::unsupported("`this` parameters", parser.current_span()));
        }
        let name = parser.expect_identifier()?;
        let optional = parser.eat(&Token::Question);
        let type_annotation = parse_return_type(parser)?;
        let default_value = if parser.eat(&Token::Equal) {
            Some(parse_expression(parser)?)
        } else {
            None
        };

        params.push(Parameter {
            name,
            type_annotation,
            default_value,
            optional,
            is_rest,
            property,
            span: parser.span_from(&start),
        });

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(params)
}

/// Accessibility and `readonly` in front of a parameter. Any of them turns
/// the parameter into a property declaration.
fn parse_parameter_modifiers(parser: &mut Parser) -> Option<Visibility> {
    let mut property = None;
    loop {
        let modifier = match parser.current() {
            Token::Identifier(_) if is_modifier_position(parser) => {
                if parser.check_contextual("public") {
                    Some(Visibility::Public)
                } else if parser.check_contextual("private") {
                    Some(Visibility::Private)
                } else if parser.check_contextual("protected") {
                    Some(Visibility::Protected)
                } else if parser.check_contextual("readonly") || parser.check_contextual("override") {
                    property.or(Some(Visibility::Public))
                } else {
                    None
                }
            }
            _ => None,
        };
        match modifier {
            Some(visibility) => {
                parser.advance();
                property = Some(visibility);
            }
            None => return property,
        }
    }
}

/// A modifier keyword is only a modifier when another name follows it.
fn is_modifier_position(parser: &Parser) -> bool {
    matches!(
        parser.peek(),
        Some(Token::Identifier(_) | Token::DotDotDot | Token::StringLiteral(_) | Token::LeftBracket)
    ) || parser.peek().is_some_and(Token::is_keyword)
}

// ============================================================================
// Classes
// ============================================================================

fn parse_class_declaration(parser: &mut Parser, is_abstract: bool) -> Result<Statement, ParseError> {
    let start = if is_abstract {
        parser.previous_span()
    } else {
        parser.current_span()
    };
    parser.expect(Token::Class)?;
    let name = parser.expect_identifier()?;
    let type_params = parse_type_parameters(parser)?;

    let extends = if parser.eat(&Token::Extends) {
        Some(parse_type_reference(parser)?)
    } else {
        None
    };

    let mut implements = Vec::new();
    if parser.check_contextual("implements") {
        parser.advance();
        let mut guard = LoopGuard::new("class_implements");
        loop {
            guard.check()?;
            implements.push(parse_type_reference(parser)?);
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
    }

    parser.expect(Token::LeftBrace)?;
    let mut members = Vec::new();
    let mut guard = LoopGuard::new("class_members");
    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        if parser.eat(&Token::Semicolon) {
            continue;
        }
        members.push(parse_class_member(parser)?);
    }
    parser.expect(Token::RightBrace)?;

    Ok(Statement::ClassDecl(ClassDecl {
        is_abstract,
        name,
        type_params,
        extends,
        implements,
        members,
        span: parser.span_from(&start),
    }))
}

#[derive(Default)]
struct MemberModifiers {
    visibility: Visibility,
    is_static: bool,
    is_readonly: bool,
    is_abstract: bool,
    is_async: bool,
}

fn parse_class_member(parser: &mut Parser) -> Result<ClassMember, ParseError> {
    let start = parser.current_span();
    let mut modifiers = MemberModifiers::default();

    let mut guard = LoopGuard::new("member_modifiers");
    loop {
        guard.check()?;
        // `static` followed by `(` or `:` is a member named static
        let is_modifier = !matches!(
            parser.peek(),
            Some(Token::LeftParen | Token::Colon | Token::Equal | Token::Semicolon | Token::Question | Token::Less)
        );
        if !is_modifier {
            break;
        }
        if parser.check_contextual("public") {
            modifiers.visibility = Visibility::Public;
        } else if parser.check_contextual("private") {
            modifiers.visibility = Visibility::Private;
        } else if parser.check_contextual("protected") {
            modifiers.visibility = Visibility::Protected;
        } else if parser.check_contextual("static") {
            modifiers.is_static = true;
        } else if parser.check_contextual("readonly") {
            modifiers.is_readonly = true;
        } else if parser.check_contextual("abstract") {
            modifiers.is_abstract = true;
        } else if parser.check_contextual("override") || parser.check_contextual("declare") {
            // no effect on the generated code
        } else if parser.check(&Token::Async) {
            modifiers.is_async = true;
        } else {
            break;
        }
        parser.advance();
    }

    if matches!(parser.current(), Token::LeftBracket) {
        return Err(ParseError::unsupported("Index signatures", parser.current_span()));
    }
    if parser.check(&Token::LeftBrace) && modifiers.is_static {
        return Err(ParseError::unsupported("Static initialization blocks", start));
    }
    if parser.check(&Token::Star) {
        return Err(ParseError::unsupported("Generator methods", parser.current_span()));
    }

    // Accessors: get name() / set name(v)
    let mut kind = MethodKind::Normal;
    if (parser.check_contextual("get") || parser.check_contextual("set"))
        && !matches!(
            parser.peek(),
            Some(Token::LeftParen | Token::Colon | Token::Equal | Token::Semicolon | Token::Question)
        )
    {
        kind = if parser.check_contextual("get") {
            MethodKind::Getter
        } else {
            MethodKind::Setter
        };
        parser.advance();
    }

    if parser.check_contextual("constructor") && matches!(parser.peek(), Some(Token::LeftParen)) {
        parser.advance();
        let params = parse_function_parameters(parser)?;
        let body = parse_block_statement(parser)?;
        return Ok(ClassMember::Constructor(ConstructorDecl {
            params,
            body,
            span: parser.span_from(&start),
        }));
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
    parser.eat(&Token::Bang);

    if parser.check(&Token::LeftParen) || parser.check(&Token::Less) {
        let type_params = parse_type_parameters(parser)?;
        let params = parse_function_parameters(parser)?;
        let return_type = parse_return_type(parser)?;
        let body = if parser.check(&Token::LeftBrace) {
            Some(parse_block_statement(parser)?)
        } else {
            parser.eat(&Token::Semicolon);
            None
        };
        if body.is_none() && !modifiers.is_abstract {
            return Err(ParseError::unsupported("Method overload signatures", name.span)
                .with_suggestion("keep only the implementation signature"));
        }
        return Ok(ClassMember::Method(MethodDecl {
            visibility: modifiers.visibility,
            is_abstract: modifiers.is_abstract,
            name,
            type_params,
            params,
            return_type,
            body,
            is_static: modifiers.is_static,
            is_async: modifiers.is_async,
            kind,
            span: parser.span_from(&start),
        }));
    }

    if kind != MethodKind::Normal {
        return Err(parser.unexpected_token(&[Token::LeftParen]));
    }

    let type_annotation = parse_return_type(parser)?;
    let initializer = if parser.eat(&Token::Equal) {
        Some(parse_expression(parser)?)
    } else {
        None
    };
    parser.eat(&Token::Semicolon);

    Ok(ClassMember::Field(FieldDecl {
        visibility: modifiers.visibility,
        name,
        type_annotation,
        initializer,
        optional,
        is_static: modifiers.is_static,
        is_readonly: modifiers.is_readonly,
        span: parser.span_from(&start),
    }))
}

// ============================================================================
// Interfaces, enums and aliases
// ============================================================================

fn parse_interface_declaration(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Interface)?;
    let name = parser.expect_identifier()?;
    let type_params = parse_type_parameters(parser)?;

    let mut extends = Vec::new();
    if parser.eat(&Token::Extends) {
        let mut guard = LoopGuard::new("interface_extends");
        loop {
            guard.check()?;
            extends.push(parse_type_reference(parser)?);
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
    }

    let members = parse_object_type_body(parser)?;

    Ok(Statement::InterfaceDecl(InterfaceDecl {
        name,
        type_params,
        extends,
        members,
        span: parser.span_from(&start),
    }))
}

fn parse_enum_declaration(parser: &mut Parser, is_const: bool) -> Result<Statement, ParseError> {
    let start = if is_const {
        parser.previous_span()
    } else {
        parser.current_span()
    };
    parser.expect(Token::Enum)?;
    let name = parser.expect_identifier()?;
    parser.expect(Token::LeftBrace)?;

    let mut members = Vec::new();
    let mut guard = LoopGuard::new("enum_members");
    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        let member_start = parser.current_span();
        let member_name = match parser.current().clone() {
            Token::StringLiteral(value) => {
                parser.advance();
                EnumMemberName::StringLiteral(StringLiteral {
                    value,
                    span: member_start,
                })
            }
            _ => EnumMemberName::Identifier(parser.expect_property_name()?),
        };
        let initializer = if parser.eat(&Token::Equal) {
            Some(parse_expression(parser)?)
        } else {
            None
        };
        members.push(EnumMember {
            name: member_name,
            initializer,
            span: parser.span_from(&member_start),
        });
        if !parser.eat(&Token::Comma) {
            break;
        }
    }
    parser.expect(Token::RightBrace)?;

    Ok(Statement::EnumDecl(EnumDecl {
        name,
        is_const,
        members,
        span: parser.span_from(&start),
    }))
}

fn parse_type_alias_declaration(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    // contextual `type`
    parser.advance();
    let name = parser.expect_identifier()?;
    let type_params = parse_type_parameters(parser)?;
    parser.expect(Token::Equal)?;
    let type_annotation = parse_type_annotation(parser)?;
    parser.eat(&Token::Semicolon);

    Ok(Statement::TypeAliasDecl(TypeAliasDecl {
        name,
        type_params,
        type_annotation,
        span: parser.span_from(&start),
    }))
}

// ============================================================================
// Control flow
// ============================================================================

fn parse_parenthesized_condition(parser: &mut Parser) -> Result<Expression, ParseError> {
    parser.expect(Token::LeftParen)?;
    let condition = parse_expression(parser)?;
    parser.expect(Token::RightParen)?;
    Ok(condition)
}

fn parse_if_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::If)?;
    let condition = parse_parenthesized_condition(parser)?;
    let then_branch = Box::new(parse_statement(parser)?);
    let else_branch = if parser.eat(&Token::Else) {
        Some(Box::new(parse_statement(parser)?))
    } else {
        None
    };

    Ok(Statement::If(IfStatement {
        condition,
        then_branch,
        else_branch,
        span: parser.span_from(&start),
    }))
}

fn parse_while_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::While)?;
    let condition = parse_parenthesized_condition(parser)?;
    let body = Box::new(parse_statement(parser)?);

    Ok(Statement::While(WhileStatement {
        condition,
        body,
        span: parser.span_from(&start),
    }))
}

fn parse_do_while_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Do)?;
    let body = Box::new(parse_statement(parser)?);
    parser.expect(Token::While)?;
    let condition = parse_parenthesized_condition(parser)?;
    parser.eat(&Token::Semicolon);

    Ok(Statement::DoWhile(DoWhileStatement {
        body,
        condition,
        span: parser.span_from(&start),
    }))
}

fn parse_for_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::For)?;
    if parser.check(&Token::Await) {
        return Err(ParseError::unsupported("for await loops", parser.current_span()));
    }
    parser.expect(Token::LeftParen)?;

    let init = if parser.check(&Token::Semicolon) {
        None
    } else if parser.check_any(&[Token::Let, Token::Const, Token::Var]) {
        let decl = parse_variable_declaration(parser)?;

        if parser.check_contextual("of") {
            return parse_for_of_rest(parser, start, decl);
        }
        if parser.check(&Token::In) {
            return Err(ParseError::unsupported("for...in loops", parser.current_span())
                .with_suggestion("iterate with for...of over an array of keys"));
        }
        Some(ForInit::VariableDecl(decl))
    } else {
        Some(ForInit::Expression(parse_expression(parser)?))
    };
    parser.expect(Token::Semicolon)?;

    let test = if parser.check(&Token::Semicolon) {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    parser.expect(Token::Semicolon)?;

    let update = if parser.check(&Token::RightParen) {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    parser.expect(Token::RightParen)?;

    let body = Box::new(parse_statement(parser)?);

    Ok(Statement::For(ForStatement {
        init,
        test,
        update,
        body,
        span: parser.span_from(&start),
    }))
}

fn parse_for_of_rest(
    parser: &mut Parser,
    start: Span,
    decl: VariableDecl,
) -> Result<Statement, ParseError> {
    // contextual `of`
    parser.advance();

    let mut declarations = decl.declarations;
    if declarations.len() != 1 || declarations[0].initializer.is_some() {
        return Err(ParseError::invalid_syntax(
            "for...of must declare exactly one binding without an initializer",
            decl.span,
        ));
    }
    let declarator = declarations.remove(0);

    let right = parse_expression(parser)?;
    parser.expect(Token::RightParen)?;
    let body = Box::new(parse_statement(parser)?);

    Ok(Statement::ForOf(ForOfStatement {
        kind: decl.kind,
        binding: declarator.name,
        type_annotation: declarator.type_annotation,
        right,
        body,
        span: parser.span_from(&start),
    }))
}

fn parse_switch_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Switch)?;
    let discriminant = parse_parenthesized_condition(parser)?;
    parser.expect(Token::LeftBrace)?;

    let mut cases = Vec::new();
    let mut guard = LoopGuard::new("switch_cases");
    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        let case_start = parser.current_span();
        let test = match parser.expect_any(&[Token::Case, Token::Default])? {
            Token::Case => Some(parse_expression(parser)?),
            _ => None,
        };
        parser.expect(Token::Colon)?;

        let mut consequent = Vec::new();
        let mut body_guard = LoopGuard::new("switch_case_body");
        while !parser.check_any(&[Token::Case, Token::Default, Token::RightBrace]) && !parser.at_eof() {
            body_guard.check()?;
            consequent.push(parse_statement(parser)?);
        }

        cases.push(SwitchCase {
            test,
            consequent,
            span: parser.span_from(&case_start),
        });
    }
    parser.expect(Token::RightBrace)?;

    Ok(Statement::Switch(SwitchStatement {
        discriminant,
        cases,
        span: parser.span_from(&start),
    }))
}

fn parse_try_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Try)?;
    let body = parse_block_statement(parser)?;

    let catch_clause = if parser.check(&Token::Catch) {
        let catch_start = parser.current_span();
        parser.advance();
        let param = if parser.eat(&Token::LeftParen) {
            let name = parser.expect_identifier()?;
            // `catch (e: unknown)`: the annotation carries no information
            parse_return_type(parser)?;
            parser.expect(Token::RightParen)?;
            Some(name)
        } else {
            None
        };
        let body = parse_block_statement(parser)?;
        Some(CatchClause {
            param,
            body,
            span: parser.span_from(&catch_start),
        })
    } else {
        None
    };

    let finally_clause = if parser.eat(&Token::Finally) {
        Some(parse_block_statement(parser)?)
    } else {
        None
    };

    if catch_clause.is_none() && finally_clause.is_none() {
        return Err(parser.unexpected_token(&[Token::Catch, Token::Finally]));
    }

    Ok(Statement::Try(TryStatement {
        body,
        catch_clause,
        finally_clause,
        span: parser.span_from(&start),
    }))
}

fn parse_return_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Return)?;

    let value = if parser.check_any(&[Token::Semicolon, Token::RightBrace, Token::Eof])
        || parser.newline_before_current()
    {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    parser.eat(&Token::Semicolon);

    Ok(Statement::Return(ReturnStatement {
        value,
        span: parser.span_from(&start),
    }))
}

// ============================================================================
// Modules
// ============================================================================

fn parse_import_declaration(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Import)?;

    // import type { A } from './a'
    if parser.check_contextual("type")
        && !matches!(parser.peek(), Some(Token::Comma))
        && !parser.peek_contextual(1, "from")
    {
        parser.advance();
    }

    let mut specifiers = Vec::new();
    if !matches!(parser.current(), Token::StringLiteral(_)) {
        let mut guard = LoopGuard::new("import_clause");
        loop {
            guard.check()?;
            match parser.current() {
                Token::Star => {
                    parser.advance();
                    if !parser.check_contextual("as") {
                        return Err(parser.unexpected_token(&[]));
                    }
                    parser.advance();
                    specifiers.push(parser.expect_identifier()?);
                }
                Token::LeftBrace => {
                    parser.advance();
                    let mut named_guard = LoopGuard::new("import_specifiers");
                    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
                        named_guard.check()?;
                        if parser.check_contextual("type")
                            && matches!(parser.peek(), Some(Token::Identifier(_)))
                        {
                            parser.advance();
                        }
                        let imported = parser.expect_property_name()?;
                        let local = if parser.check_contextual("as") {
                            parser.advance();
                            parser.expect_identifier()?
                        } else {
                            imported
                        };
                        specifiers.push(local);
                        if !parser.eat(&Token::Comma) {
                            break;
                        }
                    }
                    parser.expect(Token::RightBrace)?;
                }
                _ => specifiers.push(parser.expect_identifier()?),
            }
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
        if !parser.check_contextual("from") {
            return Err(parser.unexpected_token(&[]).with_suggestion("expected `from`"));
        }
        parser.advance();
    }

    let source_span = parser.current_span();
    let source = match parser.advance() {
        Token::StringLiteral(value) => StringLiteral {
            value,
            span: source_span,
        },
        found => {
            return Err(ParseError::unexpected_token(Vec::new(), found, source_span)
                .with_suggestion("import sources are string literals"))
        }
    };
    parser.eat(&Token::Semicolon);

    Ok(Statement::ImportDecl(ImportDecl {
        specifiers,
        source,
        span: parser.span_from(&start),
    }))
}

fn parse_export_declaration(parser: &mut Parser) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Export)?;
    let is_default = parser.eat(&Token::Default);

    let declaration = match parser.current() {
        // export { a, b as c } [from './x'];  export * from './x';
        Token::LeftBrace | Token::Star if !is_default => {
            if parser.eat(&Token::LeftBrace) {
                let mut guard = LoopGuard::new("export_specifiers");
                while !parser.check(&Token::RightBrace) && !parser.at_eof() {
                    guard.check()?;
                    parser.advance();
                }
                parser.expect(Token::RightBrace)?;
            } else {
                parser.advance();
                if parser.check_contextual("as") {
                    parser.advance();
                    parser.expect_identifier()?;
                }
            }
            if parser.check_contextual("from") {
                parser.advance();
                if !matches!(parser.current(), Token::StringLiteral(_)) {
                    return Err(parser.unexpected_token(&[]).with_suggestion("export sources are string literals"));
                }
                parser.advance();
            }
            parser.eat(&Token::Semicolon);
            Statement::Empty(parser.span_from(&start))
        }
        _ => parse_statement(parser)?,
    };

    Ok(Statement::ExportDecl(ExportDecl {
        declaration: Box::new(declaration),
        is_default,
        span: parser.span_from(&start),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_module(source: &str) -> (Module, crate::parser::interner::Interner) {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn parse_one(source: &str) -> Statement {
        let (mut module, _) = parse_module(source);
        assert_eq!(module.statements.len(), 1, "expected one statement");
        module.statements.remove(0)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    #[test]
    fn test_variable_declarators() {
        let Statement::VariableDecl(decl) = parse_one("let a: number = 1, b = 'x', c;") else {
            panic!("expected variable declaration");
        };
        assert_eq!(decl.kind, VariableKind::Let);
        assert_eq!(decl.declarations.len(), 3);
        assert!(decl.declarations[0].type_annotation.is_some());
        assert!(decl.declarations[2].initializer.is_none());
    }

    #[test]
    fn test_function_with_defaults_and_generics() {
        let Statement::FunctionDecl(func) =
            parse_one("function greet<T extends string>(name: T, greeting = 'Hello', ...rest: number[]): string { return greeting; }")
        else {
            panic!("expected function");
        };
        let type_params = func.type_params.unwrap();
        assert!(type_params[0].constraint.is_some());
        assert_eq!(func.params.len(), 3);
        assert!(func.params[1].default_value.is_some());
        assert!(func.params[2].is_rest);
    }

    #[test]
    fn test_async_function() {
        let Statement::FunctionDecl(func) =
            parse_one("async function load(): Promise<string> { return await fetch(); }")
        else {
            panic!("expected function");
        };
        assert!(func.is_async);
    }

    #[test]
    fn test_class_members() {
        let source = r#"
            abstract class Shape extends Base implements Printable, Named {
                static count: number = 0;
                private readonly id: string;
                name?: string;
                constructor(public width: number, private height = 2) { super(); }
                abstract area(): number;
                get label(): string { return this.name; }
                static create(): Shape { return null; }
                async load(): Promise<void> {}
            }
        "#;
        let Statement::ClassDecl(class) = parse_one(source) else {
            panic!("expected class");
        };
        assert!(class.is_abstract);
        assert!(class.extends.is_some());
        assert_eq!(class.implements.len(), 2);
        assert_eq!(class.members.len(), 8);

        let ClassMember::Field(count) = &class.members[0] else {
            panic!("expected field");
        };
        assert!(count.is_static);
        let ClassMember::Field(id) = &class.members[1] else {
            panic!("expected field");
        };
        assert_eq!(id.visibility, Visibility::Private);
        assert!(id.is_readonly);
        let ClassMember::Constructor(ctor) = &class.members[3] else {
            panic!("expected constructor");
        };
        assert_eq!(ctor.params[0].property, Some(Visibility::Public));
        assert_eq!(ctor.params[1].property, Some(Visibility::Private));
        let ClassMember::Method(area) = &class.members[4] else {
            panic!("expected method");
        };
        assert!(area.is_abstract && area.body.is_none());
        let ClassMember::Method(label) = &class.members[5] else {
            panic!("expected getter");
        };
        assert_eq!(label.kind, MethodKind::Getter);
        let ClassMember::Method(load) = &class.members[7] else {
            panic!("expected method");
        };
        assert!(load.is_async);
    }

    #[test]
    fn test_interface_and_alias() {
        let (module, _) = parse_module(
            "interface Dog extends Animal, Pet { bark(): void; name: string; age?: number }\ntype Id = string | number;",
        );
        let Statement::InterfaceDecl(iface) = &module.statements[0] else {
            panic!("expected interface");
        };
        assert_eq!(iface.extends.len(), 2);
        assert_eq!(iface.members.len(), 3);
        assert!(matches!(module.statements[1], Statement::TypeAliasDecl(_)));
    }

    #[test]
    fn test_enums() {
        let (module, interner) =
            parse_module("enum Color { Red, Green = 5, Blue }\nconst enum Dir { Up = 'UP', 'left-key' = 'LEFT' }");
        let Statement::EnumDecl(color) = &module.statements[0] else {
            panic!("expected enum");
        };
        assert!(!color.is_const);
        assert_eq!(color.members.len(), 3);
        assert!(color.members[1].initializer.is_some());
        let Statement::EnumDecl(dir) = &module.statements[1] else {
            panic!("expected const enum");
        };
        assert!(dir.is_const);
        match &dir.members[1].name {
            EnumMemberName::StringLiteral(s) => assert_eq!(interner.resolve(s.value), "left-key"),
            other => panic!("unexpected member name {:?}", other),
        }
    }

    #[test]
    fn test_type_used_as_identifier() {
        let Statement::Expression(stmt) = parse_one("type = 3;") else {
            panic!("expected expression statement");
        };
        assert!(matches!(stmt.expression, Expression::Assignment(_)));
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    #[test]
    fn test_for_loops() {
        let (module, _) = parse_module(
            "for (let i = 0; i < 10; i++) {}\nfor (const x of items) { log(x); }\nfor (;;) { break; }",
        );
        assert!(matches!(module.statements[0], Statement::For(_)));
        let Statement::ForOf(for_of) = &module.statements[1] else {
            panic!("expected for-of");
        };
        assert_eq!(for_of.kind, VariableKind::Const);
        let Statement::For(forever) = &module.statements[2] else {
            panic!("expected for");
        };
        assert!(forever.init.is_none() && forever.test.is_none() && forever.update.is_none());
    }

    #[test]
    fn test_for_in_rejected() {
        let errors = Parser::new("for (const k in obj) {}").unwrap().parse().unwrap_err();
        assert!(errors[0].message.contains("for...in"));
    }

    #[test]
    fn test_switch_cases() {
        let Statement::Switch(switch) =
            parse_one("switch (x) { case 1: a(); break; case 2: case 3: b(); default: c(); }")
        else {
            panic!("expected switch");
        };
        assert_eq!(switch.cases.len(), 4);
        assert_eq!(switch.cases[0].consequent.len(), 2);
        assert!(switch.cases[1].consequent.is_empty());
        assert!(switch.cases[3].test.is_none());
    }

    #[test]
    fn test_try_catch_finally() {
        let Statement::Try(stmt) = parse_one("try { risky(); } catch (e: unknown) { log(e); } finally { done(); }") else {
            panic!("expected try");
        };
        assert!(stmt.catch_clause.as_ref().and_then(|c| c.param.as_ref()).is_some());
        assert!(stmt.finally_clause.is_some());
    }

    #[test]
    fn test_do_while_and_return() {
        let (module, _) = parse_module("do { i++; } while (i < 3);\nfunction f() { return; }");
        assert!(matches!(module.statements[0], Statement::DoWhile(_)));
        let Statement::FunctionDecl(func) = &module.statements[1] else {
            panic!("expected function");
        };
        assert!(matches!(&func.body.statements[0], Statement::Return(r) if r.value.is_none()));
    }

    #[test]
    fn test_import_export() {
        let (module, _) = parse_module(
            "import { a, b as c } from './mod';\nimport * as ns from 'ns';\nexport function f() {}\nexport { a };",
        );
        let Statement::ImportDecl(import) = &module.statements[0] else {
            panic!("expected import");
        };
        assert_eq!(import.specifiers.len(), 2);
        assert!(matches!(module.statements[1], Statement::ImportDecl(_)));
        let Statement::ExportDecl(export) = &module.statements[2] else {
            panic!("expected export");
        };
        assert!(matches!(*export.declaration, Statement::FunctionDecl(_)));
        assert!(module.statements[2].is_hoistable());
        let Statement::ExportDecl(list) = &module.statements[3] else {
            panic!("expected export list");
        };
        assert!(matches!(*list.declaration, Statement::Empty(_)));
    }

    #[test]
    fn test_errors_are_collected_across_statements() {
        let errors = Parser::new("let = 1;\nouter: for (;;) {}\nlet ok = 2;")
            .unwrap()
            .parse()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[1].message.contains("Labeled statements"));
    }

    #[test]
    fn test_destructuring_rejected() {
        let errors = Parser::new("const { a, b } = obj;").unwrap().parse().unwrap_err();
        assert!(errors[0].message.contains("Destructuring"));
    }
}
