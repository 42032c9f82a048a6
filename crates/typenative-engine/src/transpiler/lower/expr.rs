//! Expressions
//!
//! Go has no conditional operator, no optional chaining and no
//! truthiness, so several value forms become immediately-invoked closures.
//! Operand coercions follow the static types from `infer`.

use super::stmt::braced;
use super::{FnBody, Lowerer};
use crate::parser::ast::*;
use crate::transpiler::capability::Capability;
use crate::transpiler::context::LowerCtx;
use crate::transpiler::desugar::{self, builtins, enums, optional, promise, regex, template};
use crate::transpiler::error::{TranspileError, TranspileResult};
use crate::transpiler::infer::has_optional_link;
use crate::transpiler::types::TypeDesc;

/// Rewrite the innermost optional link of a chain so it reads from `temp`.
/// Returns the rewritten chain and the object the link guarded.
fn detach<'a>(expr: &'a Expression, temp: &Identifier) -> Option<(Expression, &'a Expression)> {
    let placeholder = || Box::new(Expression::Identifier(temp.clone()));
    match expr {
        Expression::Member(member) => {
            let (object, guarded) = if has_optional_link(&member.object) {
                let (object, guarded) = detach(&member.object, temp)?;
                (Box::new(object), guarded)
            } else if member.optional {
                (placeholder(), &*member.object)
            } else {
                return None;
            };
            Some((
                Expression::Member(MemberExpression {
                    object,
                    property: member.property.clone(),
                    optional: false,
                    span: member.span,
                }),
                guarded,
            ))
        }
        Expression::Index(index) => {
            let (object, guarded) = if has_optional_link(&index.object) {
                let (object, guarded) = detach(&index.object, temp)?;
                (Box::new(object), guarded)
            } else if index.optional {
                (placeholder(), &*index.object)
            } else {
                return None;
            };
            Some((
                Expression::Index(IndexExpression {
                    object,
                    index: index.index.clone(),
                    optional: false,
                    span: index.span,
                }),
                guarded,
            ))
        }
        Expression::Call(call) => {
            let (callee, guarded) = if has_optional_link(&call.callee) {
                let (callee, guarded) = detach(&call.callee, temp)?;
                (Box::new(callee), guarded)
            } else if call.optional {
                (placeholder(), &*call.callee)
            } else {
                return None;
            };
            Some((
                Expression::Call(CallExpression {
                    callee,
                    type_args: call.type_args.clone(),
                    arguments: call.arguments.clone(),
                    optional: false,
                    span: call.span,
                }),
                guarded,
            ))
        }
        Expression::NonNull(inner) => {
            let (expression, guarded) = detach(&inner.expression, temp)?;
            Some((
                Expression::NonNull(NonNullExpression {
                    expression: Box::new(expression),
                    span: inner.span,
                }),
                guarded,
            ))
        }
        _ => None,
    }
}

/// `func() T {\nbody\n}()`
fn is_literal(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::IntLiteral(_)
            | Expression::FloatLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::BooleanLiteral(_)
            | Expression::NullLiteral(_)
    )
}

pub(super) fn iife(result: &TypeDesc, body: &str) -> String {
    let ty = result.go_type();
    if ty.is_empty() {
        format!("func() {{\n{}\n}}()", body)
    } else {
        format!("func() {} {{\n{}\n}}()", ty, body)
    }
}

impl Lowerer {
    /// Lower an expression in value position
    pub(crate) fn lower_expr(&mut self, expr: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        match expr {
            Expression::Member(_) | Expression::Index(_) | Expression::Call(_) if has_optional_link(expr) => {
                self.lower_optional_chain(expr, ctx)
            }
            Expression::IntLiteral(lit) => Ok(lit.value.to_string()),
            Expression::FloatLiteral(lit) => Ok(enums::number_literal(lit.value)),
            Expression::StringLiteral(lit) => Ok(desugar::go_quote(self.interner.resolve(lit.value))),
            Expression::TemplateLiteral(template) => self.lower_template(template, ctx),
            Expression::RegexLiteral(lit) => self.lower_regex_literal(lit),
            Expression::BooleanLiteral(lit) => Ok(lit.value.to_string()),
            Expression::NullLiteral(_) => Ok("nil".to_string()),
            Expression::Identifier(id) => Ok(self.lower_identifier(id, ctx)),
            Expression::Array(array) => self.lower_array(array, ctx),
            Expression::Object(object) => self.lower_object(object, ctx),
            Expression::Unary(unary) => self.lower_unary(unary, ctx),
            Expression::Binary(binary) => self.lower_binary(binary, ctx),
            Expression::Assignment(assign) => {
                let ty = self.type_of(&assign.left);
                let target = self.lower_expr(&assign.left, &ctx.for_child())?;
                let stmt = self.lower_assignment(assign, ctx)?;
                Ok(iife(&ty, &format!("{}\nreturn {}", stmt, target)))
            }
            Expression::Logical(logical) => self.lower_logical(expr, logical, ctx),
            Expression::Conditional(cond) => self.lower_conditional(expr, cond, ctx),
            Expression::Call(call) => self.lower_call(call, ctx, false),
            Expression::Member(member) => self.lower_member(member, ctx),
            Expression::Index(index) => self.lower_index(index, ctx),
            Expression::New(new) => self.lower_new(new, ctx),
            Expression::Arrow(arrow) => {
                let hint = ctx.expected.as_ref().and_then(TypeDesc::signature).cloned();
                let (text, _) = self.lower_closure(
                    &arrow.params,
                    arrow.return_type.as_ref(),
                    arrow.is_async,
                    FnBody::of_arrow(&arrow.body),
                    hint.as_ref(),
                    ctx,
                )?;
                Ok(text)
            }
            Expression::Function(func) => {
                let hint = ctx.expected.as_ref().and_then(TypeDesc::signature).cloned();
                let (text, _) = self.lower_closure(
                    &func.params,
                    func.return_type.as_ref(),
                    func.is_async,
                    FnBody::Block(&func.body),
                    hint.as_ref(),
                    ctx,
                )?;
                Ok(text)
            }
            Expression::Await(await_expr) => {
                let value = self.lower_expr(&await_expr.argument, &ctx.for_child())?;
                match self.type_of(&await_expr.argument) {
                    TypeDesc::Queue(_) => Ok(format!("(<-{})", value)),
                    _ => Ok(value),
                }
            }
            Expression::Typeof(typeof_expr) => {
                let ty = self.type_of(&typeof_expr.argument);
                let name = desugar::go_quote(ty.unwrap_nilable().typeof_name());
                self.folded(&typeof_expr.argument, &TypeDesc::String, &name, ctx)
            }
            Expression::Void(void) => {
                self.fallback("void operator", void.span)?;
                let stmt = self.lower_expression_statement(&void.argument, &ctx.for_child())?;
                Ok(iife(&TypeDesc::Any, &format!("{}\nreturn nil", stmt)))
            }
            Expression::Delete(delete) => self.lower_delete(delete, ctx),
            Expression::Parenthesized(inner) => {
                let text = self.lower_expr(&inner.expression, ctx)?;
                Ok(desugar::paren(&text))
            }
            Expression::This(_) => Ok("this".to_string()),
            Expression::Super(span) => match self.super_type().class_name() {
                Some(parent) => Ok(format!("this.{}", parent)),
                None => Err(TranspileError::malformed("super outside a derived class", *span)),
            },
            Expression::InstanceOf(instance) => self.lower_instanceof(instance, ctx),
            Expression::In(in_expr) => Err(TranspileError::unsupported_operator("in", in_expr.span)),
            Expression::TypeCast(cast) => {
                let target = self.resolve_type(&cast.target_type)?;
                let from = self.type_of(&cast.object);
                let text = self.lower_expr(&cast.object, &ctx.expecting(Some(target.clone())))?;
                Ok(match (&from, &target) {
                    (TypeDesc::Interface(_), TypeDesc::Class { .. }) => {
                        format!("{}.({})", desugar::paren(&text), target.go_type())
                    }
                    _ => self.coerce(text, &from, &target),
                })
            }
            Expression::NonNull(inner) => {
                let text = self.lower_expr(&inner.expression, ctx)?;
                match self.type_of(&inner.expression) {
                    TypeDesc::Nilable(_) => Ok(format!("(*{})", text)),
                    _ => Ok(text),
                }
            }
        }
    }

    /// Lower an expression and coerce it to `target`
    pub(crate) fn lower_expr_as(&mut self, expr: &Expression, target: &TypeDesc, ctx: &LowerCtx) -> TranspileResult<String> {
        if self.is_null(expr) {
            return Ok(if target.is_nil_capable() {
                "nil".to_string()
            } else {
                target.zero_value()
            });
        }
        let text = self.lower_expr(expr, &ctx.expecting(Some(target.clone())))?;
        let from = match (expr.unwrapped(), target.unwrap_nilable()) {
            // Object literals take the aggregate type they were lowered to
            (Expression::Object(_), TypeDesc::Struct(name)) => TypeDesc::Struct(name.clone()),
            _ => self.type_of(expr),
        };
        Ok(self.coerce(text, &from, target))
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    fn lower_identifier(&mut self, id: &Identifier, ctx: &LowerCtx) -> String {
        let name = self.text(id.name);
        if let Some(resolver) = &ctx.resolver {
            if self.env.lookup(&name).is_some() {
                let payload = resolver.payload.clone();
                if name == resolver.resolve {
                    return format!(
                        "func(v {}) {{\n{}\n}}",
                        promise::payload_type(&payload).go_type(),
                        promise::resolve(&resolver.queue, "v")
                    );
                }
                if resolver.reject.as_deref() == Some(name.as_str()) {
                    return "func(e interface{}) {\npanic(e)\n}".to_string();
                }
            }
        }
        if self.env.lookup(&name).is_none() {
            match name.as_str() {
                "undefined" => return "nil".to_string(),
                "NaN" => {
                    self.require(Capability::Math);
                    return "math.NaN()".to_string();
                }
                "Infinity" => {
                    self.require(Capability::Math);
                    return "math.Inf(1)".to_string();
                }
                _ => {}
            }
        }
        self.go_ident(id.name)
    }

    fn lower_template(&mut self, literal: &TemplateLiteral, ctx: &LowerCtx) -> TranspileResult<String> {
        let mut pieces = Vec::new();
        for part in &literal.parts {
            match part {
                TemplatePart::String(text) => pieces.push(template::Piece::Literal(self.text(*text))),
                TemplatePart::Expression(expr) => {
                    let ty = self.type_of(expr);
                    let text = self.lower_expr(expr, &ctx.for_child())?;
                    pieces.push(template::Piece::Value { text, ty });
                }
            }
        }
        let (text, capabilities) = template::concat(&pieces);
        for capability in capabilities {
            self.require(capability);
        }
        Ok(text)
    }

    fn lower_regex_literal(&mut self, literal: &RegexLiteral) -> TranspileResult<String> {
        let pattern = self.text(literal.pattern);
        let flags = self.text(literal.flags);
        if let Some(complaint) = regex::validate(&pattern, &flags) {
            self.warn(
                format!("regular expression /{}/ is not valid RE2 syntax: {}", pattern, complaint),
                literal.span,
            );
        }
        self.require(Capability::Regexp);
        Ok(regex::compile_literal(&pattern, &flags))
    }

    // ========================================================================
    // Array and object literals
    // ========================================================================

    fn lower_array(&mut self, array: &ArrayExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let element = match ctx.expected.as_ref().map(TypeDesc::unwrap_nilable) {
            Some(TypeDesc::Slice(elem)) => (**elem).clone(),
            _ => match self.type_of(&Expression::Array(array.clone())) {
                TypeDesc::Slice(elem) => *elem,
                _ => TypeDesc::Any,
            },
        };
        let slice_type = TypeDesc::slice(element.clone()).go_type();

        let mut built: Option<String> = None;
        let mut pending: Vec<String> = Vec::new();
        for item in &array.elements {
            match item {
                ArrayElement::Expression(expr) => pending.push(self.lower_expr_as(expr, &element, &ctx.for_child())?),
                ArrayElement::Spread(expr) => {
                    let spread = self.lower_expr(expr, &ctx.for_child())?;
                    let spread = match self.type_of(expr) {
                        TypeDesc::String => {
                            self.require(Capability::Strings);
                            format!("strings.Split({}, \"\")", spread)
                        }
                        _ => spread,
                    };
                    let base = match built.take() {
                        None => format!("{}{{{}}}", slice_type, pending.join(", ")),
                        Some(text) if pending.is_empty() => text,
                        Some(text) => format!("append({}, {})", text, pending.join(", ")),
                    };
                    pending.clear();
                    built = Some(format!("append({}, {}...)", base, spread));
                }
            }
        }
        Ok(match built {
            None => format!("{}{{{}}}", slice_type, pending.join(", ")),
            Some(text) if pending.is_empty() => text,
            Some(text) => format!("append({}, {})", text, pending.join(", ")),
        })
    }

    fn property_key(&mut self, key: &PropertyKey, ctx: &LowerCtx) -> TranspileResult<String> {
        Ok(match key {
            PropertyKey::Identifier(id) => desugar::go_quote(self.interner.resolve(id.name)),
            PropertyKey::StringLiteral(lit) => desugar::go_quote(self.interner.resolve(lit.value)),
            PropertyKey::IntLiteral(lit) => desugar::go_quote(&lit.value.to_string()),
            PropertyKey::Computed(expr) => {
                let ty = self.type_of(expr);
                let text = self.lower_expr(expr, &ctx.for_child())?;
                self.stringified(&text, &ty)
            }
        })
    }

    fn lower_object(&mut self, object: &ObjectExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        if let Some(TypeDesc::Struct(name)) = ctx.expected.as_ref().map(TypeDesc::unwrap_nilable) {
            let name = name.clone();
            return self.lower_aggregate_literal(&name, object, ctx);
        }

        let has_spread = object.properties.iter().any(|p| matches!(p, ObjectProperty::Spread(_)));
        if !has_spread {
            let mut entries = Vec::new();
            for property in &object.properties {
                if let ObjectProperty::Property(property) = property {
                    let key = self.property_key(&property.key, ctx)?;
                    let value = self.lower_expr_as(&property.value, &TypeDesc::Any, &ctx.for_child())?;
                    entries.push(format!("{}: {}", key, value));
                }
            }
            return Ok(format!("map[string]interface{{}}{{{}}}", entries.join(", ")));
        }

        let out = self.fresh("m");
        let mut lines = vec![format!("{} := map[string]interface{{}}{{}}", out)];
        for property in &object.properties {
            match property {
                ObjectProperty::Property(property) => {
                    let key = self.property_key(&property.key, ctx)?;
                    let value = self.lower_expr_as(&property.value, &TypeDesc::Any, &ctx.for_child())?;
                    lines.push(format!("{}[{}] = {}", out, key, value));
                }
                ObjectProperty::Spread(spread) => {
                    let source = self.lower_expr(&spread.argument, &ctx.for_child())?;
                    let source = match self.type_of(&spread.argument) {
                        TypeDesc::Map => source,
                        TypeDesc::Any => format!("{}.(map[string]interface{{}})", desugar::paren(&source)),
                        _ => {
                            self.fallback("spread of a typed value into an object literal", spread.span)?;
                            continue;
                        }
                    };
                    let (key, value) = (self.fresh("k"), self.fresh("v"));
                    lines.push(braced(
                        &format!("for {k}, {v} := range {src}", k = key, v = value, src = source),
                        &format!("{}[{}] = {}", out, key, value),
                    ));
                }
            }
        }
        lines.push(format!("return {}", out));
        Ok(iife(&TypeDesc::Map, &lines.join("\n")))
    }

    /// `Point{x: 1, y: 2}` for an object literal typed as an aggregate
    fn lower_aggregate_literal(&mut self, name: &str, object: &ObjectExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let mut fields = Vec::new();
        for property in &object.properties {
            let property = match property {
                ObjectProperty::Property(property) => property,
                ObjectProperty::Spread(spread) => {
                    self.fallback("spread into a typed object literal", spread.span)?;
                    continue;
                }
            };
            let key = match &property.key {
                PropertyKey::Identifier(id) => self.text(id.name),
                PropertyKey::StringLiteral(lit) => self.text(lit.value),
                PropertyKey::IntLiteral(lit) => lit.value.to_string(),
                PropertyKey::Computed(_) => {
                    self.fallback("computed key in a typed object literal", property.span)?;
                    continue;
                }
            };
            let ty = self
                .env
                .find_interface_property(name, &key)
                .map(|p| p.ty.clone())
                .unwrap_or(TypeDesc::Any);
            let value = self.lower_expr_as(&property.value, &ty, &ctx.for_child())?;
            let field = self.env.go_name(&crate::transpiler::env::sanitize(&key));
            fields.push(format!("{}: {}", field, value));
        }
        Ok(format!("{}{{{}}}", name, fields.join(", ")))
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// Operand of an arithmetic operator as a float64 expression
    fn numeric(&mut self, expr: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        let ty = self.type_of(expr);
        let text = self.lower_expr(expr, &ctx.for_child())?;
        Ok(match ty {
            TypeDesc::Enum(_) => format!("float64({})", text),
            TypeDesc::Any => format!("{}.(float64)", desugar::paren(&text)),
            TypeDesc::Nilable(_) => format!("(*{})", text),
            _ => text,
        })
    }

    fn lower_unary(&mut self, unary: &UnaryExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        match unary.operator {
            UnaryOperator::Not => {
                let condition = self.condition(&unary.operand, ctx)?;
                Ok(format!("!{}", desugar::paren(&condition)))
            }
            UnaryOperator::Minus => {
                let text = self.numeric(&unary.operand, ctx)?;
                Ok(format!("-{}", desugar::paren(&text)))
            }
            UnaryOperator::Plus => {
                let ty = self.type_of(&unary.operand);
                let text = self.lower_expr(&unary.operand, &ctx.for_child())?;
                match builtins::global("Number", &[(text, ty)], &mut self.temps) {
                    Some(rewrite) => Ok(self.apply(rewrite)),
                    None => Ok(String::new()),
                }
            }
            UnaryOperator::BitwiseNot => {
                let text = self.numeric(&unary.operand, ctx)?;
                Ok(format!("float64(^int64({}))", text))
            }
            UnaryOperator::PrefixIncrement
            | UnaryOperator::PrefixDecrement
            | UnaryOperator::PostfixIncrement
            | UnaryOperator::PostfixDecrement => {
                let target = self.lower_expr(&unary.operand, &ctx.for_child())?;
                let op = match unary.operator {
                    UnaryOperator::PrefixIncrement | UnaryOperator::PostfixIncrement => "++",
                    _ => "--",
                };
                let prefix = matches!(
                    unary.operator,
                    UnaryOperator::PrefixIncrement | UnaryOperator::PrefixDecrement
                );
                let body = if prefix {
                    format!("{t}{op}\nreturn {t}", t = target, op = op)
                } else {
                    let old = self.fresh("u");
                    format!("{old} := {t}\n{t}{op}\nreturn {old}", old = old, t = target, op = op)
                };
                Ok(iife(&TypeDesc::Number, &body))
            }
        }
    }

    fn lower_binary(&mut self, binary: &BinaryExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        use BinaryOperator::*;
        match binary.operator {
            Add => {
                if self.type_of(&Expression::Binary(binary.clone())).is_string() {
                    let left = self.string_operand(&binary.left, ctx)?;
                    let right = self.string_operand(&binary.right, ctx)?;
                    return Ok(format!("{} + {}", left, right));
                }
                let left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                Ok(format!("{} + {}", left, desugar::paren(&right)))
            }
            Subtract | Multiply => {
                let left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                Ok(format!("{} {} {}", left, binary.operator.as_str(), desugar::paren(&right)))
            }
            Divide => {
                let mut left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                // Integer constants would divide as integers
                if left.parse::<i64>().is_ok() && right.parse::<i64>().is_ok() {
                    left.push_str(".0");
                }
                Ok(format!("{} / {}", left, desugar::paren(&right)))
            }
            Modulo | Exponent => {
                let left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                self.require(Capability::Math);
                let func = if binary.operator == Modulo { "Mod" } else { "Pow" };
                Ok(format!("math.{}({}, {})", func, left, right))
            }
            Equal | StrictEqual | NotEqual | StrictNotEqual => self.lower_equality(binary, ctx),
            LessThan | LessEqual | GreaterThan | GreaterEqual => {
                let left_ty = self.type_of(&binary.left);
                let right_ty = self.type_of(&binary.right);
                let (left, right) = if left_ty.is_string() && right_ty.is_string() {
                    (
                        self.lower_expr(&binary.left, &ctx.for_child())?,
                        self.lower_expr(&binary.right, &ctx.for_child())?,
                    )
                } else {
                    (self.numeric(&binary.left, ctx)?, self.numeric(&binary.right, ctx)?)
                };
                Ok(format!(
                    "{} {} {}",
                    desugar::paren(&left),
                    binary.operator.as_str(),
                    desugar::paren(&right)
                ))
            }
            BitwiseAnd | BitwiseOr | BitwiseXor => {
                let left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                Ok(format!(
                    "float64(int64({}) {} int64({}))",
                    left,
                    binary.operator.as_str(),
                    right
                ))
            }
            LeftShift | RightShift => {
                let left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                Ok(format!(
                    "float64(int64({}) {} uint64({}))",
                    left,
                    binary.operator.as_str(),
                    right
                ))
            }
            UnsignedRightShift => {
                let left = self.numeric(&binary.left, ctx)?;
                let right = self.numeric(&binary.right, ctx)?;
                Ok(format!("float64(uint32(int64({})) >> uint64({}))", left, right))
            }
        }
    }

    /// Constant `result` standing in for an expression over `operand`. The
    /// operand is still evaluated so its reads and side effects survive.
    fn folded(
        &mut self,
        operand: &Expression,
        result_ty: &TypeDesc,
        result: &str,
        ctx: &LowerCtx,
    ) -> TranspileResult<String> {
        if is_literal(operand) {
            return Ok(result.to_string());
        }
        let text = self.lower_expr(operand, &ctx.for_child())?;
        Ok(iife(result_ty, &format!("_ = {}\nreturn {}", text, result)))
    }

    /// Side of a string concatenation
    fn string_operand(&mut self, expr: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        let ty = self.type_of(expr);
        let text = self.lower_expr(expr, &ctx.for_child())?;
        let text = self.stringified(&text, &ty);
        Ok(desugar::paren(&text))
    }

    fn lower_equality(&mut self, binary: &BinaryExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let negated = matches!(binary.operator, BinaryOperator::NotEqual | BinaryOperator::StrictNotEqual);
        let op = if negated { "!=" } else { "==" };

        let nullish = match (self.is_null(&binary.left), self.is_null(&binary.right)) {
            (_, true) => Some(&binary.left),
            (true, false) => Some(&binary.right),
            _ => None,
        };
        if let Some(value) = nullish {
            let ty = self.type_of(value);
            if !ty.is_nil_capable() {
                // A value kind is never null
                return self.folded(value, &TypeDesc::Boolean, &negated.to_string(), ctx);
            }
            let text = self.lower_expr(value, &ctx.for_child())?;
            return Ok(format!("{} {} nil", desugar::paren(&text), op));
        }

        let left_ty = self.type_of(&binary.left);
        let right_ty = self.type_of(&binary.right);
        let (left, right) = match (&left_ty, &right_ty) {
            (TypeDesc::Any, TypeDesc::Any) => (
                self.lower_expr(&binary.left, &ctx.for_child())?,
                self.lower_expr(&binary.right, &ctx.for_child())?,
            ),
            (TypeDesc::Any, _) => (
                self.lower_expr(&binary.left, &ctx.for_child())?,
                self.lower_expr_as(&binary.right, &TypeDesc::Any, &ctx.for_child())?,
            ),
            (_, TypeDesc::Any) => (
                self.lower_expr_as(&binary.left, &TypeDesc::Any, &ctx.for_child())?,
                self.lower_expr(&binary.right, &ctx.for_child())?,
            ),
            (TypeDesc::Nilable(inner), other) if **inner == *other => (
                self.lower_expr_as(&binary.left, other, &ctx.for_child())?,
                self.lower_expr(&binary.right, &ctx.for_child())?,
            ),
            (other, TypeDesc::Nilable(inner)) if **inner == *other => (
                self.lower_expr(&binary.left, &ctx.for_child())?,
                self.lower_expr_as(&binary.right, other, &ctx.for_child())?,
            ),
            _ => (
                self.lower_expr(&binary.left, &ctx.for_child())?,
                self.lower_expr(&binary.right, &ctx.for_child())?,
            ),
        };
        Ok(format!("{} {} {}", desugar::paren(&left), op, desugar::paren(&right)))
    }

    /// `a && b` and `a || b` as Go booleans over truthiness
    pub(super) fn boolean_logical(&mut self, logical: &LogicalExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let op = match logical.operator {
            LogicalOperator::And => "&&",
            _ => "||",
        };
        let left = self.condition(&logical.left, ctx)?;
        let right = self.condition(&logical.right, ctx)?;
        let wrap = |text: String, inner: &Expression| match inner.unwrapped() {
            Expression::Logical(l) if l.operator != logical.operator => format!("({})", text),
            _ => text,
        };
        Ok(format!(
            "{} {} {}",
            wrap(left, &logical.left),
            op,
            wrap(right, &logical.right)
        ))
    }

    fn lower_logical(&mut self, expr: &Expression, logical: &LogicalExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let result = match &ctx.expected {
            Some(ty) if !ty.is_any() => ty.clone(),
            _ => self.type_of(expr),
        };
        if logical.operator == LogicalOperator::NullishCoalescing {
            let left_ty = self.type_of(&logical.left);
            let left = self.lower_expr(&logical.left, &ctx.for_child())?;
            if !left_ty.is_nil_capable() {
                return Ok(left);
            }
            let result = optional::coalesce_type(&left_ty, &self.type_of(&logical.right));
            let right = self.lower_expr_as(&logical.right, &result, &ctx.for_child())?;
            let temp = self.fresh("l");
            return Ok(optional::coalesce(&left, &left_ty, &temp, &right, &result));
        }
        if result.is_boolean() {
            return self.boolean_logical(logical, ctx);
        }

        // Value-selecting form: `a || b` yields `a` when truthy
        let temp = self.fresh("l");
        let left_ty = self.type_of(&logical.left);
        let left = self.lower_expr_as(&logical.left, &result, &ctx.for_child())?;
        let right = self.lower_expr_as(&logical.right, &result, &ctx.for_child())?;
        let test = desugar::truthy(&temp, if left_ty == result { &result } else { &left_ty });
        let test = match logical.operator {
            LogicalOperator::And => format!("!{}", desugar::paren(&test)),
            _ => test,
        };
        let body = format!(
            "{temp} := {left}\n{check}\nreturn {right}",
            temp = temp,
            left = left,
            check = braced(&format!("if {}", test), &format!("return {}", temp)),
            right = right,
        );
        Ok(iife(&result, &body))
    }

    fn lower_conditional(&mut self, expr: &Expression, cond: &ConditionalExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let result = match &ctx.expected {
            Some(ty) if !ty.is_any() && !matches!(ty, TypeDesc::Void) => ty.clone(),
            _ => self.type_of(expr),
        };
        let test = self.condition(&cond.test, ctx)?;
        let then = self.lower_expr_as(&cond.consequent, &result, &ctx.for_child())?;
        let otherwise = self.lower_expr_as(&cond.alternate, &result, &ctx.for_child())?;
        let body = format!(
            "{}\nreturn {}",
            braced(&format!("if {}", test), &format!("return {}", then)),
            otherwise
        );
        Ok(iife(&result, &body))
    }

    // ========================================================================
    // Member access
    // ========================================================================

    /// `a?.b.c`: the innermost optional link guards everything after it
    fn lower_optional_chain(&mut self, expr: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        let temp = self.fresh("o");
        let scratch = self.fresh("p");
        let ident = Identifier {
            name: self.interner.intern(&temp),
            span: *expr.span(),
        };
        let Some((rewritten, object)) = detach(expr, &ident) else {
            return Err(TranspileError::malformed("optional chain without an optional link", *expr.span()));
        };
        let object_ty = self.type_of(object);
        let object_text = self.lower_expr(object, &ctx.for_child())?;

        self.env.push_scope();
        self.env.declare(temp.clone(), object_ty.unwrap_nilable().clone());
        let inner_ty = self.type_of(&rewritten);
        let inner = if matches!(inner_ty, TypeDesc::Void) {
            self.lower_expression_statement(&rewritten, &ctx.for_child())
        } else {
            self.lower_expr(&rewritten, &ctx.for_child())
        };
        self.env.pop_scope();

        Ok(optional::guard(&object_text, &object_ty, &temp, &inner?, &inner_ty, &scratch))
    }

    fn lower_member(&mut self, member: &MemberExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let property = self.text(member.property.name);

        if let Some(receiver) = self.static_receiver(&member.object) {
            if let Some(text) = self.lower_static_member(&receiver, &property) {
                return Ok(text);
            }
        }

        let object_ty = self.type_of(&member.object);
        let object = match member.object.unwrapped() {
            Expression::Super(_) => self.lower_expr(&member.object, ctx)?,
            _ => {
                let text = self.lower_expr(&member.object, &ctx.for_child())?;
                desugar::paren(&text)
            }
        };
        let field = self.env.go_name(&crate::transpiler::env::sanitize(&property));
        Ok(match object_ty.unwrap_nilable() {
            TypeDesc::Slice(_) | TypeDesc::String if property == "length" => format!("float64(len({}))", object),
            TypeDesc::Any if property == "length" => format!("float64(len({}.([]interface{{}})))", object),
            TypeDesc::Any if property == "message" => {
                self.require(Capability::Fmt);
                format!("fmt.Sprint({})", object)
            }
            TypeDesc::Class { name, .. } if self.is_accessor(name, &property, false) => {
                format!("{}.{}()", object, field)
            }
            TypeDesc::Map => format!("{}[{}]", object, desugar::go_quote(&property)),
            TypeDesc::Any => format!(
                "{}.(map[string]interface{{}})[{}]",
                object,
                desugar::go_quote(&property)
            ),
            TypeDesc::Pattern if property == "source" => format!("{}.String()", object),
            _ => format!("{}.{}", object, field),
        })
    }

    /// Enum members, builtin constants and class statics
    fn lower_static_member(&mut self, receiver: &str, property: &str) -> Option<String> {
        if let Some(info) = self.env.enums.get(receiver) {
            if info.has_member(property) {
                return Some(info.member_const(property));
            }
        }
        match receiver {
            "Math" => {
                let text = builtins::math_constant(property)?;
                self.require(Capability::Math);
                return Some(text.to_string());
            }
            "Number" => {
                let rewrite = builtins::number_constant(property)?;
                return Some(self.apply(rewrite));
            }
            _ => {}
        }
        let info = self.env.classes.get(receiver)?;
        if info.static_field(property).is_some() || info.static_method(property).is_some() {
            return Some(static_name(receiver, property));
        }
        None
    }

    fn lower_index(&mut self, index: &IndexExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let object_ty = self.type_of(&index.object);
        let object = self.lower_expr(&index.object, &ctx.for_child())?;
        let object = desugar::paren(&object);
        let index_ty = self.type_of(&index.index);

        let key = |this: &mut Self| -> TranspileResult<String> {
            let text = this.lower_expr(&index.index, &ctx.for_child())?;
            Ok(this.stringified(&text, &index_ty))
        };
        let position = |this: &mut Self| -> TranspileResult<String> {
            let text = this.lower_expr_as(&index.index, &TypeDesc::Number, &ctx.for_child())?;
            Ok(desugar::int_index(&text))
        };

        Ok(match object_ty.unwrap_nilable() {
            TypeDesc::Slice(_) => format!("{}[{}]", object, position(self)?),
            TypeDesc::String => format!("string({}[{}])", object, position(self)?),
            TypeDesc::Map => format!("{}[{}]", object, key(self)?),
            TypeDesc::Any if index_ty.is_string() => {
                format!("{}.(map[string]interface{{}})[{}]", object, key(self)?)
            }
            TypeDesc::Any => format!("{}.([]interface{{}})[{}]", object, position(self)?),
            TypeDesc::Class { .. } | TypeDesc::Struct(_) => match index.index.unwrapped() {
                Expression::StringLiteral(lit) => {
                    let field = self.text(lit.value);
                    format!("{}.{}", object, self.env.go_name(&crate::transpiler::env::sanitize(&field)))
                }
                _ => format!("{}[{}]", object, key(self)?),
            },
            _ => format!("{}[{}]", object, position(self)?),
        })
    }

    // ========================================================================
    // Other operators
    // ========================================================================

    fn lower_instanceof(&mut self, instance: &InstanceOfExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let object = self.lower_expr(&instance.object, &ctx.for_child())?;
        let object_ty = self.type_of(&instance.object);
        let target = match &instance.type_name.ty {
            Type::Reference(reference) if self.interner.resolve(reference.name.name) == "Error" => "error".to_string(),
            _ => self.resolve_type(&instance.type_name)?.go_type(),
        };
        if object_ty.go_type() == target {
            return Ok(format!("{} != nil", desugar::paren(&object)));
        }
        let value = match object_ty {
            TypeDesc::Any | TypeDesc::Interface(_) => object,
            _ => format!("interface{{}}({})", object),
        };
        let ok = self.fresh("ok");
        Ok(iife(
            &TypeDesc::Boolean,
            &format!("_, {ok} := {v}.({t})\nreturn {ok}", ok = ok, v = desugar::paren(&value), t = target),
        ))
    }

    fn lower_delete(&mut self, delete: &DeleteExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let target = match delete.argument.unwrapped() {
            Expression::Member(member) if self.type_of(&member.object) == TypeDesc::Map => {
                let object = self.lower_expr(&member.object, &ctx.for_child())?;
                Some((object, desugar::go_quote(self.interner.resolve(member.property.name))))
            }
            Expression::Index(index) if self.type_of(&index.object) == TypeDesc::Map => {
                let object = self.lower_expr(&index.object, &ctx.for_child())?;
                let key = self.lower_expr(&index.index, &ctx.for_child())?;
                Some((object, key))
            }
            _ => None,
        };
        let body = match target {
            Some((object, key)) => format!("delete({}, {})\nreturn true", object, key),
            None => {
                self.fallback("delete operator", delete.span)?;
                let operand = self.lower_expr(&delete.argument, &ctx.for_child())?;
                format!("_ = {}\nreturn true", operand)
            }
        };
        Ok(iife(&TypeDesc::Boolean, &body))
    }
}

/// Package-level name of a static class member
pub(super) fn static_name(class: &str, member: &str) -> String {
    format!("{}_{}", class, crate::transpiler::env::sanitize(member))
}
