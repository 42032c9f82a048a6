//! Statements
//!
//! Every rule returns unindented lines joined by newlines; blocks are
//! delimited by `{` at the end of a header line and a lone `}`.

use super::Lowerer;
use crate::parser::ast::*;
use crate::parser::Span;
use crate::transpiler::capability::Capability;
use crate::transpiler::context::LowerCtx;
use crate::transpiler::desugar::{self, optional};
use crate::transpiler::error::{TranspileError, TranspileResult};
use crate::transpiler::hoist;
use crate::transpiler::infer::has_optional_link;
use crate::transpiler::types::TypeDesc;
use crate::transpiler::usage;
use tracing::debug;

/// Go builtins and conversions whose results may not be discarded
const VALUE_ONLY_CALLS: &[&str] = &[
    "append(", "len(", "cap(", "make(", "new(", "float64(", "int(", "int64(", "uint32(", "uint64(",
    "string(", "bool(", "[]",
];

/// True when `text` may stand alone as a Go expression statement
pub(super) fn is_statement_text(text: &str) -> bool {
    let text = text.trim();
    if text.starts_with("<-") {
        return true;
    }
    if !text.ends_with(')') || VALUE_ONLY_CALLS.iter().any(|prefix| text.starts_with(prefix)) {
        return false;
    }
    let Some(open) = opening_paren(text) else {
        return false;
    };
    let callee = &text[..open];
    if (callee.starts_with("func(") && callee.ends_with('}'))
        || (callee.starts_with("(func(") && callee.ends_with("})"))
    {
        return true;
    }
    // `x.(T)` is an assertion, not a call
    !callee.is_empty()
        && !callee.ends_with('.')
        && callee.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && desugar::is_atomic(callee)
}

/// Byte offset of the `(` matching the final `)`, skipping string literals
fn opening_paren(text: &str) -> Option<usize> {
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let last = text.len().checked_sub(1)?;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q != '`' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '`' | '\'' => quote = Some(c),
            '(' => stack.push(i),
            ')' => {
                let open = stack.pop()?;
                if i == last {
                    return Some(open);
                }
            }
            _ => {}
        }
    }
    None
}

/// `header {` body `}` without a blank line for empty bodies
pub(super) fn braced(header: &str, body: &str) -> String {
    if body.trim().is_empty() {
        format!("{} {{\n}}", header)
    } else {
        format!("{} {{\n{}\n}}", header, body)
    }
}

impl Lowerer {
    // ========================================================================
    // Statement lists and blocks
    // ========================================================================

    /// Lower a statement list in the current scope. Nested declarations are
    /// handled first: functions become closures at the top of the list so
    /// they may be called before their source position, other declarations
    /// move to package level.
    pub(crate) fn lower_statements(&mut self, statements: &[&Statement], ctx: &LowerCtx) -> TranspileResult<Vec<String>> {
        let mut lines = Vec::new();

        let nested: Vec<&Statement> = statements.iter().copied().filter(|s| s.is_hoistable()).collect();
        if !nested.is_empty() {
            let (functions, types): (Vec<&Statement>, Vec<&Statement>) = nested
                .iter()
                .copied()
                .partition(|s| matches!(hoist::declaration_of(s), Statement::FunctionDecl(_)));

            self.register_declarations(&types)?;
            for decl in &types {
                let text = self.lower_declaration(decl, &LowerCtx::hoisted())?;
                if !text.is_empty() {
                    self.hoisted.push(text);
                }
            }

            for decl in &functions {
                if let Statement::FunctionDecl(func) = hoist::declaration_of(decl) {
                    let sig = self.function_signature(
                        &func.params,
                        func.return_type.as_ref(),
                        func.is_async,
                        super::FnBody::Block(&func.body),
                        &[],
                        None,
                    )?;
                    let name = self.text(func.name.name);
                    self.env.declare(name, TypeDesc::function(sig));
                }
            }
            for decl in &functions {
                if let Statement::FunctionDecl(func) = hoist::declaration_of(decl) {
                    lines.push(self.lower_local_function(func, ctx)?);
                }
            }
        }

        for stmt in statements.iter().filter(|s| !s.is_hoistable()) {
            let text = self.lower_statement(stmt, ctx)?;
            if !text.is_empty() {
                lines.push(text);
            }
        }
        Ok(lines)
    }

    /// Package-level form of a hoisted declaration
    pub(crate) fn lower_declaration(&mut self, stmt: &Statement, ctx: &LowerCtx) -> TranspileResult<String> {
        match hoist::declaration_of(stmt) {
            Statement::FunctionDecl(func) => self.lower_function_decl(func, ctx),
            Statement::ClassDecl(class) => self.lower_class(class),
            Statement::InterfaceDecl(interface) => {
                let name = self.text(interface.name.name);
                Ok(self.lower_interface(&name))
            }
            Statement::TypeAliasDecl(alias) => match &alias.type_annotation.ty {
                Type::Object(_) => {
                    let name = self.text(alias.name.name);
                    Ok(self.lower_interface(&name))
                }
                // Other aliases are resolved at every use
                _ => Ok(String::new()),
            },
            Statement::EnumDecl(decl) => self.lower_enum(decl),
            _ => Ok(String::new()),
        }
    }

    /// Body of a block in a fresh lexical scope, with the context's block
    /// prefix and suffix injected
    pub(super) fn lower_block(&mut self, statements: &[Statement], ctx: &LowerCtx) -> TranspileResult<String> {
        self.env.push_scope();
        let refs: Vec<&Statement> = statements.iter().collect();
        let result = self.lower_statements(&refs, &ctx.for_child());
        self.env.pop_scope();

        let mut lines = ctx.block_prefix.clone();
        lines.extend(result?);
        lines.extend(ctx.block_suffix.iter().cloned());
        Ok(lines.join("\n"))
    }

    /// Body of a control-flow construct, which may be a bare statement
    pub(super) fn lower_body(&mut self, body: &Statement, ctx: &LowerCtx) -> TranspileResult<String> {
        match body {
            Statement::Block(block) => self.lower_block(&block.statements, ctx),
            other => self.lower_block(std::slice::from_ref(other), ctx),
        }
    }

    pub(super) fn lower_statement(&mut self, stmt: &Statement, ctx: &LowerCtx) -> TranspileResult<String> {
        match stmt {
            Statement::VariableDecl(decl) => self.lower_variable_decl(decl, ctx),
            Statement::Expression(stmt) => self.lower_expression_statement(&stmt.expression, ctx),
            Statement::If(stmt) => self.lower_if(stmt, ctx),
            Statement::Switch(stmt) => self.lower_switch(stmt, ctx),
            Statement::While(stmt) => self.lower_while(stmt, ctx),
            Statement::DoWhile(stmt) => self.lower_do_while(stmt, ctx),
            Statement::For(stmt) => self.lower_for(stmt, ctx),
            Statement::ForOf(stmt) => self.lower_for_of(stmt, ctx),
            Statement::Break(_) => Ok("break".to_string()),
            Statement::Continue(_) => Ok("continue".to_string()),
            Statement::Return(ret) => self.lower_return(ret, ctx),
            Statement::Throw(throw) => {
                let value = self.lower_expr(&throw.value, &ctx.for_child())?;
                Ok(format!("panic({})", value))
            }
            Statement::Try(stmt) => self.lower_try(stmt, ctx),
            Statement::Block(block) => {
                let body = self.lower_block(&block.statements, ctx)?;
                Ok(braced("", &body).trim_start().to_string())
            }
            Statement::Empty(_) => Ok(String::new()),
            Statement::ImportDecl(import) => {
                self.fallback("import bindings", import.span)?;
                Ok(String::new())
            }
            Statement::ExportDecl(export) if !export.declaration.is_hoistable() => {
                self.lower_statement(&export.declaration, ctx)
            }
            Statement::FunctionDecl(func) => self.lower_local_function(func, ctx),
            other => self.lower_declaration(other, ctx),
        }
    }

    // ========================================================================
    // Variables
    // ========================================================================

    pub(super) fn lower_variable_decl(&mut self, decl: &VariableDecl, ctx: &LowerCtx) -> TranspileResult<String> {
        if ctx.inline {
            return self.lower_inline_variables(decl, ctx);
        }
        let mut lines = Vec::new();
        for declarator in &decl.declarations {
            let text = self.lower_declarator(declarator, ctx)?;
            if !text.is_empty() {
                lines.push(text);
            }
        }
        Ok(lines.join("\n"))
    }

    /// Type a declarator gets: its annotation, else its initializer's type
    fn declarator_type(&mut self, declarator: &VariableDeclarator) -> TranspileResult<(TypeDesc, bool)> {
        if let Some(ty) = self.resolve_opt(declarator.type_annotation.as_ref())? {
            return Ok((ty, true));
        }
        let ty = match &declarator.initializer {
            Some(init) if self.is_null(init) => TypeDesc::Any,
            Some(init) => match self.type_of(init) {
                TypeDesc::Void => TypeDesc::Any,
                ty => ty,
            },
            None => TypeDesc::Any,
        };
        Ok((ty, false))
    }

    fn lower_declarator(&mut self, declarator: &VariableDeclarator, ctx: &LowerCtx) -> TranspileResult<String> {
        let raw = self.text(declarator.name.name);
        let name = self.go_ident(declarator.name.name);
        let (ty, annotated) = self.declarator_type(declarator)?;
        let go_type = match ty.go_type() {
            t if t.is_empty() => "interface{}".to_string(),
            t => t,
        };

        let self_referencing = declarator.initializer.as_ref().is_some_and(|init| {
            matches!(init.unwrapped(), Expression::Arrow(_) | Expression::Function(_))
                && usage::referenced_in_expr(init, &self.interner).contains(&raw)
        });
        if self_referencing {
            self.env.declare(raw.clone(), ty.clone());
        }

        let init = match &declarator.initializer {
            Some(init) => Some(self.lower_expr_as(init, &ty, ctx)?),
            None => None,
        };
        self.env.declare(raw.clone(), ty.clone());

        if self.env.depth() == 1 && self.lifted.contains(&raw) {
            debug!(variable = %name, "lift to package level");
            self.globals.push(format!("{} {}", name, go_type));
            return Ok(init.map(|text| format!("{} = {}", name, text)).unwrap_or_default());
        }

        let mut text = match init {
            None => format!("var {} {}", name, go_type),
            Some(init) if self_referencing => format!("var {} {}\n{} = {}", name, go_type, name, init),
            Some(init) if annotated || declares_with_var(&ty) => format!("var {} {} = {}", name, go_type, init),
            Some(init) => format!("{} := {}", name, init),
        };
        if !self.is_used(&raw) {
            text.push_str(&format!("\n_ = {}", name));
        }
        Ok(text)
    }

    /// `i, j := float64(0), float64(10)` for `for` initializers
    fn lower_inline_variables(&mut self, decl: &VariableDecl, ctx: &LowerCtx) -> TranspileResult<String> {
        let mut names = Vec::new();
        let mut values = Vec::new();
        for declarator in &decl.declarations {
            let (ty, _) = self.declarator_type(declarator)?;
            let value = match &declarator.initializer {
                Some(init) => self.lower_expr_as(init, &ty, &ctx.for_child())?,
                None => ty.zero_value(),
            };
            let value = if ty.is_number() && value.parse::<i64>().is_ok() {
                format!("float64({})", value)
            } else {
                value
            };
            let raw = self.text(declarator.name.name);
            names.push(self.go_ident(declarator.name.name));
            values.push(value);
            self.env.declare(raw, ty);
        }
        Ok(format!("{} := {}", names.join(", "), values.join(", ")))
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    /// Go boolean for a source condition
    pub(super) fn condition(&mut self, expr: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        let text = self.lower_expr(expr, &ctx.expecting(Some(TypeDesc::Boolean)))?;
        let ty = self.type_of(expr);
        Ok(desugar::truthy(&text, &ty))
    }

    fn lower_if(&mut self, stmt: &IfStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let condition = self.condition(&stmt.condition, ctx)?;
        let then = self.lower_body(&stmt.then_branch, ctx)?;
        let mut text = braced(&format!("if {}", condition), &then);
        match stmt.else_branch.as_deref() {
            None => {}
            Some(Statement::If(inner)) => {
                text.push_str(" else ");
                text.push_str(&self.lower_if(inner, ctx)?);
            }
            Some(other) => {
                let body = self.lower_body(other, ctx)?;
                text.push_str(&braced(" else", &body));
            }
        }
        Ok(text)
    }

    fn lower_switch(&mut self, stmt: &SwitchStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let discriminant = self.lower_expr(&stmt.discriminant, &ctx.for_child())?;
        let discriminant_ty = self.type_of(&stmt.discriminant);
        let mut lines = vec![format!("switch {} {{", discriminant)];
        let last = stmt.cases.len().saturating_sub(1);

        for (i, case) in stmt.cases.iter().enumerate() {
            match &case.test {
                Some(test) => {
                    let label = self.lower_expr_as(test, &discriminant_ty, &ctx.for_child())?;
                    lines.push(format!("case {}:", label));
                }
                None => lines.push("default:".to_string()),
            }

            let mut body: Vec<&Statement> = match case.consequent.as_slice() {
                [Statement::Block(block)] => block.statements.iter().collect(),
                statements => statements.iter().collect(),
            };
            body.retain(|s| !matches!(s, Statement::Empty(_)));
            let terminated = match body.last() {
                Some(Statement::Break(_)) => {
                    body.pop();
                    true
                }
                Some(last) => last.is_terminator(),
                None => false,
            };

            self.env.push_scope();
            let lowered = self.lower_statements(&body, &ctx.for_child());
            self.env.pop_scope();
            lines.extend(lowered?);
            if !terminated && i != last {
                lines.push("fallthrough".to_string());
            }
        }
        lines.push("}".to_string());
        Ok(lines.join("\n"))
    }

    fn lower_while(&mut self, stmt: &WhileStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let body = self.lower_body(&stmt.body, ctx)?;
        let header = match stmt.condition.unwrapped() {
            Expression::BooleanLiteral(lit) if lit.value => "for".to_string(),
            condition => format!("for {}", self.condition(condition, ctx)?),
        };
        Ok(braced(&header, &body))
    }

    /// The body runs once before the condition is first tested
    fn lower_do_while(&mut self, stmt: &DoWhileStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let flag = self.fresh("do");
        let body = self.lower_body(&stmt.body, ctx)?;
        let condition = self.condition(&stmt.condition, ctx)?;
        Ok(braced(
            &format!("for {flag} := true; {flag}; {flag} = {cond}", flag = flag, cond = condition),
            &body,
        ))
    }

    fn lower_for(&mut self, stmt: &ForStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let Some(test) = &stmt.test else {
            return Err(TranspileError::malformed("for statement without a condition", stmt.span));
        };
        self.env.push_scope();
        let result = self.lower_for_scoped(stmt, test, ctx);
        self.env.pop_scope();
        result
    }

    fn lower_for_scoped(&mut self, stmt: &ForStatement, test: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        let init = match &stmt.init {
            Some(ForInit::VariableDecl(decl)) => self.lower_variable_decl(decl, &ctx.inline())?,
            Some(ForInit::Expression(expr)) => self.lower_expression_statement(expr, &ctx.inline())?,
            None => String::new(),
        };
        let test = self.condition(test, ctx)?;
        let update = match &stmt.update {
            Some(update) => self.lower_expression_statement(update, &ctx.inline())?,
            None => String::new(),
        };
        let body = self.lower_body(&stmt.body, ctx)?;
        Ok(braced(&format!("for {}; {}; {}", init, test, update), &body))
    }

    fn lower_for_of(&mut self, stmt: &ForOfStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let iterable = self.lower_expr(&stmt.right, &ctx.for_child())?;
        let iterable_ty = self.type_of(&stmt.right);
        let raw = self.text(stmt.binding.name);
        let name = self.go_ident(stmt.binding.name);
        let used = usage::referenced_in(std::iter::once(&*stmt.body), &self.interner).contains(&raw);

        let (element, source, prefix) = match iterable_ty.unwrap_nilable() {
            TypeDesc::String => {
                let rune = self.fresh("r");
                let prefix = if used {
                    vec![format!("{} := string({})", name, rune)]
                } else {
                    Vec::new()
                };
                (TypeDesc::String, iterable, (rune, prefix))
            }
            TypeDesc::Slice(elem) => ((**elem).clone(), iterable, (name.clone(), Vec::new())),
            _ => (
                TypeDesc::Any,
                format!("{}.([]interface{{}})", desugar::paren(&iterable)),
                (name.clone(), Vec::new()),
            ),
        };
        let (binding, prefix) = prefix;

        self.env.push_scope();
        self.env.declare(raw, element);
        let body = self.lower_body(&stmt.body, &ctx.for_child().with_block_prefix(prefix));
        self.env.pop_scope();

        let header = if used {
            format!("for _, {} := range {}", binding, source)
        } else {
            format!("for range {}", source)
        };
        Ok(braced(&header, &body?))
    }

    fn lower_return(&mut self, ret: &ReturnStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        if ctx.function.constructor {
            return Ok("return this".to_string());
        }
        let Some(value) = &ret.value else {
            return Ok("return".to_string());
        };
        match ctx.function.return_type.clone() {
            None | Some(TypeDesc::Void) => {
                let stmt = self.lower_expression_statement(value, ctx)?;
                Ok(format!("{}\nreturn", stmt))
            }
            Some(ty) => {
                let text = self.lower_expr_as(value, &ty, &ctx.for_child())?;
                Ok(format!("return {}", text))
            }
        }
    }

    /// `try` becomes an immediately-invoked closure. A deferred `recover`
    /// runs the catch body; `finally` is deferred first so it runs last.
    fn lower_try(&mut self, stmt: &TryStatement, ctx: &LowerCtx) -> TranspileResult<String> {
        let mut lines = vec!["func() {".to_string()];
        if let Some(finally) = &stmt.finally_clause {
            let body = self.lower_block(&finally.statements, ctx)?;
            lines.push(braced("defer func()", &body));
            lines.push("()".to_string());
        }
        if let Some(catch) = &stmt.catch_clause {
            let recovered = self.fresh("rec");
            self.env.push_scope();
            let mut prefix = Vec::new();
            if let Some(param) = &catch.param {
                let raw = self.text(param.name);
                let name = self.go_ident(param.name);
                self.env.declare(raw.clone(), TypeDesc::Any);
                prefix.push(format!("{} := {}", name, recovered));
                let used = usage::referenced_in(&catch.body.statements, &self.interner).contains(&raw);
                if !used {
                    prefix.push(format!("_ = {}", name));
                }
            }
            let body = self.lower_block(&catch.body.statements, &ctx.for_child().with_block_prefix(prefix));
            self.env.pop_scope();
            let handler = braced(&format!("if {r} := recover(); {r} != nil", r = recovered), &body?);
            lines.push(format!("defer func() {{\n{}\n}}", handler));
            lines.push("()".to_string());
        }
        lines.push(self.lower_block(&stmt.body.statements, ctx)?);
        lines.push("}()".to_string());
        Ok(join_deferred(lines))
    }

    // ========================================================================
    // Expression statements
    // ========================================================================

    pub(crate) fn lower_expression_statement(&mut self, expr: &Expression, ctx: &LowerCtx) -> TranspileResult<String> {
        match expr {
            Expression::Parenthesized(inner) => self.lower_expression_statement(&inner.expression, ctx),
            Expression::Assignment(assign) => self.lower_assignment(assign, ctx),
            Expression::Unary(unary) if unary.operator.is_update() => {
                let target = self.lower_expr(&unary.operand, &ctx.for_child())?;
                let op = match unary.operator {
                    UnaryOperator::PrefixIncrement | UnaryOperator::PostfixIncrement => "++",
                    _ => "--",
                };
                Ok(format!("{}{}", target, op))
            }
            Expression::Call(call) if !has_optional_link(expr) => self.lower_call(call, ctx, true),
            Expression::Logical(logical) => self.lower_logical_statement(logical, ctx),
            Expression::Conditional(cond) => {
                let test = self.condition(&cond.test, ctx)?;
                let then = self.lower_expression_statement(&cond.consequent, &ctx.for_child())?;
                let otherwise = self.lower_expression_statement(&cond.alternate, &ctx.for_child())?;
                Ok(format!(
                    "{}{}",
                    braced(&format!("if {}", test), &then),
                    braced(" else", &otherwise)
                ))
            }
            Expression::Await(await_expr) => {
                let value = self.lower_expr(&await_expr.argument, &ctx.for_child())?;
                match self.type_of(&await_expr.argument) {
                    TypeDesc::Queue(_) => Ok(format!("<-{}", value)),
                    _ => Ok(self.discard(value)),
                }
            }
            other => {
                let text = self.lower_expr(other, &ctx.for_child())?;
                Ok(self.discard(text))
            }
        }
    }

    /// Statement form of a value: calls stand alone, anything else is
    /// assigned to the blank identifier
    pub(super) fn discard(&self, text: String) -> String {
        if text.is_empty() || is_statement_text(&text) {
            text
        } else {
            format!("_ = {}", text)
        }
    }

    fn lower_logical_statement(&mut self, logical: &LogicalExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let then = self.lower_expression_statement(&logical.right, &ctx.for_child())?;
        let condition = match logical.operator {
            LogicalOperator::And => self.condition(&logical.left, ctx)?,
            LogicalOperator::Or => {
                let test = self.condition(&logical.left, ctx)?;
                format!("!{}", desugar::paren(&test))
            }
            LogicalOperator::NullishCoalescing => {
                let left = self.lower_expr(&logical.left, &ctx.for_child())?;
                let left_ty = self.type_of(&logical.left);
                if left_ty.is_nil_capable() {
                    format!("{} == nil", desugar::paren(&left))
                } else {
                    return Ok(self.discard(left));
                }
            }
        };
        Ok(braced(&format!("if {}", condition), &then))
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    pub(super) fn lower_assignment(&mut self, assign: &AssignmentExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let operator = assign.operator;
        if matches!(
            operator,
            AssignmentOperator::NullishAssign
                | AssignmentOperator::LogicalAndAssign
                | AssignmentOperator::LogicalOrAssign
                | AssignmentOperator::UnsignedRightShiftAssign
        ) {
            return Err(TranspileError::unsupported_operator(operator.as_str(), assign.span));
        }

        if let Some(text) = self.lower_setter(assign, ctx)? {
            return Ok(text);
        }

        let target_ty = self.type_of(&assign.left);
        let target = self.lower_expr(&assign.left, &ctx.for_child())?;
        let Some(binary) = operator.binary() else {
            let value = self.lower_expr_as(&assign.right, &target_ty, &ctx.for_child())?;
            return Ok(format!("{} = {}", target, value));
        };
        self.compound_assignment(&target, &target_ty, binary, &assign.right, assign.span, ctx)
    }

    fn compound_assignment(
        &mut self,
        target: &str,
        target_ty: &TypeDesc,
        binary: BinaryOperator,
        right: &Expression,
        span: Span,
        ctx: &LowerCtx,
    ) -> TranspileResult<String> {
        if binary == BinaryOperator::Add && target_ty.is_string() {
            let value = self.lower_expr(right, &ctx.for_child())?;
            let value_ty = self.type_of(right);
            let value = self.stringified(&value, &value_ty);
            return Ok(format!("{} += {}", target, value));
        }
        let value = self.lower_expr_as(right, &TypeDesc::Number, &ctx.for_child())?;
        Ok(match binary {
            BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Multiply | BinaryOperator::Divide => {
                format!("{} {}= {}", target, binary.as_str(), value)
            }
            BinaryOperator::Modulo => {
                self.require(Capability::Math);
                format!("{t} = math.Mod({t}, {v})", t = target, v = value)
            }
            BinaryOperator::Exponent => {
                self.require(Capability::Math);
                format!("{t} = math.Pow({t}, {v})", t = target, v = value)
            }
            BinaryOperator::LeftShift | BinaryOperator::RightShift => format!(
                "{t} = float64(int64({t}) {op} uint64({v}))",
                t = target,
                op = binary.as_str(),
                v = value
            ),
            BinaryOperator::BitwiseAnd | BinaryOperator::BitwiseOr | BinaryOperator::BitwiseXor => format!(
                "{t} = float64(int64({t}) {op} int64({v}))",
                t = target,
                op = binary.as_str(),
                v = value
            ),
            other => return Err(TranspileError::unsupported_operator(format!("{}=", other.as_str()), span)),
        })
    }

    /// `obj.prop = v` where `prop` has a setter on the receiver's class
    fn lower_setter(&mut self, assign: &AssignmentExpression, ctx: &LowerCtx) -> TranspileResult<Option<String>> {
        let Expression::Member(member) = assign.left.unwrapped() else {
            return Ok(None);
        };
        if member.optional {
            return Ok(None);
        }
        let property = self.text(member.property.name);
        let object_ty = self.type_of(&member.object);
        let Some(class) = object_ty.unwrap_nilable().class_name().map(str::to_string) else {
            return Ok(None);
        };
        if !self.is_accessor(&class, &property, true) {
            return Ok(None);
        }
        let object = self.lower_expr(&member.object, &ctx.for_child())?;
        let setter = setter_name(&property);
        let value_ty = self.setter_type(&class, &property);
        let value = match assign.operator.binary() {
            None => self.lower_expr_as(&assign.right, &value_ty, &ctx.for_child())?,
            Some(binary) => {
                let current = format!("{}.{}()", object, property);
                let right = self.lower_expr_as(&assign.right, &value_ty, &ctx.for_child())?;
                format!("{} {} {}", current, binary.as_str(), desugar::paren(&right))
            }
        };
        Ok(Some(format!("{}.{}({})", object, setter, value)))
    }

    /// Parameter type of the setter for `property`, searching ancestors
    fn setter_type(&self, class: &str, property: &str) -> TypeDesc {
        let mut current = self.env.classes.get(class);
        while let Some(info) = current {
            if let Some(method) = info
                .methods
                .iter()
                .find(|m| m.name == property && m.sig.params.len() == 1)
            {
                return method.sig.param_type(0);
            }
            current = info.parent.as_ref().and_then(|p| self.env.classes.get(p));
        }
        TypeDesc::Any
    }

    /// Coerce a lowered value from one static type to another
    pub(super) fn coerce(&mut self, text: String, from: &TypeDesc, to: &TypeDesc) -> String {
        if from == to || text == "nil" {
            return text;
        }
        match (from, to) {
            (TypeDesc::Nilable(inner), to) if **inner == *to => {
                let temp = self.fresh("p");
                optional::deref_or_zero(&text, inner, &temp)
            }
            (from, TypeDesc::Nilable(inner)) if from == &**inner => {
                let temp = self.fresh("v");
                optional::address_of(&text, inner, &temp)
            }
            (TypeDesc::Number, TypeDesc::Any) if text.parse::<i64>().is_ok() => format!("float64({})", text),
            (TypeDesc::Any, to) if is_assertable(to) => format!("{}.({})", desugar::paren(&text), to.go_type()),
            _ => text,
        }
    }
}

/// Types a Go interface value can be asserted to
fn is_assertable(ty: &TypeDesc) -> bool {
    !matches!(ty, TypeDesc::Any | TypeDesc::Void | TypeDesc::TypeParam(_))
}

/// Kinds declared with `var x T = v` so the Go type is explicit
fn declares_with_var(ty: &TypeDesc) -> bool {
    matches!(
        ty,
        TypeDesc::Number | TypeDesc::Any | TypeDesc::Nilable(_) | TypeDesc::Enum(_) | TypeDesc::Interface(_)
    )
}

/// Go method name of a property setter
pub(super) fn setter_name(property: &str) -> String {
    format!("set{}", crate::transpiler::env::capitalize(property))
}

/// Glue `defer func() {...}` with its trailing `()` call
fn join_deferred(lines: Vec<String>) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in lines {
        if line == "()" {
            if let Some(last) = out.last_mut() {
                last.push_str("()");
                continue;
            }
        }
        out.push(line);
    }
    out.join("\n")
}
