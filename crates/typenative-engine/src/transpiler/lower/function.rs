//! Functions, closures and their signatures
//!
//! Defaulted trailing parameters collapse into an `args ...interface{}`
//! tail with a per-parameter prologue. A body that is exactly
//! `return new Promise(executor)` becomes a goroutine settling a buffered
//! channel; any other async body runs synchronously.

use super::Lowerer;
use crate::parser::ast::*;
use crate::transpiler::context::{FunctionFrame, LowerCtx, Resolver};
use crate::transpiler::desugar::promise;
use crate::transpiler::env::generic_list;
use crate::transpiler::error::TranspileResult;
use crate::transpiler::types::{FuncSig, TypeDesc};
use crate::transpiler::usage;
use tracing::debug;

/// Body of a function-like node
#[derive(Debug, Clone, Copy)]
pub(crate) enum FnBody<'a> {
    Block(&'a BlockStatement),
    Expression(&'a Expression),
    /// Abstract methods and signatures only
    None,
}

impl<'a> FnBody<'a> {
    pub(crate) fn of_arrow(body: &'a ArrowBody) -> Self {
        match body {
            ArrowBody::Block(block) => FnBody::Block(block),
            ArrowBody::Expression(expr) => FnBody::Expression(expr),
        }
    }
}

/// `new Promise(executor)` when it is the only statement of a body
pub(crate) fn promise_executor<'a>(body: &FnBody<'a>, interner: &crate::parser::Interner) -> Option<&'a NewExpression> {
    let expr = match *body {
        FnBody::Block(block) => {
            let mut statements = block.statements.iter().filter(|s| !matches!(s, Statement::Empty(_)));
            match (statements.next(), statements.next()) {
                (Some(Statement::Return(ret)), None) => ret.value.as_ref()?,
                _ => return None,
            }
        }
        FnBody::Expression(expr) => expr,
        FnBody::None => return None,
    };
    match expr.unwrapped() {
        Expression::New(new) => match new.callee.unwrapped() {
            Expression::Identifier(id) if interner.resolve(id.name) == "Promise" => Some(new),
            _ => None,
        },
        _ => None,
    }
}

/// The executor callback of a `new Promise(...)` node
fn executor_of(new: &NewExpression) -> Option<(&[Parameter], FnBody<'_>)> {
    match new.arguments.first().map(Argument::expression).map(Expression::unwrapped) {
        Some(Expression::Arrow(arrow)) => Some((arrow.params.as_slice(), FnBody::of_arrow(&arrow.body))),
        Some(Expression::Function(func)) => Some((func.params.as_slice(), FnBody::Block(&func.body))),
        _ => None,
    }
}

impl Lowerer {
    // ========================================================================
    // Signatures
    // ========================================================================

    /// Signature of a function-like node. `hint` is the signature the
    /// surrounding call expects, used for unannotated callback parameters.
    pub(crate) fn function_signature(
        &mut self,
        params: &[Parameter],
        return_type: Option<&TypeAnnotation>,
        is_async: bool,
        body: FnBody<'_>,
        type_params: &[TypeParameter],
        hint: Option<&FuncSig>,
    ) -> TranspileResult<FuncSig> {
        let names: Vec<String> = type_params.iter().map(|p| self.text(p.name.name)).collect();
        if !names.is_empty() {
            self.env.push_type_params(names.clone());
        }
        let sig = self.signature_in_scope(params, return_type, is_async, body, hint);
        if !names.is_empty() {
            self.env.pop_type_params();
        }
        let mut sig = sig?;
        sig.type_params = names;
        Ok(sig)
    }

    fn signature_in_scope(
        &mut self,
        params: &[Parameter],
        return_type: Option<&TypeAnnotation>,
        is_async: bool,
        body: FnBody<'_>,
        hint: Option<&FuncSig>,
    ) -> TranspileResult<FuncSig> {
        let mut types = Vec::new();
        let mut rest = None;
        for (i, param) in params.iter().enumerate() {
            let declared = self.resolve_opt(param.type_annotation.as_ref())?;
            if param.is_rest {
                rest = Some(match declared {
                    Some(TypeDesc::Slice(elem)) => *elem,
                    _ => TypeDesc::Any,
                });
                continue;
            }
            let ty = match declared {
                Some(ty) => ty,
                None => match (&param.default_value, hint) {
                    (Some(default), _) => self.type_of(default),
                    (None, Some(hint)) => hint.param_type(i),
                    (None, None) => TypeDesc::Any,
                },
            };
            let ty = if param.optional && param.default_value.is_none() {
                TypeDesc::nilable(ty)
            } else {
                ty
            };
            types.push(ty);
        }

        let required = collapsible_tail(params).unwrap_or(types.len());

        let declared_ret = self.resolve_opt(return_type)?;
        let executor = promise_executor(&body, &self.interner);
        let ret = match declared_ret {
            Some(TypeDesc::Queue(payload)) if executor.is_none() && is_async => *payload,
            Some(TypeDesc::Queue(payload)) => TypeDesc::Queue(payload),
            Some(ty) => ty,
            None => {
                let bound: Vec<(String, TypeDesc)> = params
                    .iter()
                    .filter(|p| !p.is_rest)
                    .zip(types.iter())
                    .map(|(p, ty)| (self.text(p.name.name), ty.clone()))
                    .collect();
                match executor {
                    Some(new) => TypeDesc::queue(self.promise_payload(new, None)),
                    None => match hint.map(|h| &h.ret) {
                        Some(ret) if !ret.is_any() => ret.clone(),
                        _ => {
                            let inferred = self.infer_return(&bound, body);
                            match inferred {
                                TypeDesc::Queue(payload) if is_async => *payload,
                                other => other,
                            }
                        }
                    },
                }
            }
        };

        Ok(FuncSig {
            params: types,
            required,
            rest,
            ret,
            type_params: Vec::new(),
        })
    }

    /// Payload type of a `new Promise(...)`: explicit type argument, then
    /// the expected promise type, then `interface{}`
    pub(crate) fn promise_payload(&self, new: &NewExpression, expected: Option<&TypeDesc>) -> TypeDesc {
        if let Some(arg) = new.type_args.as_ref().and_then(|args| args.first()) {
            if let Ok(ty) = self.resolve_type(arg) {
                return promise::payload_type(&ty);
            }
        }
        match expected {
            Some(TypeDesc::Queue(payload)) => promise::payload_type(payload),
            Some(ty) if !ty.is_any() => promise::payload_type(ty),
            _ => TypeDesc::Any,
        }
    }

    // ========================================================================
    // Declarations and closures
    // ========================================================================

    /// Package-level `func name[T any](...) R { ... }`
    pub(super) fn lower_function_decl(&mut self, func: &FunctionDecl, ctx: &LowerCtx) -> TranspileResult<String> {
        let name = self.go_ident(func.name.name);
        let raw = self.text(func.name.name);
        let sig = match self.env.functions.get(&raw) {
            Some(sig) => sig.clone(),
            None => self.function_signature(
                &func.params,
                func.return_type.as_ref(),
                func.is_async,
                FnBody::Block(&func.body),
                func.type_params.as_deref().unwrap_or(&[]),
                None,
            )?,
        };
        debug!(function = %name, "lower function");

        let type_params = func.type_params.as_deref().unwrap_or(&[]);
        let mut constraints = Vec::new();
        for param in type_params {
            constraints.push(self.constraint_of(param)?);
        }
        let generics = generic_list(&sig.type_params, &constraints);

        self.env.push_type_params(sig.type_params.clone());
        let frame = FunctionFrame {
            return_type: Some(sig.ret.clone()),
            class: ctx.function.class.clone(),
            ..Default::default()
        };
        let result = self.lower_callable(&func.params, &sig, FnBody::Block(&func.body), frame, ctx);
        self.env.pop_type_params();
        let (param_list, body) = result?;

        Ok(format!(
            "func {}{}{} {{\n{}\n}}",
            name,
            generics,
            signature_text(&sig, &param_list),
            body
        ))
    }

    /// Closure literal for an arrow function or function expression
    pub(super) fn lower_closure(
        &mut self,
        params: &[Parameter],
        return_type: Option<&TypeAnnotation>,
        is_async: bool,
        body: FnBody<'_>,
        hint: Option<&FuncSig>,
        ctx: &LowerCtx,
    ) -> TranspileResult<(String, FuncSig)> {
        let sig = self.function_signature(params, return_type, is_async, body, &[], hint)?;
        let frame = FunctionFrame {
            return_type: Some(sig.ret.clone()),
            class: ctx.function.class.clone(),
            ..Default::default()
        };
        let (param_list, body_text) = self.lower_callable(params, &sig, body, frame, ctx)?;
        Ok((
            format!("func{} {{\n{}\n}}", signature_text(&sig, &param_list), body_text),
            sig,
        ))
    }

    /// Nested named function: `var f func(...) R` then `f = func...`, so
    /// the body may call itself
    pub(super) fn lower_local_function(&mut self, func: &FunctionDecl, ctx: &LowerCtx) -> TranspileResult<String> {
        let name = self.go_ident(func.name.name);
        let raw = self.text(func.name.name);
        let sig = match self.env.lookup(&raw).and_then(TypeDesc::signature) {
            Some(sig) => sig.clone(),
            None => {
                let sig = self.function_signature(
                    &func.params,
                    func.return_type.as_ref(),
                    func.is_async,
                    FnBody::Block(&func.body),
                    &[],
                    None,
                )?;
                self.env.declare(raw.clone(), TypeDesc::function(sig.clone()));
                sig
            }
        };
        let frame = FunctionFrame {
            return_type: Some(sig.ret.clone()),
            class: ctx.function.class.clone(),
            ..Default::default()
        };
        let (param_list, body) = self.lower_callable(&func.params, &sig, FnBody::Block(&func.body), frame, ctx)?;

        let mut lines = vec![
            format!("var {} {}", name, TypeDesc::function(sig.clone()).go_type()),
            format!("{} = func{} {{\n{}\n}}", name, signature_text(&sig, &param_list), body),
        ];
        if !self.is_used(&raw) {
            lines.push(format!("_ = {}", name));
        }
        Ok(lines.join("\n"))
    }

    /// Parameter names and body lines of any function-like node
    pub(super) fn lower_callable(
        &mut self,
        params: &[Parameter],
        sig: &FuncSig,
        body: FnBody<'_>,
        mut frame: FunctionFrame,
        ctx: &LowerCtx,
    ) -> TranspileResult<(Vec<String>, String)> {
        self.env.push_scope();
        let mut used = match body {
            FnBody::Block(block) => usage::referenced_in(&block.statements, &self.interner),
            FnBody::Expression(expr) => usage::referenced_in_expr(expr, &self.interner),
            FnBody::None => Default::default(),
        };
        for param in params {
            if let Some(default) = &param.default_value {
                used.extend(usage::referenced_in_expr(default, &self.interner));
            }
        }
        self.used.push(used);

        let result = self.lower_callable_scoped(params, sig, body, &mut frame, ctx);

        self.used.pop();
        self.env.pop_scope();
        result
    }

    fn lower_callable_scoped(
        &mut self,
        params: &[Parameter],
        sig: &FuncSig,
        body: FnBody<'_>,
        frame: &mut FunctionFrame,
        ctx: &LowerCtx,
    ) -> TranspileResult<(Vec<String>, String)> {
        let mut names = Vec::new();
        let mut prologue = Vec::new();
        let mut index = 0;
        for param in params {
            let raw = self.text(param.name.name);
            let name = self.go_ident(param.name.name);
            if param.is_rest {
                let elem = sig.rest.clone().unwrap_or(TypeDesc::Any);
                self.env.declare(raw, TypeDesc::slice(elem));
                names.push(name);
                continue;
            }
            let ty = sig.param_type(index);
            if sig.has_default_tail() && index >= sig.required {
                let slot = index - sig.required;
                let initial = match &param.default_value {
                    Some(default) => self.lower_expr_as(default, &ty, &ctx.for_child())?,
                    None => ty.zero_value(),
                };
                prologue.push(format!("var {} {} = {}", name, ty.go_type(), initial));
                prologue.push(format!(
                    "if len(args) > {slot} {{\n{name} = args[{slot}].({ty})\n}}",
                    slot = slot,
                    name = name,
                    ty = ty.go_type()
                ));
                if !self.is_used(&raw) {
                    prologue.push(format!("_ = {}", name));
                }
            } else {
                names.push(name);
            }
            self.env.declare(raw, ty);
            index += 1;
        }

        let executor = promise_executor(&body, &self.interner);
        let mut lines = prologue;
        match (executor, &sig.ret) {
            (Some(new), TypeDesc::Queue(payload)) => {
                frame.promise_payload = Some((**payload).clone());
                let child = ctx.for_function(frame.clone());
                lines.push(self.lower_promise_task(new, payload, true, &child)?);
            }
            _ => {
                if let TypeDesc::Queue(payload) = &sig.ret {
                    frame.promise_payload = Some((**payload).clone());
                }
                let child = ctx.for_function(frame.clone());
                match body {
                    FnBody::Block(block) => {
                        let statements: Vec<&Statement> = block.statements.iter().collect();
                        lines.extend(self.lower_statements(&statements, &child)?);
                        let falls_off = !block.statements.iter().rev().find(|s| !matches!(s, Statement::Empty(_))).is_some_and(|s| matches!(s, Statement::Return(_) | Statement::Throw(_)));
                        if falls_off && !matches!(sig.ret, TypeDesc::Void) && !frame.constructor {
                            lines.push(format!("return {}", sig.ret.zero_value()));
                        }
                    }
                    FnBody::Expression(expr) => {
                        if matches!(sig.ret, TypeDesc::Void) {
                            lines.push(self.lower_expression_statement(expr, &child)?);
                        } else {
                            let value = self.lower_expr_as(expr, &sig.ret, &child)?;
                            lines.push(format!("return {}", value));
                        }
                    }
                    FnBody::None => {}
                }
            }
        }
        Ok((names, lines.join("\n")))
    }

    /// Executor of a `new Promise(...)` launched as a goroutine. As a
    /// function body the channel is returned; as a value it is wrapped in
    /// an immediately-invoked closure.
    pub(super) fn lower_promise_task(
        &mut self,
        new: &NewExpression,
        payload: &TypeDesc,
        as_body: bool,
        ctx: &LowerCtx,
    ) -> TranspileResult<String> {
        let queue = self.fresh("q");
        let Some((params, body)) = executor_of(new) else {
            // Executor passed by reference: call it with channel-backed settlers
            let executor = match new.arguments.first() {
                Some(arg) => self.lower_expr(arg.expression(), &ctx.for_child())?,
                None => "func(func(interface{}), func(interface{})) {}".to_string(),
            };
            let task = promise::call_executor(&executor, &queue, payload);
            return Ok(if as_body {
                promise::spawn_and_return(&queue, payload, &task)
            } else {
                promise::spawn_value(&queue, payload, &task)
            });
        };

        let resolve = params.first().map(|p| self.text(p.name.name));
        let reject = params.get(1).map(|p| self.text(p.name.name));
        let mut child = ctx.for_function(FunctionFrame {
            return_type: Some(TypeDesc::Void),
            promise_payload: Some(payload.clone()),
            class: ctx.function.class.clone(),
            ..Default::default()
        });
        child.resolver = Some(Resolver {
            resolve: resolve.clone().unwrap_or_default(),
            reject: reject.clone(),
            queue: queue.clone(),
            payload: payload.clone(),
        });

        self.env.push_scope();
        let settle = TypeDesc::function(FuncSig::new(vec![promise::payload_type(payload)], TypeDesc::Void));
        for name in resolve.iter().chain(reject.iter()) {
            self.env.declare(name.clone(), settle.clone());
        }
        let used = match body {
            FnBody::Block(block) => usage::referenced_in(&block.statements, &self.interner),
            FnBody::Expression(expr) => usage::referenced_in_expr(expr, &self.interner),
            FnBody::None => Default::default(),
        };
        self.used.push(used);
        let task = match body {
            FnBody::Block(block) => {
                let statements: Vec<&Statement> = block.statements.iter().collect();
                self.lower_statements(&statements, &child).map(|lines| lines.join("\n"))
            }
            FnBody::Expression(expr) => self.lower_expression_statement(expr, &child),
            FnBody::None => Ok(String::new()),
        };
        self.used.pop();
        self.env.pop_scope();
        let task = task?;

        Ok(if as_body {
            promise::spawn_and_return(&queue, payload, &task)
        } else {
            promise::spawn_value(&queue, payload, &task)
        })
    }
}

/// Index of the first defaulted or optional parameter when every parameter
/// after it is defaulted or optional too
fn collapsible_tail(params: &[Parameter]) -> Option<usize> {
    if params.iter().any(|p| p.is_rest) {
        return None;
    }
    let first = params
        .iter()
        .position(|p| p.default_value.is_some() || p.optional)?;
    params[first..]
        .iter()
        .all(|p| p.default_value.is_some() || p.optional)
        .then_some(first)
}

/// `(a float64, args ...interface{}) string` with parameter names
pub(crate) fn signature_text(sig: &FuncSig, names: &[String]) -> String {
    sig.go_signature(Some(names))
}

#[cfg(test)]
mod tests {
    use crate::config::TranspileOptions;
    use crate::transpiler::transpile;

    fn go(source: &str) -> String {
        let options = TranspileOptions {
            header_comment: false,
            ..Default::default()
        };
        transpile(source, &options).unwrap().code
    }

    #[test]
    fn test_default_parameters_collapse_into_tail() {
        let code = go("function greet(name: string = \"World\", punct: string = \"!\"): string { return name + punct; }");
        assert!(code.contains("func greet(args ...interface{}) string {"));
        assert!(code.contains("\tvar name string = \"World\"\n\tif len(args) > 0 {\n\t\tname = args[0].(string)\n\t}"));
        assert!(code.contains("\tif len(args) > 1 {\n\t\tpunct = args[1].(string)\n\t}"));
    }

    #[test]
    fn test_required_after_default_stays_positional() {
        let code = go("function f(a: number = 1, b: number): number { return a + b; }");
        assert!(code.contains("func f(a float64, b float64) float64 {"));
    }

    #[test]
    fn test_promise_shape_spawns_goroutine() {
        let code = go(
            "function later(ms: number): Promise<string> {\n  return new Promise((resolve) => {\n    setTimeout(() => resolve(\"done\"), ms);\n  });\n}",
        );
        assert!(code.contains("func later(ms float64) chan string {"));
        assert!(code.contains("_q0 := make(chan string, 1)"));
        assert!(code.contains("go func() {"));
        assert!(code.contains("_q0 <- \"done\""));
        assert!(code.contains("return _q0"));
    }

    #[test]
    fn test_other_async_functions_are_synchronous() {
        let code = go("async function total(): Promise<number> { return 42; }");
        assert!(code.contains("func total() float64 {"));
        assert!(code.contains("return 42"));
    }

    #[test]
    fn test_nested_function_can_recurse() {
        let code = go(
            "function outer(): number {\n  function fact(n: number): number { return n <= 1 ? 1 : n * fact(n - 1); }\n  return fact(5);\n}",
        );
        assert!(code.contains("var fact func(float64) float64"));
        assert!(code.contains("fact = func(n float64) float64 {"));
    }

    #[test]
    fn test_missing_return_gets_zero_value() {
        let code = go("function pick(x: number): string { if (x > 0) { return \"pos\"; } }");
        assert!(code.contains("\treturn \"\"\n}"));
    }
}
