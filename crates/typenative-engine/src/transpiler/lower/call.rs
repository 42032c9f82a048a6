//! Calls, method calls and `new`
//!
//! Dispatch goes by callee shape first (super, resolver, builtin global,
//! namespace, user function) and then by the static type of the receiver.

use super::expr::{iife, static_name};
use super::Lowerer;
use crate::parser::ast::*;
use crate::parser::Span;
use crate::transpiler::capability::Capability;
use crate::transpiler::context::LowerCtx;
use crate::transpiler::desugar::builtins::{self, Arg};
use crate::transpiler::desugar::combinators::{self, Callback};
use crate::transpiler::desugar::{self, promise, regex};
use crate::transpiler::error::{TranspileError, TranspileResult};
use crate::transpiler::infer::callback_hint;
use crate::transpiler::types::{FuncSig, TypeDesc};
use rustc_hash::FxHashMap;

/// Lowering of a call: a Go expression, or a statement that only exists
/// in statement position
enum Emitted {
    Value(String),
    Statement(String),
}

/// Declared parameter count of a callback literal
fn literal_arity(callback: &Expression) -> Option<usize> {
    match callback.unwrapped() {
        Expression::Arrow(arrow) => Some(arrow.params.iter().filter(|p| !p.is_rest).count()),
        Expression::Function(func) => Some(func.params.iter().filter(|p| !p.is_rest).count()),
        _ => None,
    }
}

/// `[float64, string]` for explicit Go type arguments
fn type_arg_text(types: &[TypeDesc]) -> String {
    if types.is_empty() {
        return String::new();
    }
    let names: Vec<String> = types.iter().map(TypeDesc::go_type).collect();
    format!("[{}]", names.join(", "))
}

impl Lowerer {
    /// Lower a call. In statement position the result may be a Go
    /// statement that has no value form, such as a channel send.
    pub(crate) fn lower_call(&mut self, call: &CallExpression, ctx: &LowerCtx, statement: bool) -> TranspileResult<String> {
        let emitted = match call.callee.unwrapped() {
            Expression::Super(span) => Emitted::Statement(self.lower_super_call(call, *span, ctx)?),
            Expression::Identifier(id) => self.lower_identifier_call(id, call, ctx, statement)?,
            Expression::Member(member) => self.lower_method_call(member, call, ctx, statement)?,
            other => {
                let sig = self.type_of(other).signature().cloned();
                let callee = self.lower_expr(other, &ctx.for_child())?;
                let args = self.lower_args(sig.as_ref(), &call.arguments, call.span, ctx)?;
                Emitted::Value(format!("{}({})", desugar::paren(&callee), args.join(", ")))
            }
        };
        Ok(match emitted {
            Emitted::Statement(text) => text,
            Emitted::Value(text) if statement => self.discard(text),
            Emitted::Value(text) => text,
        })
    }

    // ========================================================================
    // Arguments
    // ========================================================================

    /// Arguments against a signature: defaulted tails are boxed, missing
    /// positional arguments get zero values, spreads go last
    fn lower_args(&mut self, sig: Option<&FuncSig>, args: &[Argument], span: Span, ctx: &LowerCtx) -> TranspileResult<Vec<String>> {
        let mut out = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            match arg {
                Argument::Spread(expr) => {
                    if i + 1 != args.len() || sig.is_some_and(|s| s.rest.is_none()) {
                        return Err(TranspileError::malformed(
                            "spread argument must be last and match a rest parameter",
                            *expr.span(),
                        ));
                    }
                    let text = self.lower_expr(expr, &ctx.for_child())?;
                    out.push(format!("{}...", text));
                }
                Argument::Expression(expr) => {
                    let Some(sig) = sig else {
                        out.push(self.lower_expr(expr, &ctx.for_child())?);
                        continue;
                    };
                    let target = sig.param_type(i);
                    let text = self.lower_expr_as(expr, &target, &ctx.for_child())?;
                    let boxed = sig.has_default_tail() && i >= sig.required;
                    if boxed && target.is_number() && text.parse::<i64>().is_ok() {
                        // An untyped integer would arrive as `int` in the tail
                        out.push(format!("float64({})", text));
                    } else {
                        out.push(text);
                    }
                }
            }
        }
        if let Some(sig) = sig {
            let positional = if sig.has_default_tail() { sig.required } else { sig.params.len() };
            if args.len() < positional {
                tracing::debug!(line = span.line, supplied = args.len(), positional, "zero-filling missing arguments");
            }
            for i in args.len()..positional {
                out.push(sig.param_type(i).zero_value());
            }
        }
        Ok(out)
    }

    fn lowered_args(&mut self, args: &[Argument], ctx: &LowerCtx) -> TranspileResult<Vec<Arg>> {
        let mut out = Vec::new();
        for arg in args {
            let expr = arg.expression();
            let ty = self.type_of(expr);
            let text = self.lower_expr(expr, &ctx.for_child())?;
            out.push((text, ty));
        }
        Ok(out)
    }

    /// Arguments as float64 operands
    fn numeric_args(&mut self, args: &[Argument], ctx: &LowerCtx) -> TranspileResult<Vec<Arg>> {
        let mut out = Vec::new();
        for arg in args {
            let text = self.lower_expr_as(arg.expression(), &TypeDesc::Number, &ctx.for_child())?;
            out.push((text, TypeDesc::Number));
        }
        Ok(out)
    }

    // ========================================================================
    // Plain identifiers
    // ========================================================================

    fn lower_identifier_call(
        &mut self,
        id: &Identifier,
        call: &CallExpression,
        ctx: &LowerCtx,
        statement: bool,
    ) -> TranspileResult<Emitted> {
        let name = self.text(id.name);

        if let Some(resolver) = ctx.resolver.clone() {
            if self.env.lookup(&name).is_some() {
                if name == resolver.resolve {
                    let payload = promise::payload_type(&resolver.payload);
                    let value = match call.arguments.first() {
                        Some(arg) => self.lower_expr_as(arg.expression(), &payload, &ctx.for_child())?,
                        None => payload.zero_value(),
                    };
                    return Ok(Emitted::Statement(promise::resolve(&resolver.queue, &value)));
                }
                if resolver.reject.as_deref() == Some(name.as_str()) {
                    let reason = match call.arguments.first() {
                        Some(arg) => self.lower_expr(arg.expression(), &ctx.for_child())?,
                        None => "nil".to_string(),
                    };
                    return Ok(Emitted::Statement(promise::reject(&reason)));
                }
            }
        }

        let bound = self.env.lookup(&name).cloned();
        if bound.is_none() && !self.env.functions.contains_key(&name) {
            if let Some(emitted) = self.lower_global_call(&name, call, ctx, statement)? {
                return Ok(emitted);
            }
        }

        let callee = self.go_ident(id.name);
        if let Some(ty) = bound {
            let sig = ty.signature().cloned();
            let args = self.lower_args(sig.as_ref(), &call.arguments, call.span, ctx)?;
            return Ok(Emitted::Value(format!("{}({})", callee, args.join(", "))));
        }
        let Some(declared) = self.env.functions.get(&name).cloned() else {
            let args = self.lower_args(None, &call.arguments, call.span, ctx)?;
            return Ok(Emitted::Value(format!("{}({})", callee, args.join(", "))));
        };

        let (sig, bound_types) = self.instantiate(&declared, call.type_args.as_deref(), &call.arguments);
        let explicit = !bound_types.is_empty()
            && bound_types.iter().all(|t| !t.is_any() && !matches!(t, TypeDesc::TypeParam(_)));
        let args = self.lower_args(Some(&sig), &call.arguments, call.span, ctx)?;
        let type_args = if explicit { type_arg_text(&bound_types) } else { String::new() };
        Ok(Emitted::Value(format!("{}{}({})", callee, type_args, args.join(", "))))
    }

    /// `assert`, `setTimeout` and the global conversion functions
    fn lower_global_call(
        &mut self,
        name: &str,
        call: &CallExpression,
        ctx: &LowerCtx,
        statement: bool,
    ) -> TranspileResult<Option<Emitted>> {
        match name {
            "assert" => {
                let Some(first) = call.arguments.first() else {
                    return Err(TranspileError::malformed("assert needs a condition", call.span));
                };
                let condition = self.condition(first.expression(), ctx)?;
                let message = match call.arguments.get(1) {
                    Some(arg) => self.lower_expr(arg.expression(), &ctx.for_child())?,
                    None => desugar::go_quote("assertion failed"),
                };
                let text = format!("if !({}) {{\npanic({})\n}}", condition, message);
                Ok(Some(if statement {
                    Emitted::Statement(text)
                } else {
                    Emitted::Value(iife(&TypeDesc::Void, &text))
                }))
            }
            "setTimeout" => {
                let hint = TypeDesc::function(FuncSig::new(Vec::new(), TypeDesc::Void));
                let callback = match call.arguments.first() {
                    Some(arg) => self.lower_expr(arg.expression(), &ctx.expecting(Some(hint)))?,
                    None => return Err(TranspileError::malformed("setTimeout needs a callback", call.span)),
                };
                let delay = match call.arguments.get(1) {
                    Some(arg) => self.lower_expr_as(arg.expression(), &TypeDesc::Number, &ctx.for_child())?,
                    None => "0".to_string(),
                };
                self.require(Capability::Time);
                Ok(Some(Emitted::Value(promise::schedule(&callback, &delay))))
            }
            _ => {
                let args = self.lowered_args(&call.arguments, ctx)?;
                Ok(builtins::global(name, &args, &mut self.temps).map(|rewrite| Emitted::Value(self.apply(rewrite))))
            }
        }
    }

    // ========================================================================
    // super(...)
    // ========================================================================

    /// Initialize the embedded parent from its synthesized constructor,
    /// then run the field initializers that were waiting for it
    fn lower_super_call(&mut self, call: &CallExpression, span: Span, ctx: &LowerCtx) -> TranspileResult<String> {
        if !ctx.function.derived_constructor {
            return Err(TranspileError::malformed("super call outside a derived constructor", span));
        }
        let parent_ty = self.super_type();
        let Some(parent) = parent_ty.class_name().map(str::to_string) else {
            return Err(TranspileError::malformed("super call in a class without a translated parent", span));
        };
        let bindings = self.env.class_bindings(&parent_ty);
        let mut sig = self.constructor_sig(&parent);
        sig.params = sig.params.iter().map(|p| p.substitute(&bindings)).collect();
        let args = self.lower_args(Some(&sig), &call.arguments, call.span, ctx)?;
        let type_args = match &parent_ty {
            TypeDesc::Class { args, .. } => type_arg_text(args),
            _ => String::new(),
        };

        let mut lines = vec![format!(
            "this.{} = New{}{}({})",
            parent,
            parent,
            type_args,
            args.join(", ")
        )];
        lines.extend(self.pending_field_inits.take().unwrap_or_default());
        Ok(lines.join("\n"))
    }

    // ========================================================================
    // Method calls
    // ========================================================================

    fn lower_method_call(
        &mut self,
        member: &MemberExpression,
        call: &CallExpression,
        ctx: &LowerCtx,
        statement: bool,
    ) -> TranspileResult<Emitted> {
        let method = self.text(member.property.name);

        if let Some(receiver) = self.static_receiver(&member.object) {
            if let Some(emitted) = self.lower_namespace_call(&receiver, &method, call, ctx)? {
                return Ok(emitted);
            }
        }

        let object_ty = self.type_of(&member.object);
        let receiver = self.lower_expr(&member.object, &ctx.for_child())?;
        let receiver = desugar::paren(&receiver);

        match object_ty.unwrap_nilable().clone() {
            TypeDesc::String => {
                let args = self.lowered_args(&call.arguments, ctx)?;
                if let Some(rewrite) = builtins::string_method(&method, &receiver, &args, &mut self.temps) {
                    return Ok(Emitted::Value(self.apply(rewrite)));
                }
            }
            TypeDesc::Number | TypeDesc::Enum(_) => {
                let args = self.lowered_args(&call.arguments, ctx)?;
                let receiver = match object_ty.unwrap_nilable() {
                    TypeDesc::Enum(_) => format!("float64({})", receiver),
                    _ => receiver.clone(),
                };
                if let Some(rewrite) = builtins::number_method(&method, &receiver, &args) {
                    return Ok(Emitted::Value(self.apply(rewrite)));
                }
            }
            TypeDesc::Boolean => {
                if let Some(rewrite) = builtins::boolean_method(&method, &receiver) {
                    return Ok(Emitted::Value(self.apply(rewrite)));
                }
            }
            TypeDesc::Pattern => {
                let args = self.lowered_args(&call.arguments, ctx)?;
                if let Some(rewrite) = builtins::pattern_method(&method, &receiver, &args) {
                    return Ok(Emitted::Value(self.apply(rewrite)));
                }
            }
            TypeDesc::Slice(elem) => {
                if let Some(emitted) = self.lower_array_method(&receiver, &elem, &method, call, ctx, statement)? {
                    return Ok(emitted);
                }
            }
            TypeDesc::Queue(payload) if method == "then" => {
                let hint = TypeDesc::function(FuncSig::new(vec![promise::payload_type(&payload)], TypeDesc::Void));
                let callback = match call.arguments.first() {
                    Some(arg) => self.lower_expr(arg.expression(), &ctx.expecting(Some(hint)))?,
                    None => return Ok(Emitted::Value(format!("<-{}", receiver))),
                };
                return Ok(Emitted::Value(format!("{}(<-{})", desugar::paren(&callback), receiver)));
            }
            ty @ TypeDesc::Class { .. } => {
                let Some(class) = ty.class_name().map(str::to_string) else {
                    return Ok(Emitted::Value(String::new()));
                };
                let bindings = self.env.class_bindings(&ty);
                let sig = match self.env.find_method(&class, &method) {
                    Some(found) => Some(found.sig.clone()),
                    None => self
                        .env
                        .find_property(&class, &method)
                        .and_then(|p| p.ty.signature().cloned()),
                };
                if let Some(sig) = sig {
                    let sig = match TypeDesc::function(sig).substitute(&bindings) {
                        TypeDesc::Function(sig) => *sig,
                        _ => FuncSig::new(Vec::new(), TypeDesc::Any),
                    };
                    let args = self.lower_args(Some(&sig), &call.arguments, call.span, ctx)?;
                    let name = self.env.go_name(&crate::transpiler::env::sanitize(&method));
                    return Ok(Emitted::Value(format!("{}.{}({})", receiver, name, args.join(", "))));
                }
            }
            TypeDesc::Interface(name) => {
                if let Some(found) = self.env.find_interface_method(&name, &method).cloned() {
                    let args = self.lower_args(Some(&found.sig), &call.arguments, call.span, ctx)?;
                    let go = self.env.go_name(&crate::transpiler::env::sanitize(&method));
                    return Ok(Emitted::Value(format!("{}.{}({})", receiver, go, args.join(", "))));
                }
            }
            TypeDesc::Struct(name) => {
                let sig = self
                    .env
                    .find_interface_property(&name, &method)
                    .and_then(|p| p.ty.signature().cloned());
                if let Some(sig) = sig {
                    let args = self.lower_args(Some(&sig), &call.arguments, call.span, ctx)?;
                    let field = self.env.go_name(&crate::transpiler::env::sanitize(&method));
                    return Ok(Emitted::Value(format!("{}.{}({})", receiver, field, args.join(", "))));
                }
            }
            _ => {}
        }

        self.fallback(&format!("method `{}` on a value of type {}", method, object_ty.go_type()), call.span)?;
        let args = self.lower_args(None, &call.arguments, call.span, ctx)?;
        let name = self.env.go_name(&crate::transpiler::env::sanitize(&method));
        Ok(Emitted::Value(format!("{}.{}({})", receiver, name, args.join(", "))))
    }

    /// `console.*`, `Math.*`, `Number.*` and static class methods
    fn lower_namespace_call(
        &mut self,
        receiver: &str,
        method: &str,
        call: &CallExpression,
        ctx: &LowerCtx,
    ) -> TranspileResult<Option<Emitted>> {
        match receiver {
            "console" => self.lower_console_call(method, call, ctx).map(Some),
            "Math" => {
                let spread = call.arguments.iter().any(|a| matches!(a, Argument::Spread(_)));
                if spread && matches!(method, "min" | "max") {
                    return self.lower_math_extreme(method, call, ctx).map(|t| Some(Emitted::Value(t)));
                }
                let args = self.numeric_args(&call.arguments, ctx)?;
                Ok(builtins::math(method, &args).map(|rewrite| Emitted::Value(self.apply(rewrite))))
            }
            "Number" => {
                let args = self.numeric_args(&call.arguments, ctx)?;
                let x = args.first().map(|(t, _)| desugar::paren(t)).unwrap_or_else(|| "0".to_string());
                let text = match method {
                    "isInteger" => format!("{} == math.Trunc({})", x, x),
                    "isSafeInteger" => format!("{} == math.Trunc({}) && math.Abs({}) <= 9007199254740991", x, x, x),
                    "isFinite" => format!("!math.IsInf({}, 0) && !math.IsNaN({})", x, x),
                    "isNaN" => format!("math.IsNaN({})", x),
                    "parseFloat" | "parseInt" => {
                        let args = self.lowered_args(&call.arguments, ctx)?;
                        return Ok(builtins::global(method, &args, &mut self.temps)
                            .map(|rewrite| Emitted::Value(self.apply(rewrite))));
                    }
                    _ => return Ok(None),
                };
                self.require(Capability::Math);
                Ok(Some(Emitted::Value(text)))
            }
            _ => {
                let Some(sig) = self
                    .env
                    .classes
                    .get(receiver)
                    .and_then(|info| info.static_method(method))
                    .map(|m| m.sig.clone())
                else {
                    return Ok(None);
                };
                let args = self.lower_args(Some(&sig), &call.arguments, call.span, ctx)?;
                Ok(Some(Emitted::Value(format!("{}({})", static_name(receiver, method), args.join(", ")))))
            }
        }
    }

    fn lower_console_call(&mut self, method: &str, call: &CallExpression, ctx: &LowerCtx) -> TranspileResult<Emitted> {
        if matches!(method, "time" | "timeEnd") {
            let (key, label) = match call.arguments.first().map(|a| a.expression().unwrapped()) {
                Some(Expression::StringLiteral(lit)) => {
                    let key = self.text(lit.value);
                    let label = desugar::go_quote(&key);
                    (key, label)
                }
                Some(other) => {
                    let label = self.lower_expr(other, &ctx.for_child())?;
                    (label.clone(), label)
                }
                None => ("default".to_string(), desugar::go_quote("default")),
            };
            if method == "time" {
                let var = self.fresh("t");
                self.timers.insert(key, var.clone());
                let rewrite = builtins::timer_start(&var);
                return Ok(Emitted::Statement(self.apply(rewrite)));
            }
            let Some(var) = self.timers.get(&key).cloned() else {
                self.warn(format!("console.timeEnd for timer {} that was never started", label), call.span);
                let rewrite = builtins::console("log", &[(label, TypeDesc::String)]);
                return Ok(Emitted::Value(rewrite.map(|r| self.apply(r)).unwrap_or_default()));
            };
            let rewrite = builtins::timer_end(&label, &var);
            return Ok(Emitted::Value(self.apply(rewrite)));
        }

        let args = self.lowered_args(&call.arguments, ctx)?;
        match builtins::console(method, &args) {
            Some(rewrite) => Ok(Emitted::Value(self.apply(rewrite))),
            None => {
                self.fallback(&format!("console.{}", method), call.span)?;
                let rewrite = builtins::console("log", &args);
                Ok(Emitted::Value(rewrite.map(|r| self.apply(r)).unwrap_or_default()))
            }
        }
    }

    /// `Math.max(...xs)`: a loop over the spread values
    fn lower_math_extreme(&mut self, method: &str, call: &CallExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let mut fixed = Vec::new();
        let mut spreads = Vec::new();
        for arg in &call.arguments {
            match arg {
                Argument::Expression(expr) => fixed.push(self.lower_expr_as(expr, &TypeDesc::Number, &ctx.for_child())?),
                Argument::Spread(expr) => spreads.push(self.lower_expr(expr, &ctx.for_child())?),
            }
        }
        let mut values = format!("[]float64{{{}}}", fixed.join(", "));
        for spread in spreads {
            values = format!("append({}, {}...)", values, spread);
        }
        let (start, pick) = if method == "max" { ("math.Inf(-1)", "Max") } else { ("math.Inf(1)", "Min") };
        let acc = self.fresh("m");
        let elem = self.fresh("e");
        self.require(Capability::Math);
        Ok(format!(
            "func() float64 {{\n{acc} := {start}\nfor _, {elem} := range {values} {{\n{acc} = math.{pick}({acc}, {elem})\n}}\nreturn {acc}\n}}()",
            acc = acc,
            start = start,
            elem = elem,
            values = values,
            pick = pick,
        ))
    }

    // ========================================================================
    // Array methods
    // ========================================================================

    fn lower_array_method(
        &mut self,
        receiver: &str,
        elem: &TypeDesc,
        method: &str,
        call: &CallExpression,
        ctx: &LowerCtx,
        statement: bool,
    ) -> TranspileResult<Option<Emitted>> {
        let args = &call.arguments;
        let text = match method {
            "push" | "unshift" => {
                let mut values = Vec::new();
                let mut spread = None;
                for arg in args {
                    match arg {
                        Argument::Expression(expr) => values.push(self.lower_expr_as(expr, elem, &ctx.for_child())?),
                        Argument::Spread(expr) => spread = Some(self.lower_expr(expr, &ctx.for_child())?),
                    }
                }
                let added = match spread {
                    Some(spread) if values.is_empty() => format!("{}...", spread),
                    Some(spread) => format!("append([]{}{{{}}}, {}...)...", elem.go_type(), values.join(", "), spread),
                    None => values.join(", "),
                };
                let grown = if method == "push" {
                    format!("append({}, {})", receiver, added)
                } else {
                    let front = if added.ends_with("...") {
                        added.trim_end_matches("...").to_string()
                    } else {
                        format!("[]{}{{{}}}", elem.go_type(), added)
                    };
                    format!("append({}, {}...)", front, receiver)
                };
                if statement {
                    return Ok(Some(Emitted::Statement(format!("{} = {}", receiver, grown))));
                }
                if method == "push" && !added.ends_with("...") {
                    return Ok(Some(Emitted::Value(combinators::push_value(receiver, &[added]))));
                }
                iife(
                    &TypeDesc::Number,
                    &format!("{r} = {g}\nreturn float64(len({r}))", r = receiver, g = grown),
                )
            }
            "pop" | "shift" => combinators::take(receiver, elem, method == "shift", &mut self.temps),
            "map" | "filter" | "some" | "every" | "find" | "findIndex" | "forEach" => {
                let Some(callback) = args.first().map(Argument::expression) else {
                    return Err(TranspileError::malformed(format!("{} needs a callback", method), call.span));
                };
                let hint = callback_hint(elem);
                let returns = self.callback_return(callback, &hint);
                let function = self.lower_expr(callback, &ctx.expecting(Some(TypeDesc::function(hint.clone()))))?;
                let arity = self.callback_arity(callback, &hint);
                let cb = Callback {
                    receiver,
                    element: elem,
                    function: &function,
                    arity,
                    returns: &returns,
                };
                let temps = &mut self.temps;
                match method {
                    "map" => combinators::map(&cb, temps),
                    "filter" => combinators::filter(&cb, temps),
                    "some" => combinators::some(&cb, temps),
                    "every" => combinators::every(&cb, temps),
                    "find" => combinators::find(&cb, temps),
                    "findIndex" => combinators::find_index(&cb, temps),
                    _ => combinators::for_each(&cb, temps),
                }
            }
            "reduce" => {
                let Some(callback) = args.first().map(Argument::expression) else {
                    return Err(TranspileError::malformed("reduce needs a callback", call.span));
                };
                let accumulator = self.reduce_type(elem, args);
                let mut hint = callback_hint(elem);
                hint.params.insert(0, accumulator.clone());
                hint.required = hint.params.len();
                hint.ret = accumulator.clone();
                let function = self.lower_expr(callback, &ctx.expecting(Some(TypeDesc::function(hint.clone()))))?;
                let init = match args.get(1) {
                    Some(arg) => Some(self.lower_expr_as(arg.expression(), &accumulator, &ctx.for_child())?),
                    None => None,
                };
                let arity = self.callback_arity(callback, &hint);
                let cb = Callback {
                    receiver,
                    element: elem,
                    function: &function,
                    arity,
                    returns: &accumulator,
                };
                combinators::reduce(&cb, &accumulator, init.as_deref(), &mut self.temps)
            }
            "join" | "toString" => {
                let separator = match args.first() {
                    Some(arg) if method == "join" => {
                        Some(self.lower_expr_as(arg.expression(), &TypeDesc::String, &ctx.for_child())?)
                    }
                    _ => None,
                };
                let (text, capabilities) = combinators::join(receiver, elem, separator.as_deref(), &mut self.temps);
                self.require(Capability::Strings);
                for capability in capabilities {
                    self.require(capability);
                }
                text
            }
            "indexOf" | "includes" => {
                let value = match args.first() {
                    Some(arg) => self.lower_expr_as(arg.expression(), elem, &ctx.for_child())?,
                    None => elem.zero_value(),
                };
                if method == "indexOf" {
                    combinators::index_of(receiver, &value, &mut self.temps)
                } else {
                    combinators::includes(receiver, &value, &mut self.temps)
                }
            }
            "reverse" => combinators::reverse(receiver, elem, &mut self.temps),
            "slice" => {
                let mut bounds = Vec::new();
                for arg in args.iter().take(2) {
                    let text = self.lower_expr_as(arg.expression(), &TypeDesc::Number, &ctx.for_child())?;
                    bounds.push(desugar::int_index(&text));
                }
                combinators::slice(receiver, elem, bounds.first().map(String::as_str), bounds.get(1).map(String::as_str))
            }
            "concat" => {
                let mut parts = Vec::new();
                for arg in args {
                    let expr = arg.expression();
                    let is_slice = matches!(arg, Argument::Spread(_)) || matches!(self.type_of(expr), TypeDesc::Slice(_));
                    let text = if is_slice {
                        self.lower_expr(expr, &ctx.for_child())?
                    } else {
                        self.lower_expr_as(expr, elem, &ctx.for_child())?
                    };
                    parts.push((text, is_slice));
                }
                combinators::concat(receiver, elem, &parts)
            }
            _ => return Ok(None),
        };
        Ok(Some(Emitted::Value(text)))
    }

    /// Parameters a callback declares, or the ones its signature takes
    fn callback_arity(&mut self, callback: &Expression, hint: &FuncSig) -> usize {
        literal_arity(callback).unwrap_or_else(|| {
            self.type_of(callback)
                .signature()
                .map_or(hint.params.len(), |sig| sig.params.len())
        })
    }

    // ========================================================================
    // new
    // ========================================================================

    pub(super) fn lower_new(&mut self, new: &NewExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let Expression::Identifier(id) = new.callee.unwrapped() else {
            self.fallback("`new` on a computed constructor", new.span)?;
            let callee = self.lower_expr(&new.callee, &ctx.for_child())?;
            let args = self.lower_args(None, &new.arguments, new.span, ctx)?;
            return Ok(format!("{}({})", desugar::paren(&callee), args.join(", ")));
        };
        let name = self.text(id.name);
        if self.env.classes.contains_key(&name) {
            return self.lower_class_instantiation(&name, new, ctx);
        }

        match name.as_str() {
            "Promise" => {
                let payload = self.promise_payload(new, ctx.expected.as_ref());
                self.lower_promise_task(new, &payload, false, ctx)
            }
            "RegExp" => self.lower_new_regexp(new, ctx),
            "Error" | "TypeError" | "RangeError" | "SyntaxError" | "ReferenceError" => {
                let message = match new.arguments.first() {
                    Some(arg) => {
                        let expr = arg.expression();
                        let ty = self.type_of(expr);
                        let text = self.lower_expr(expr, &ctx.for_child())?;
                        self.stringified(&text, &ty)
                    }
                    None => "\"\"".to_string(),
                };
                self.require(Capability::Errors);
                Ok(format!("errors.New({})", message))
            }
            "Array" => {
                let elem = match ctx.expected.as_ref().map(TypeDesc::unwrap_nilable) {
                    Some(TypeDesc::Slice(elem)) => (**elem).clone(),
                    _ => TypeDesc::Any,
                };
                let length = match new.arguments.first() {
                    Some(arg) => {
                        let text = self.lower_expr_as(arg.expression(), &TypeDesc::Number, &ctx.for_child())?;
                        desugar::int_index(&text)
                    }
                    None => "0".to_string(),
                };
                Ok(format!("make({}, {})", TypeDesc::slice(elem).go_type(), length))
            }
            _ => {
                self.fallback(&format!("`new {}`", name), new.span)?;
                let args = self.lower_args(None, &new.arguments, new.span, ctx)?;
                Ok(format!("New{}({})", name, args.join(", ")))
            }
        }
    }

    fn lower_new_regexp(&mut self, new: &NewExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let flags = match new.arguments.get(1).map(|a| a.expression().unwrapped()) {
            Some(Expression::StringLiteral(lit)) => self.text(lit.value),
            Some(other) => {
                self.warn("regular expression flags must be a string literal", *other.span());
                String::new()
            }
            None => String::new(),
        };
        self.require(Capability::Regexp);
        match new.arguments.first().map(|a| a.expression().unwrapped()) {
            Some(Expression::StringLiteral(lit)) => {
                let pattern = self.text(lit.value);
                if let Some(complaint) = regex::validate(&pattern, &flags) {
                    self.warn(
                        format!("regular expression {:?} is not valid RE2 syntax: {}", pattern, complaint),
                        lit.span,
                    );
                }
                Ok(regex::compile_literal(&pattern, &flags))
            }
            Some(other) => {
                let pattern = self.lower_expr_as(other, &TypeDesc::String, &ctx.for_child())?;
                Ok(regex::compile_dynamic(&pattern, &flags))
            }
            None => Ok(regex::compile_literal("", &flags)),
        }
    }

    /// `NewPoint(1, 2)`, `NewBox[float64](1)`
    fn lower_class_instantiation(&mut self, name: &str, new: &NewExpression, ctx: &LowerCtx) -> TranspileResult<String> {
        let type_params = self
            .env
            .classes
            .get(name)
            .map(|info| info.type_params.clone())
            .unwrap_or_default();
        let mut sig = self.constructor_sig(name);
        let mut type_args = String::new();
        if !type_params.is_empty() {
            sig.type_params = type_params.clone();
            let (_, mut bound) = self.instantiate(&sig, new.type_args.as_deref(), &new.arguments);
            if let Some(TypeDesc::Class { name: expected, args }) = ctx.expected.as_ref().map(TypeDesc::unwrap_nilable) {
                if expected == name && args.len() == bound.len() {
                    for (slot, declared) in bound.iter_mut().zip(args) {
                        if slot.is_any() {
                            *slot = declared.clone();
                        }
                    }
                }
            }
            let bindings: FxHashMap<String, TypeDesc> =
                type_params.iter().cloned().zip(bound.iter().cloned()).collect();
            sig.params = sig.params.iter().map(|p| p.substitute(&bindings)).collect();
            sig.rest = sig.rest.map(|r| r.substitute(&bindings));
            sig.type_params.clear();
            type_args = type_arg_text(&bound);
        }
        let args = self.lower_args(Some(&sig), &new.arguments, new.span, ctx)?;
        Ok(format!("New{}{}({})", name, type_args, args.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TranspileOptions;
    use crate::transpiler::error::TranspileError;
    use crate::transpiler::transpile;

    fn go(source: &str) -> String {
        let options = TranspileOptions {
            header_comment: false,
            ..Default::default()
        };
        transpile(source, &options).unwrap().code
    }

    // ========================================================================
    // Builtins
    // ========================================================================

    #[test]
    fn test_console_streams() {
        let code = go("console.log(\"a\", 1);\nconsole.error(\"b\");");
        assert!(code.contains("fmt.Println(\"a\", 1)"));
        assert!(code.contains("fmt.Fprintln(os.Stderr, \"b\")"));
        assert!(code.contains("\"os\""));
    }

    #[test]
    fn test_console_timer_pairs_by_label() {
        let code = go("console.time(\"loop\");\nconsole.timeEnd(\"loop\");");
        assert!(code.contains("_t0 := time.Now()"));
        assert!(code.contains("fmt.Printf(\"%s: %v\\n\", \"loop\", time.Since(_t0))"));
    }

    #[test]
    fn test_assert_panics_with_message() {
        let code = go("const x = 2;\nassert(x === 2, \"x should be 2\");");
        assert!(code.contains("if !(x == 2) {\n\t\tpanic(\"x should be 2\")\n\t}"));
    }

    #[test]
    fn test_math_calls() {
        let code = go("const n = Math.floor(2.5);\nconsole.log(n, Math.PI);");
        assert!(code.contains("math.Floor(2.5)"));
        assert!(code.contains("math.Pi"));
    }

    #[test]
    fn test_math_max_over_spread() {
        let code = go("const xs = [1, 5, 3];\nconsole.log(Math.max(...xs));");
        assert!(code.contains("_m0 := math.Inf(-1)"));
        assert!(code.contains("for _, _e1 := range append([]float64{}, xs...) {"));
    }

    #[test]
    fn test_string_methods() {
        let code = go("const s = \"Hello\";\nconsole.log(s.toUpperCase(), s.includes(\"ell\"));");
        assert!(code.contains("strings.ToUpper(s)"));
        assert!(code.contains("strings.Contains(s, \"ell\")"));
    }

    #[test]
    fn test_number_to_string() {
        let code = go("const n = 1.5;\nconst s = n.toString();\nconsole.log(s);");
        assert!(code.contains("s := strconv.FormatFloat(n, 'f', -1, 64)"));
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    #[test]
    fn test_push_statement_reassigns() {
        let code = go("let xs: number[] = [];\nxs.push(1);\nconsole.log(xs);");
        assert!(code.contains("xs = append(xs, 1)"));
    }

    #[test]
    fn test_push_value_returns_length() {
        let code = go("let xs: number[] = [];\nconst n = xs.push(1);\nconsole.log(n);");
        assert!(code.contains("xs = append(xs, 1)\n\t\treturn float64(len(xs))"));
    }

    #[test]
    fn test_map_filter_chain() {
        let code = go("const xs = [1, 2, 3];\nconst ys = xs.map(x => x * 2).filter(x => x > 2);\nconsole.log(ys);");
        assert!(code.contains("func(x float64) float64 {\n"));
        assert!(code.contains("func(x float64) bool {\n"));
        assert!(code.contains("ys := func() []float64 {"));
    }

    #[test]
    fn test_reduce_with_seed() {
        let code = go("const xs = [1, 2, 3];\nconst total = xs.reduce((acc, x) => acc + x, 0);\nconsole.log(total);");
        assert!(code.contains("func(acc float64, x float64) float64 {"));
        assert!(code.contains(" = 0\n"));
    }

    #[test]
    fn test_join_needs_strings() {
        let code = go("const words = [\"a\", \"b\"];\nconsole.log(words.join(\" \"));");
        assert!(code.contains("strings.Join(words, \" \")"));
        assert!(code.contains("\"strings\""));
    }

    #[test]
    fn test_slice_copies() {
        let code = go("const xs = [1, 2, 3];\nconst ys = xs.slice(1, 3);\nconsole.log(ys);");
        assert!(code.contains("ys := func(s []float64, start int, end int) []float64 {"));
        assert!(code.contains("return append([]float64{}, s[start:end]...)"));
        assert!(code.contains("}(xs, 1, 3)"));

        let code = go("const xs = [1, 2, 3];\nconst tail = xs.slice(-5, 99);\nconsole.log(tail);");
        assert!(code.contains("}(xs, int(-5), 99)"));
        assert!(code.contains("if end > len(s) {"));
    }

    // ========================================================================
    // User functions
    // ========================================================================

    #[test]
    fn test_default_tail_arguments_are_boxed() {
        let code = go("function scale(x: number, by: number = 2): number { return x * by; }\nconsole.log(scale(3, 4));");
        assert!(code.contains("scale(3, float64(4))"));
    }

    #[test]
    fn test_generic_call_gets_explicit_type_arguments() {
        let code = go("function identity<T>(value: T): T { return value; }\nconst s = identity<string>(\"x\");\nconsole.log(s);");
        assert!(code.contains("func identity[T any](value T) T {"));
        assert!(code.contains("s := identity[string](\"x\")"));
    }

    #[test]
    fn test_rest_parameter_with_spread() {
        let code = go("function sum(...xs: number[]): number { return xs.length; }\nconst a = [1, 2];\nconsole.log(sum(...a));");
        assert!(code.contains("func sum(xs ...float64) float64 {"));
        assert!(code.contains("sum(a...)"));
    }

    #[test]
    fn test_spread_without_rest_is_malformed() {
        let err = transpile(
            "function f(a: number): number { return a; }\nconst xs = [1];\nf(...xs);",
            &TranspileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranspileError::MalformedTree { .. }));
    }

    #[test]
    fn test_new_error_and_throw() {
        let code = go("function fail(): void { throw new Error(\"bad\"); }\nfail();");
        assert!(code.contains("panic(errors.New(\"bad\"))"));
        assert!(code.contains("\"errors\""));
    }
}
