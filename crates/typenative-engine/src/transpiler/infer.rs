//! Static type inference
//!
//! Lowering choices depend on the static type of each operand: string
//! concatenation versus arithmetic, which combinator closure to emit, when
//! a value needs a pointer. Inference never fails; anything it cannot pin
//! down is `Any`.

use super::desugar::builtins;
use super::desugar::optional;
use super::env::ClassInfo;
use super::lower::{FnBody, Lowerer};
use super::types::{FuncSig, TypeDesc};
use crate::parser::ast::*;
use rustc_hash::FxHashMap;

/// True when a member, index or call chain contains `?.`
pub(crate) fn has_optional_link(expr: &Expression) -> bool {
    match expr {
        Expression::Member(member) => member.optional || has_optional_link(&member.object),
        Expression::Index(index) => index.optional || has_optional_link(&index.object),
        Expression::Call(call) => call.optional || has_optional_link(&call.callee),
        Expression::NonNull(inner) => has_optional_link(&inner.expression),
        _ => false,
    }
}

/// Hint for array combinator callbacks: element, index, array
pub(crate) fn callback_hint(element: &TypeDesc) -> FuncSig {
    FuncSig::new(
        vec![element.clone(), TypeDesc::Number, TypeDesc::slice(element.clone())],
        TypeDesc::Any,
    )
}

/// Return types seen while walking a body
#[derive(Default)]
struct Returns {
    types: Vec<TypeDesc>,
    saw_null: bool,
}

impl Returns {
    fn finish(self) -> TypeDesc {
        let Some(first) = self.types.first() else {
            return if self.saw_null { TypeDesc::Any } else { TypeDesc::Void };
        };
        let combined = self.types[1..]
            .iter()
            .fold(first.clone(), |acc, ty| TypeDesc::common(&acc, ty));
        if self.saw_null {
            TypeDesc::nilable(combined)
        } else {
            combined
        }
    }
}

impl Lowerer {
    /// `null` or `undefined`
    pub(crate) fn is_null(&self, expr: &Expression) -> bool {
        match expr.unwrapped() {
            Expression::NullLiteral(_) => true,
            Expression::Identifier(id) => {
                self.interner.resolve(id.name) == "undefined" && self.env.lookup("undefined").is_none()
            }
            _ => false,
        }
    }

    /// Static type of an expression
    pub(crate) fn type_of(&mut self, expr: &Expression) -> TypeDesc {
        match expr {
            Expression::IntLiteral(_) | Expression::FloatLiteral(_) => TypeDesc::Number,
            Expression::StringLiteral(_) | Expression::TemplateLiteral(_) => TypeDesc::String,
            Expression::RegexLiteral(_) => TypeDesc::Pattern,
            Expression::BooleanLiteral(_) => TypeDesc::Boolean,
            Expression::NullLiteral(_) => TypeDesc::Any,
            Expression::Identifier(id) => {
                let name = self.text(id.name);
                self.identifier_type(&name)
            }
            Expression::Array(array) => self.array_type(array),
            Expression::Object(_) => TypeDesc::Map,
            Expression::Unary(unary) => match unary.operator {
                UnaryOperator::Not => TypeDesc::Boolean,
                _ => TypeDesc::Number,
            },
            Expression::Binary(binary) => self.binary_type(binary),
            Expression::Assignment(assign) => self.type_of(&assign.right),
            Expression::Logical(logical) => {
                let left = self.type_of(&logical.left);
                let right = self.type_of(&logical.right);
                match logical.operator {
                    LogicalOperator::NullishCoalescing => optional::coalesce_type(&left, &right),
                    _ if left.is_boolean() && right.is_boolean() => TypeDesc::Boolean,
                    _ => TypeDesc::common(&left, &right),
                }
            }
            Expression::Conditional(cond) => {
                match (self.is_null(&cond.consequent), self.is_null(&cond.alternate)) {
                    (true, false) => TypeDesc::nilable(self.type_of(&cond.alternate)),
                    (false, true) => TypeDesc::nilable(self.type_of(&cond.consequent)),
                    _ => {
                        let a = self.type_of(&cond.consequent);
                        let b = self.type_of(&cond.alternate);
                        TypeDesc::common(&a, &b)
                    }
                }
            }
            Expression::Call(call) => {
                let ty = self.call_type(call);
                if has_optional_link(expr) {
                    TypeDesc::nilable(ty)
                } else {
                    ty
                }
            }
            Expression::Member(member) => {
                let property = self.text(member.property.name);
                let ty = self.member_type(&member.object, &property);
                if has_optional_link(expr) {
                    TypeDesc::nilable(ty)
                } else {
                    ty
                }
            }
            Expression::Index(index) => {
                let object = self.type_of(&index.object);
                let ty = match object.unwrap_nilable() {
                    TypeDesc::Slice(elem) => (**elem).clone(),
                    TypeDesc::String => TypeDesc::String,
                    _ => TypeDesc::Any,
                };
                if has_optional_link(expr) {
                    TypeDesc::nilable(ty)
                } else {
                    ty
                }
            }
            Expression::New(new) => self.new_type(new),
            Expression::Arrow(arrow) => self
                .function_signature(
                    &arrow.params,
                    arrow.return_type.as_ref(),
                    arrow.is_async,
                    FnBody::of_arrow(&arrow.body),
                    &[],
                    None,
                )
                .map(TypeDesc::function)
                .unwrap_or(TypeDesc::Any),
            Expression::Function(func) => self
                .function_signature(
                    &func.params,
                    func.return_type.as_ref(),
                    func.is_async,
                    FnBody::Block(&func.body),
                    func.type_params.as_deref().unwrap_or(&[]),
                    None,
                )
                .map(TypeDesc::function)
                .unwrap_or(TypeDesc::Any),
            Expression::Await(await_expr) => match self.type_of(&await_expr.argument) {
                TypeDesc::Queue(payload) => *payload,
                other => other,
            },
            Expression::Typeof(_) => TypeDesc::String,
            Expression::Void(_) => TypeDesc::Any,
            Expression::Delete(_) | Expression::InstanceOf(_) | Expression::In(_) => TypeDesc::Boolean,
            Expression::Parenthesized(inner) => self.type_of(&inner.expression),
            Expression::This(_) => self.this_type(),
            Expression::Super(_) => self.super_type(),
            Expression::TypeCast(cast) => self
                .resolve_type(&cast.target_type)
                .unwrap_or(TypeDesc::Any),
            Expression::NonNull(inner) => self.type_of(&inner.expression).unwrap_nilable().clone(),
        }
    }

    fn identifier_type(&self, name: &str) -> TypeDesc {
        if let Some(ty) = self.env.lookup(name) {
            return ty.clone();
        }
        if let Some(sig) = self.env.functions.get(name) {
            return TypeDesc::function(sig.clone());
        }
        match name {
            "NaN" | "Infinity" => TypeDesc::Number,
            _ => TypeDesc::Any,
        }
    }

    fn array_type(&mut self, array: &ArrayExpression) -> TypeDesc {
        let mut element: Option<TypeDesc> = None;
        for item in &array.elements {
            let ty = match item {
                ArrayElement::Expression(e) => self.type_of(e),
                ArrayElement::Spread(e) => match self.type_of(e) {
                    TypeDesc::Slice(elem) => *elem,
                    _ => TypeDesc::Any,
                },
            };
            element = Some(match element {
                None => ty,
                Some(prev) if prev == ty => prev,
                Some(_) => return TypeDesc::slice(TypeDesc::Any),
            });
        }
        TypeDesc::slice(element.unwrap_or(TypeDesc::Any))
    }

    fn binary_type(&mut self, binary: &BinaryExpression) -> TypeDesc {
        if binary.operator.is_comparison() {
            return TypeDesc::Boolean;
        }
        if binary.operator != BinaryOperator::Add {
            return TypeDesc::Number;
        }
        let left = self.type_of(&binary.left);
        let right = self.type_of(&binary.right);
        let numeric = |ty: &TypeDesc| matches!(ty.unwrap_nilable(), TypeDesc::Number | TypeDesc::Enum(_));
        if left.is_string() || right.is_string() {
            TypeDesc::String
        } else if numeric(&left) && numeric(&right) {
            TypeDesc::Number
        } else if left.is_any() || right.is_any() {
            TypeDesc::Any
        } else {
            TypeDesc::Number
        }
    }

    pub(crate) fn this_type(&self) -> TypeDesc {
        self.classes
            .last()
            .and_then(|class| self.env.classes.get(class))
            .map(ClassInfo::self_type)
            .unwrap_or(TypeDesc::Any)
    }

    pub(crate) fn super_type(&self) -> TypeDesc {
        let Some(info) = self.classes.last().and_then(|class| self.env.classes.get(class)) else {
            return TypeDesc::Any;
        };
        match &info.parent {
            Some(parent) => TypeDesc::Class {
                name: parent.clone(),
                args: info.parent_args.clone(),
            },
            None => TypeDesc::Any,
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Identifier naming a type rather than a value: an enum, a class used
    /// for static access, or a builtin namespace
    pub(crate) fn static_receiver(&self, object: &Expression) -> Option<String> {
        match object.unwrapped() {
            Expression::Identifier(id) => {
                let name = self.interner.resolve(id.name);
                (self.env.lookup(name).is_none()).then(|| name.to_string())
            }
            _ => None,
        }
    }

    pub(crate) fn member_type(&mut self, object: &Expression, property: &str) -> TypeDesc {
        if let Some(name) = self.static_receiver(object) {
            if self.env.enums.get(&name).is_some_and(|info| info.has_member(property)) {
                return TypeDesc::Enum(name);
            }
            if name == "Math" && builtins::math_constant(property).is_some() {
                return TypeDesc::Number;
            }
            if name == "Number" && builtins::number_constant(property).is_some() {
                return TypeDesc::Number;
            }
            if let Some(info) = self.env.classes.get(&name) {
                if let Some(field) = info.static_field(property) {
                    return field.ty.clone();
                }
                if let Some(method) = info.static_method(property) {
                    return TypeDesc::function(method.sig.clone());
                }
            }
        }
        let object_ty = self.type_of(object);
        self.property_type(&object_ty, property)
    }

    /// Type of `value.property` for a value of type `ty`
    pub(crate) fn property_type(&self, ty: &TypeDesc, property: &str) -> TypeDesc {
        match ty {
            TypeDesc::Nilable(inner) => self.property_type(inner, property),
            TypeDesc::Slice(_) | TypeDesc::String | TypeDesc::Any if property == "length" => TypeDesc::Number,
            // Caught values and `new Error(...)` print as their message
            TypeDesc::Any if property == "message" => TypeDesc::String,
            TypeDesc::Class { name, .. } => {
                let bindings = self.env.class_bindings(ty);
                if let Some(prop) = self.env.find_property(name, property) {
                    return prop.ty.substitute(&bindings);
                }
                match self.env.find_method(name, property) {
                    Some(method) if self.is_accessor(name, property, false) => method.sig.ret.substitute(&bindings),
                    Some(method) => TypeDesc::function(method.sig.clone()).substitute(&bindings),
                    None => TypeDesc::Any,
                }
            }
            TypeDesc::Struct(name) => self
                .env
                .find_interface_property(name, property)
                .map(|p| p.ty.clone())
                .unwrap_or(TypeDesc::Any),
            TypeDesc::Interface(name) => self
                .env
                .find_interface_method(name, property)
                .map(|m| TypeDesc::function(m.sig.clone()))
                .unwrap_or(TypeDesc::Any),
            _ => TypeDesc::Any,
        }
    }

    /// True when `property` is a getter (or, with `setter`, a setter) on
    /// `class` or one of its ancestors
    pub(crate) fn is_accessor(&self, class: &str, property: &str, setter: bool) -> bool {
        let mut current = self.env.classes.get(class);
        let mut depth = 0;
        while let Some(info) = current {
            let names = if setter { &info.setters } else { &info.getters };
            if names.iter().any(|n| n == property) {
                return true;
            }
            depth += 1;
            if depth > 64 {
                break;
            }
            current = info.parent.as_ref().and_then(|p| self.env.classes.get(p));
        }
        false
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn call_type(&mut self, call: &CallExpression) -> TypeDesc {
        match call.callee.unwrapped() {
            Expression::Identifier(id) => {
                let name = self.text(id.name);
                if let Some(ty) = self.env.lookup(&name).cloned() {
                    return ty.signature().map(|s| s.ret.clone()).unwrap_or(TypeDesc::Any);
                }
                if let Some(sig) = self.env.functions.get(&name).cloned() {
                    let (sig, _) = self.instantiate(&sig, call.type_args.as_deref(), &call.arguments);
                    return sig.ret;
                }
                match name.as_str() {
                    "parseInt" | "parseFloat" | "Number" => TypeDesc::Number,
                    "String" => TypeDesc::String,
                    "Boolean" | "isNaN" | "isFinite" => TypeDesc::Boolean,
                    _ => TypeDesc::Any,
                }
            }
            Expression::Member(member) => {
                let method = self.text(member.property.name);
                self.method_return(&member.object, &method, call)
            }
            Expression::Super(_) => TypeDesc::Void,
            other => match self.type_of(other) {
                TypeDesc::Function(sig) => sig.ret,
                _ => TypeDesc::Any,
            },
        }
    }

    fn method_return(&mut self, object: &Expression, method: &str, call: &CallExpression) -> TypeDesc {
        if let Some(name) = self.static_receiver(object) {
            match name.as_str() {
                "console" => return TypeDesc::Void,
                "Math" => return TypeDesc::Number,
                "Number" => {
                    return match method {
                        "isInteger" | "isFinite" | "isNaN" | "isSafeInteger" => TypeDesc::Boolean,
                        _ => TypeDesc::Number,
                    }
                }
                _ => {}
            }
            if let Some(info) = self.env.classes.get(&name) {
                if let Some(m) = info.static_method(method) {
                    return m.sig.ret.clone();
                }
            }
        }

        let receiver = self.type_of(object);
        match receiver.unwrap_nilable().clone() {
            TypeDesc::String => builtins::string_method_type(method).unwrap_or(TypeDesc::Any),
            TypeDesc::Number | TypeDesc::Boolean => match method {
                "valueOf" => receiver.unwrap_nilable().clone(),
                _ => TypeDesc::String,
            },
            TypeDesc::Pattern => match method {
                "test" => TypeDesc::Boolean,
                _ => TypeDesc::slice(TypeDesc::String),
            },
            TypeDesc::Slice(elem) => self.array_method_type(&elem, method, &call.arguments),
            TypeDesc::Queue(payload) => match method {
                "then" => TypeDesc::Void,
                _ => TypeDesc::queue(*payload),
            },
            other => match self.property_type(&other, method) {
                TypeDesc::Function(sig) => sig.ret,
                _ => TypeDesc::Any,
            },
        }
    }

    /// Result type of an array method
    pub(crate) fn array_method_type(&mut self, elem: &TypeDesc, method: &str, args: &[Argument]) -> TypeDesc {
        let first = args.first().map(Argument::expression);
        match method {
            "push" | "unshift" | "indexOf" | "lastIndexOf" | "findIndex" => TypeDesc::Number,
            "pop" | "shift" | "find" => elem.clone(),
            "includes" | "some" | "every" => TypeDesc::Boolean,
            "join" => TypeDesc::String,
            "forEach" => TypeDesc::Void,
            "filter" | "slice" | "concat" | "reverse" | "sort" => TypeDesc::slice(elem.clone()),
            "map" => match first {
                Some(callback) => TypeDesc::slice(self.callback_return(callback, &callback_hint(elem))),
                None => TypeDesc::slice(TypeDesc::Any),
            },
            "reduce" => self.reduce_type(elem, args),
            _ => TypeDesc::Any,
        }
    }

    /// Accumulator type of `reduce`: the seed's type when it is precise,
    /// otherwise the callback's result
    pub(crate) fn reduce_type(&mut self, elem: &TypeDesc, args: &[Argument]) -> TypeDesc {
        let seed = args.get(1).map(|a| self.type_of(a.expression()));
        match seed {
            Some(ty) if !matches!(&ty, TypeDesc::Any | TypeDesc::Map) && ty != TypeDesc::slice(TypeDesc::Any) => ty,
            seed => {
                let acc = seed.unwrap_or_else(|| elem.clone());
                let mut hint = callback_hint(elem);
                hint.params.insert(0, acc.clone());
                match args.first() {
                    Some(callback) => match self.callback_return(callback.expression(), &hint) {
                        TypeDesc::Any => acc,
                        ty => ty,
                    },
                    None => acc,
                }
            }
        }
    }

    /// Result type of a callback argument, typing unannotated parameters
    /// from `hint`
    pub(crate) fn callback_return(&mut self, callback: &Expression, hint: &FuncSig) -> TypeDesc {
        let sig = match callback.unwrapped() {
            Expression::Arrow(arrow) => self.function_signature(
                &arrow.params,
                arrow.return_type.as_ref(),
                arrow.is_async,
                FnBody::of_arrow(&arrow.body),
                &[],
                Some(hint),
            ),
            Expression::Function(func) => self.function_signature(
                &func.params,
                func.return_type.as_ref(),
                func.is_async,
                FnBody::Block(&func.body),
                &[],
                Some(hint),
            ),
            other => {
                return self
                    .type_of(other)
                    .signature()
                    .map(|s| s.ret.clone())
                    .unwrap_or(TypeDesc::Any)
            }
        };
        sig.map(|s| s.ret).unwrap_or(TypeDesc::Any)
    }

    /// Bind the generic parameters of `sig` from explicit type arguments
    /// or, failing that, from the argument types. Returns the substituted
    /// signature and the binding of each parameter in order.
    pub(crate) fn instantiate(
        &mut self,
        sig: &FuncSig,
        type_args: Option<&[TypeAnnotation]>,
        args: &[Argument],
    ) -> (FuncSig, Vec<TypeDesc>) {
        if sig.type_params.is_empty() {
            return (sig.clone(), Vec::new());
        }
        let mut bindings = FxHashMap::default();
        match type_args {
            Some(explicit) => {
                for (name, annotation) in sig.type_params.iter().zip(explicit) {
                    let ty = self.resolve_type(annotation).unwrap_or(TypeDesc::Any);
                    bindings.insert(name.clone(), ty);
                }
            }
            None => {
                for (i, arg) in args.iter().enumerate() {
                    if let Argument::Expression(expr) = arg {
                        let actual = self.type_of(expr);
                        sig.param_type(i).unify(&actual, &mut bindings);
                    }
                }
            }
        }
        let bound: Vec<TypeDesc> = sig
            .type_params
            .iter()
            .map(|name| bindings.entry(name.clone()).or_insert(TypeDesc::Any).clone())
            .collect();
        let substituted = match TypeDesc::function(sig.clone()).substitute(&bindings) {
            TypeDesc::Function(mut s) => {
                s.type_params.clear();
                *s
            }
            _ => sig.clone(),
        };
        (substituted, bound)
    }

    pub(crate) fn new_type(&mut self, new: &NewExpression) -> TypeDesc {
        let Expression::Identifier(id) = new.callee.unwrapped() else {
            return TypeDesc::Any;
        };
        let name = self.text(id.name);
        if let Some(info) = self.env.classes.get(&name) {
            if info.type_params.is_empty() {
                return TypeDesc::class(name);
            }
            let mut sig = self.constructor_sig(&name);
            sig.type_params = info.type_params.clone();
            let (_, args) = self.instantiate(&sig, new.type_args.as_deref(), &new.arguments);
            return TypeDesc::Class { name, args };
        }
        match name.as_str() {
            "Promise" => TypeDesc::queue(self.promise_payload(new, None)),
            "RegExp" => TypeDesc::Pattern,
            "Array" => TypeDesc::slice(TypeDesc::Any),
            _ => TypeDesc::Any,
        }
    }

    // ========================================================================
    // Function results
    // ========================================================================

    /// Result type of an unannotated body with `params` in scope
    pub(crate) fn infer_return(&mut self, params: &[(String, TypeDesc)], body: FnBody<'_>) -> TypeDesc {
        self.env.push_scope();
        for (name, ty) in params {
            self.env.declare(name.clone(), ty.clone());
        }
        let ty = match body {
            FnBody::Block(block) => {
                let mut returns = Returns::default();
                self.collect_returns(&block.statements, &mut returns);
                returns.finish()
            }
            FnBody::Expression(expr) => self.type_of(expr),
            FnBody::None => TypeDesc::Void,
        };
        self.env.pop_scope();
        ty
    }

    fn collect_returns(&mut self, statements: &[Statement], returns: &mut Returns) {
        for stmt in statements {
            self.collect_returns_in(stmt, returns);
        }
    }

    fn collect_returns_in(&mut self, stmt: &Statement, returns: &mut Returns) {
        match stmt {
            Statement::VariableDecl(decl) => self.declare_inferred(decl),
            Statement::Return(ret) => match &ret.value {
                Some(value) if self.is_null(value) => returns.saw_null = true,
                Some(value) => {
                    let ty = self.type_of(value);
                    returns.types.push(ty);
                }
                None => {}
            },
            Statement::If(stmt) => {
                self.scoped_returns(std::slice::from_ref(&*stmt.then_branch), returns);
                if let Some(alt) = &stmt.else_branch {
                    self.scoped_returns(std::slice::from_ref(&**alt), returns);
                }
            }
            Statement::Block(block) => self.scoped_returns(&block.statements, returns),
            Statement::While(stmt) => self.scoped_returns(std::slice::from_ref(&*stmt.body), returns),
            Statement::DoWhile(stmt) => self.scoped_returns(std::slice::from_ref(&*stmt.body), returns),
            Statement::For(stmt) => {
                self.env.push_scope();
                if let Some(ForInit::VariableDecl(decl)) = &stmt.init {
                    self.declare_inferred(decl);
                }
                self.collect_returns_in(&stmt.body, returns);
                self.env.pop_scope();
            }
            Statement::ForOf(stmt) => {
                self.env.push_scope();
                let elem = match self.type_of(&stmt.right) {
                    TypeDesc::Slice(elem) => *elem,
                    TypeDesc::String => TypeDesc::String,
                    _ => TypeDesc::Any,
                };
                let name = self.text(stmt.binding.name);
                self.env.declare(name, elem);
                self.collect_returns_in(&stmt.body, returns);
                self.env.pop_scope();
            }
            Statement::Switch(stmt) => {
                for case in &stmt.cases {
                    self.scoped_returns(&case.consequent, returns);
                }
            }
            Statement::Try(stmt) => {
                self.scoped_returns(&stmt.body.statements, returns);
                if let Some(catch) = &stmt.catch_clause {
                    self.env.push_scope();
                    if let Some(param) = &catch.param {
                        let name = self.text(param.name);
                        self.env.declare(name, TypeDesc::Any);
                    }
                    self.collect_returns(&catch.body.statements, returns);
                    self.env.pop_scope();
                }
                if let Some(finally) = &stmt.finally_clause {
                    self.scoped_returns(&finally.statements, returns);
                }
            }
            Statement::FunctionDecl(func) => {
                if let Ok(sig) = self.function_signature(
                    &func.params,
                    func.return_type.as_ref(),
                    func.is_async,
                    FnBody::Block(&func.body),
                    &[],
                    None,
                ) {
                    let name = self.text(func.name.name);
                    self.env.declare(name, TypeDesc::function(sig));
                }
            }
            _ => {}
        }
    }

    fn scoped_returns(&mut self, statements: &[Statement], returns: &mut Returns) {
        self.env.push_scope();
        self.collect_returns(statements, returns);
        self.env.pop_scope();
    }

    /// Declare the variables of `decl` with their inferred types
    pub(crate) fn declare_inferred(&mut self, decl: &VariableDecl) {
        for declarator in &decl.declarations {
            let ty = match self.resolve_opt(declarator.type_annotation.as_ref()) {
                Ok(Some(ty)) => ty,
                _ => match &declarator.initializer {
                    Some(init) => self.type_of(init),
                    None => TypeDesc::Any,
                },
            };
            let name = self.text(declarator.name.name);
            self.env.declare(name, ty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranspileOptions;
    use crate::parser::Parser;
    use crate::transpiler::hoist;

    /// Type of the last expression statement after registering declarations
    fn type_of_last(source: &str) -> TypeDesc {
        let (module, interner) = Parser::new(source).unwrap().parse().unwrap();
        let mut lowerer = Lowerer::new(interner, TranspileOptions::default());
        let (decls, exec) = hoist::split(&module.statements);
        lowerer.register_declarations(&decls).unwrap();
        for stmt in &exec {
            if let Statement::VariableDecl(decl) = stmt {
                lowerer.declare_inferred(decl);
            }
        }
        match exec.last() {
            Some(Statement::Expression(stmt)) => lowerer.type_of(&stmt.expression),
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    // ========================================================================
    // Operators and literals
    // ========================================================================

    #[test]
    fn test_addition_with_string_is_string() {
        assert_eq!(type_of_last("\"a\" + 1;"), TypeDesc::String);
        assert_eq!(type_of_last("1 + 2;"), TypeDesc::Number);
        assert_eq!(type_of_last("1 < 2;"), TypeDesc::Boolean);
    }

    #[test]
    fn test_array_literal_element_type() {
        assert_eq!(type_of_last("[1, 2];"), TypeDesc::slice(TypeDesc::Number));
        assert_eq!(type_of_last("[1, \"a\"];"), TypeDesc::slice(TypeDesc::Any));
    }

    #[test]
    fn test_conditional_with_null_branch_is_nilable() {
        assert_eq!(
            type_of_last("let flag = true;\nflag ? \"yes\" : null;"),
            TypeDesc::nilable(TypeDesc::String)
        );
    }

    // ========================================================================
    // Calls and members
    // ========================================================================

    #[test]
    fn test_map_callback_result() {
        assert_eq!(
            type_of_last("[1, 2, 3].map(x => x + \"!\");"),
            TypeDesc::slice(TypeDesc::String)
        );
        assert_eq!(
            type_of_last("[1, 2, 3].reduce((acc, x) => acc + x, 0);"),
            TypeDesc::Number
        );
    }

    #[test]
    fn test_generic_function_instantiation() {
        let source = "function identity<T>(value: T): T { return value; }\nidentity<string>(\"x\");";
        assert_eq!(type_of_last(source), TypeDesc::String);
        let source = "function identity<T>(value: T): T { return value; }\nidentity(42);";
        assert_eq!(type_of_last(source), TypeDesc::Number);
    }

    #[test]
    fn test_generic_class_property() {
        let source = "class Box<T> { constructor(public value: T) {} }\nnew Box(1).value;";
        assert_eq!(type_of_last(source), TypeDesc::Number);
    }

    #[test]
    fn test_enum_member_and_length() {
        assert_eq!(
            type_of_last("enum Color { Red, Green }\nColor.Red;"),
            TypeDesc::Enum("Color".to_string())
        );
        assert_eq!(type_of_last("\"abc\".length;"), TypeDesc::Number);
    }

    // ========================================================================
    // Function results
    // ========================================================================

    #[test]
    fn test_null_return_makes_result_nilable() {
        let (module, interner) = Parser::new(
            "function find(n: number) { if (n > 0) { return null; } return n; }",
        )
        .unwrap()
        .parse()
        .unwrap();
        let mut lowerer = Lowerer::new(interner, TranspileOptions::default());
        let (decls, _) = hoist::split(&module.statements);
        lowerer.register_declarations(&decls).unwrap();
        assert_eq!(lowerer.env.functions["find"].ret, TypeDesc::nilable(TypeDesc::Number));
    }

    #[test]
    fn test_body_without_return_is_void() {
        let (module, interner) = Parser::new("function log(n: number) { console.log(n); }")
            .unwrap()
            .parse()
            .unwrap();
        let mut lowerer = Lowerer::new(interner, TranspileOptions::default());
        let (decls, _) = hoist::split(&module.statements);
        lowerer.register_declarations(&decls).unwrap();
        assert_eq!(lowerer.env.functions["log"].ret, TypeDesc::Void);
    }
}
