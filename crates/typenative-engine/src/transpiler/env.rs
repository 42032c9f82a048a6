//! Symbol and type environment
//!
//! Holds everything the lowering rules learn about a program during one
//! run: variable bindings (a scope stack), class, interface, enum and alias
//! descriptors, function signatures and the rename table for identifiers
//! that collide with Go names.

use super::error::{TranspileError, TranspileResult};
use super::types::{FuncSig, TypeDesc};
use crate::parser::ast::{PrimitiveType, Type, TypeAnnotation, TypeReference};
use crate::parser::{Interner, Span};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

/// Go keywords, predeclared identifiers and the package names emitted code
/// may import. User identifiers spelled like these get renamed.
static GO_RESERVED: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        // keywords
        "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough", "for",
        "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return", "select",
        "struct", "switch", "type", "var",
        // predeclared
        "any", "append", "bool", "byte", "cap", "clear", "close", "comparable", "complex", "complex64",
        "complex128", "copy", "error", "false", "float32", "float64", "imag", "int", "int8", "int16",
        "int32", "int64", "iota", "len", "make", "max", "min", "new", "nil", "panic", "print", "println",
        "real", "recover", "rune", "string", "true", "uint", "uint8", "uint16", "uint32", "uint64",
        "uintptr",
        // packages
        "errors", "fmt", "math", "os", "rand", "regexp", "strconv", "strings", "time",
        // entry points
        "main", "init",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    pub ty: TypeDesc,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub sig: FuncSig,
}

/// Class descriptor. Member types are filled in by the hoisting pre-pass.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub name: String,
    pub parent: Option<String>,
    /// Parent type arguments as written in `extends Base<T>`
    pub parent_args: Vec<TypeDesc>,
    pub type_params: Vec<String>,
    /// Go constraint of each type parameter
    pub constraints: Vec<String>,
    pub properties: Vec<PropertyInfo>,
    pub methods: Vec<MethodInfo>,
    pub static_fields: Vec<PropertyInfo>,
    pub static_methods: Vec<MethodInfo>,
    pub constructor: Option<FuncSig>,
    /// Accessor names, lowered to methods
    pub getters: Vec<String>,
    pub setters: Vec<String>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn static_field(&self, name: &str) -> Option<&PropertyInfo> {
        self.static_fields.iter().find(|p| p.name == name)
    }

    pub fn static_method(&self, name: &str) -> Option<&MethodInfo> {
        self.static_methods.iter().find(|m| m.name == name)
    }

    /// `[T any, U Shape]`, or empty for non-generic classes
    pub fn type_param_list(&self) -> String {
        generic_list(&self.type_params, &self.constraints)
    }

    /// `[T, U]`, or empty for non-generic classes
    pub fn type_arg_list(&self) -> String {
        if self.type_params.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.type_params.join(", "))
        }
    }

    /// Instance type with its own parameters as arguments
    pub fn self_type(&self) -> TypeDesc {
        TypeDesc::Class {
            name: self.name.clone(),
            args: self.type_params.iter().cloned().map(TypeDesc::TypeParam).collect(),
        }
    }
}

/// An interface lowers to a behavioural contract when it declares methods
/// and to an aggregate struct when it only declares properties.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceShape {
    Contract(Vec<MethodInfo>),
    Aggregate(Vec<PropertyInfo>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceInfo {
    pub name: String,
    pub extends: Vec<String>,
    pub shape: InterfaceShape,
}

impl InterfaceInfo {
    pub fn is_contract(&self) -> bool {
        matches!(self.shape, InterfaceShape::Contract(_))
    }

    pub fn type_desc(&self) -> TypeDesc {
        if self.is_contract() {
            TypeDesc::Interface(self.name.clone())
        } else {
            TypeDesc::Struct(self.name.clone())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBase {
    Number,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Number(f64),
    String(String),
    /// Initializer that is not a literal; lowered from source at emission
    Computed,
    /// Auto-incremented from the last computed member
    Offset { from: String, by: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    pub name: String,
    pub base: EnumBase,
    pub members: Vec<(String, EnumValue)>,
}

impl EnumInfo {
    /// Go constant name of a member
    pub fn member_const(&self, member: &str) -> String {
        format!("{}{}", self.name, capitalize(&sanitize(member)))
    }

    pub fn has_member(&self, member: &str) -> bool {
        self.members.iter().any(|(name, _)| name == member)
    }

    /// Go `const` blocks only accept constant initializers
    pub fn is_constant(&self) -> bool {
        !self
            .members
            .iter()
            .any(|(_, v)| matches!(v, EnumValue::Computed | EnumValue::Offset { .. }))
    }
}

/// Go type parameter list, `[T any, K comparable]`
pub fn generic_list(names: &[String], constraints: &[String]) -> String {
    if names.is_empty() {
        return String::new();
    }
    let params: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{} {}", name, constraints.get(i).map(String::as_str).unwrap_or("any")))
        .collect();
    format!("[{}]", params.join(", "))
}

/// Replace characters that cannot appear in a Go identifier
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Per-run tables
#[derive(Debug, Default)]
pub struct Env {
    scopes: Vec<FxHashMap<String, TypeDesc>>,
    type_params: Vec<Vec<String>>,
    pub classes: FxHashMap<String, ClassInfo>,
    pub interfaces: FxHashMap<String, InterfaceInfo>,
    pub enums: FxHashMap<String, EnumInfo>,
    pub aliases: FxHashMap<String, TypeAnnotation>,
    pub functions: FxHashMap<String, FuncSig>,
    renames: FxHashMap<String, String>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
            ..Default::default()
        }
    }

    // ========================================================================
    // Variable scopes
    // ========================================================================

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: TypeDesc) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), ty);
        }
    }

    /// Innermost binding of `name`
    pub fn lookup(&self, name: &str) -> Option<&TypeDesc> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// True when `name` is bound in the outermost (module) scope only
    pub fn is_global(&self, name: &str) -> bool {
        !self.scopes.iter().skip(1).any(|scope| scope.contains_key(name))
            && self.scopes.first().is_some_and(|scope| scope.contains_key(name))
    }

    // ========================================================================
    // Generic parameters
    // ========================================================================

    pub fn push_type_params(&mut self, names: Vec<String>) {
        self.type_params.push(names);
    }

    pub fn pop_type_params(&mut self) {
        self.type_params.pop();
    }

    pub fn is_type_param(&self, name: &str) -> bool {
        self.type_params.iter().any(|scope| scope.iter().any(|n| n == name))
    }

    // ========================================================================
    // Renames
    // ========================================================================

    /// Go spelling of a source identifier. Names that collide with Go
    /// reserved words get a trailing underscore; the choice is memoized.
    pub fn go_name(&mut self, name: &str) -> String {
        if let Some(renamed) = self.renames.get(name) {
            return renamed.clone();
        }
        if !GO_RESERVED.contains(name) {
            return name.to_string();
        }
        let renamed = format!("{}_", name);
        tracing::trace!(from = name, to = %renamed, "renamed identifier");
        self.renames.insert(name.to_string(), renamed.clone());
        renamed
    }

    pub fn is_reserved(name: &str) -> bool {
        GO_RESERVED.contains(name)
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Find a property on a class or its ancestors
    pub fn find_property(&self, class: &str, name: &str) -> Option<&PropertyInfo> {
        let mut current = self.classes.get(class);
        let mut guard = 0;
        while let Some(info) = current {
            if let Some(prop) = info.property(name) {
                return Some(prop);
            }
            guard += 1;
            if guard > 64 {
                return None;
            }
            current = info.parent.as_ref().and_then(|p| self.classes.get(p));
        }
        None
    }

    /// Find a method on a class or its ancestors
    pub fn find_method(&self, class: &str, name: &str) -> Option<&MethodInfo> {
        let mut current = self.classes.get(class);
        let mut guard = 0;
        while let Some(info) = current {
            if let Some(method) = info.method(name) {
                return Some(method);
            }
            guard += 1;
            if guard > 64 {
                return None;
            }
            current = info.parent.as_ref().and_then(|p| self.classes.get(p));
        }
        None
    }

    /// Generic bindings implied by a class instance type
    pub fn class_bindings(&self, ty: &TypeDesc) -> FxHashMap<String, TypeDesc> {
        let mut bindings = FxHashMap::default();
        if let TypeDesc::Class { name, args } = ty {
            if let Some(info) = self.classes.get(name) {
                for (param, arg) in info.type_params.iter().zip(args) {
                    bindings.insert(param.clone(), arg.clone());
                }
            }
        }
        bindings
    }

    /// Property type on an interface aggregate, including extended ones
    pub fn find_interface_property(&self, interface: &str, name: &str) -> Option<&PropertyInfo> {
        let info = self.interfaces.get(interface)?;
        if let InterfaceShape::Aggregate(props) = &info.shape {
            if let Some(prop) = props.iter().find(|p| p.name == name) {
                return Some(prop);
            }
        }
        info.extends
            .iter()
            .filter(|parent| parent.as_str() != interface)
            .find_map(|parent| self.find_interface_property(parent, name))
    }

    /// Method signature on an interface contract, including extended ones
    pub fn find_interface_method(&self, interface: &str, name: &str) -> Option<&MethodInfo> {
        let info = self.interfaces.get(interface)?;
        if let InterfaceShape::Contract(methods) = &info.shape {
            if let Some(method) = methods.iter().find(|m| m.name == name) {
                return Some(method);
            }
        }
        info.extends
            .iter()
            .filter(|parent| parent.as_str() != interface)
            .find_map(|parent| self.find_interface_method(parent, name))
    }

    // ========================================================================
    // Type annotations
    // ========================================================================

    /// Resolve a type annotation to a descriptor
    pub fn resolve(&self, annotation: &TypeAnnotation, interner: &Interner) -> TranspileResult<TypeDesc> {
        let mut visiting = Vec::new();
        self.resolve_type(&annotation.ty, annotation.span, interner, &mut visiting)
    }

    /// Resolve an optional annotation, `Any` when absent
    pub fn resolve_or_any(
        &self,
        annotation: Option<&TypeAnnotation>,
        interner: &Interner,
    ) -> TranspileResult<TypeDesc> {
        match annotation {
            Some(annotation) => self.resolve(annotation, interner),
            None => Ok(TypeDesc::Any),
        }
    }

    fn resolve_type(
        &self,
        ty: &Type,
        span: Span,
        interner: &Interner,
        visiting: &mut Vec<String>,
    ) -> TranspileResult<TypeDesc> {
        Ok(match ty {
            Type::Primitive(primitive) => match primitive {
                PrimitiveType::Number => TypeDesc::Number,
                PrimitiveType::String => TypeDesc::String,
                PrimitiveType::Boolean => TypeDesc::Boolean,
                PrimitiveType::Void | PrimitiveType::Undefined | PrimitiveType::Never => TypeDesc::Void,
                PrimitiveType::Null | PrimitiveType::Any | PrimitiveType::Unknown | PrimitiveType::Object => {
                    TypeDesc::Any
                }
            },
            Type::Reference(reference) => self.resolve_reference(reference, span, interner, visiting)?,
            Type::Union(union) => {
                let mut nullable = false;
                let mut members = Vec::new();
                for member in &union.types {
                    match &member.ty {
                        Type::Primitive(p) if p.is_nullish() => nullable = true,
                        other => members.push(self.resolve_type(other, member.span, interner, visiting)?),
                    }
                }
                let base = match members.split_first() {
                    None => TypeDesc::Any,
                    Some((first, rest)) => {
                        if rest.iter().all(|m| m == first) {
                            first.clone()
                        } else {
                            TypeDesc::Any
                        }
                    }
                };
                if nullable {
                    TypeDesc::nilable(base)
                } else {
                    base
                }
            }
            Type::Function(function) => {
                let mut params = Vec::new();
                let mut required = None;
                for (i, param) in function.params.iter().enumerate() {
                    if param.optional && required.is_none() {
                        required = Some(i);
                    }
                    params.push(self.resolve_type(&param.ty.ty, param.ty.span, interner, visiting)?);
                }
                let ret = self.resolve_type(
                    &function.return_type.ty,
                    function.return_type.span,
                    interner,
                    visiting,
                )?;
                let required = required.unwrap_or(params.len());
                TypeDesc::function(FuncSig {
                    params,
                    required,
                    rest: None,
                    ret,
                    type_params: Vec::new(),
                })
            }
            Type::Array(array) => TypeDesc::slice(self.resolve_type(
                &array.element_type.ty,
                array.element_type.span,
                interner,
                visiting,
            )?),
            Type::Tuple(tuple) => {
                let mut elem: Option<TypeDesc> = None;
                for element in &tuple.element_types {
                    let resolved = self.resolve_type(&element.ty, element.span, interner, visiting)?;
                    elem = Some(match elem {
                        None => resolved,
                        Some(prev) if prev == resolved => prev,
                        Some(_) => TypeDesc::Any,
                    });
                }
                TypeDesc::slice(elem.unwrap_or(TypeDesc::Any))
            }
            Type::Object(_) => TypeDesc::Map,
            Type::StringLiteral(_) => TypeDesc::String,
            Type::NumberLiteral(_) => TypeDesc::Number,
            Type::BooleanLiteral(_) => TypeDesc::Boolean,
            Type::Parenthesized(inner) => self.resolve_type(&inner.ty, inner.span, interner, visiting)?,
        })
    }

    fn resolve_reference(
        &self,
        reference: &TypeReference,
        span: Span,
        interner: &Interner,
        visiting: &mut Vec<String>,
    ) -> TranspileResult<TypeDesc> {
        let name = interner.resolve(reference.name.name);
        let mut args = Vec::new();
        for arg in reference.type_args.iter().flatten() {
            args.push(self.resolve_type(&arg.ty, arg.span, interner, visiting)?);
        }
        let first_arg = || args.first().cloned().unwrap_or(TypeDesc::Any);

        if self.is_type_param(name) {
            return Ok(TypeDesc::TypeParam(name.to_string()));
        }
        Ok(match name {
            "Array" | "ReadonlyArray" => TypeDesc::slice(first_arg()),
            "Promise" => TypeDesc::queue(first_arg()),
            "RegExp" => TypeDesc::Pattern,
            "Record" | "Map" | "Object" => TypeDesc::Map,
            _ => {
                if self.classes.contains_key(name) {
                    TypeDesc::Class {
                        name: name.to_string(),
                        args,
                    }
                } else if let Some(interface) = self.interfaces.get(name) {
                    interface.type_desc()
                } else if self.enums.contains_key(name) {
                    TypeDesc::Enum(name.to_string())
                } else if let Some(alias) = self.aliases.get(name) {
                    if visiting.iter().any(|v| v == name) {
                        let mut chain = visiting.clone();
                        chain.push(name.to_string());
                        return Err(TranspileError::CyclicTypeAlias {
                            name: name.to_string(),
                            chain,
                            span,
                        });
                    }
                    visiting.push(name.to_string());
                    let resolved = self.resolve_type(&alias.ty, alias.span, interner, visiting);
                    visiting.pop();
                    resolved?
                } else {
                    tracing::debug!(name, "unknown type reference, using interface{{}}");
                    TypeDesc::Any
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Statement;
    use crate::parser::Parser;

    fn alias_env(source: &str) -> (Env, Interner, Vec<Statement>) {
        let (module, interner) = Parser::new(source).unwrap().parse().unwrap();
        let mut env = Env::new();
        for stmt in &module.statements {
            if let Statement::TypeAliasDecl(alias) = stmt {
                env.aliases
                    .insert(interner.resolve(alias.name.name).to_string(), alias.type_annotation.clone());
            }
        }
        (env, interner, module.statements)
    }

    fn annotation_of(stmt: &Statement) -> &TypeAnnotation {
        match stmt {
            Statement::VariableDecl(decl) => decl.declarations[0].type_annotation.as_ref().unwrap(),
            other => panic!("expected variable declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_scopes_shadow_and_pop() {
        let mut env = Env::new();
        env.declare("x", TypeDesc::Number);
        env.push_scope();
        env.declare("x", TypeDesc::String);
        assert_eq!(env.lookup("x"), Some(&TypeDesc::String));
        assert!(!env.is_global("x"));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(&TypeDesc::Number));
        assert!(env.is_global("x"));
    }

    #[test]
    fn test_reserved_names_are_renamed_once() {
        let mut env = Env::new();
        assert_eq!(env.go_name("type"), "type_");
        assert_eq!(env.go_name("len"), "len_");
        assert_eq!(env.go_name("fmt"), "fmt_");
        assert_eq!(env.go_name("type"), "type_");
        assert_eq!(env.go_name("value"), "value");
    }

    #[test]
    fn test_resolve_alias_chain() {
        let (env, interner, stmts) =
            alias_env("type UserId = number;\ntype Label = UserId;\nlet l: Label;\nlet m: string | null;");
        assert_eq!(env.resolve(annotation_of(&stmts[2]), &interner).unwrap(), TypeDesc::Number);
        assert_eq!(
            env.resolve(annotation_of(&stmts[3]), &interner).unwrap(),
            TypeDesc::nilable(TypeDesc::String)
        );
    }

    #[test]
    fn test_cyclic_alias_rejected() {
        let (env, interner, stmts) = alias_env("type A = B;\ntype B = A[];\nlet x: A;");
        let err = env.resolve(annotation_of(&stmts[2]), &interner).unwrap_err();
        match err {
            TranspileError::CyclicTypeAlias { name, chain, .. } => {
                assert_eq!(name, "A");
                assert_eq!(chain, vec!["A", "B", "A"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_resolve_builtin_references() {
        let (env, interner, stmts) =
            alias_env("let a: Array<string>;\nlet p: Promise<number>;\nlet r: RegExp;\nlet u: 'a' | 'b';");
        assert_eq!(
            env.resolve(annotation_of(&stmts[0]), &interner).unwrap(),
            TypeDesc::slice(TypeDesc::String)
        );
        assert_eq!(
            env.resolve(annotation_of(&stmts[1]), &interner).unwrap(),
            TypeDesc::queue(TypeDesc::Number)
        );
        assert_eq!(env.resolve(annotation_of(&stmts[2]), &interner).unwrap(), TypeDesc::Pattern);
        assert_eq!(env.resolve(annotation_of(&stmts[3]), &interner).unwrap(), TypeDesc::String);
    }

    #[test]
    fn test_inherited_lookup() {
        let mut env = Env::new();
        let mut base = ClassInfo::new("Base");
        base.properties.push(PropertyInfo {
            name: "id".to_string(),
            ty: TypeDesc::Number,
            optional: false,
        });
        let mut derived = ClassInfo::new("Derived");
        derived.parent = Some("Base".to_string());
        env.classes.insert("Base".to_string(), base);
        env.classes.insert("Derived".to_string(), derived);

        assert_eq!(env.find_property("Derived", "id").map(|p| &p.ty), Some(&TypeDesc::Number));
        assert!(env.find_property("Derived", "missing").is_none());
    }

    #[test]
    fn test_enum_member_const_names() {
        let info = EnumInfo {
            name: "Status".to_string(),
            base: EnumBase::Number,
            members: vec![("pending".to_string(), EnumValue::Number(0.0))],
        };
        assert_eq!(info.member_const("pending"), "StatusPending");
        assert_eq!(info.member_const("in-progress"), "StatusIn_progress");
        assert!(info.is_constant());
    }

    #[test]
    fn test_generic_parameter_lists() {
        let mut info = ClassInfo::new("Box");
        assert_eq!(info.type_param_list(), "");
        info.type_params = vec!["T".to_string(), "K".to_string()];
        info.constraints = vec!["any".to_string(), "comparable".to_string()];
        assert_eq!(info.type_param_list(), "[T any, K comparable]");
        assert_eq!(info.type_arg_list(), "[T, K]");
        assert_eq!(info.self_type().go_type(), "*Box[T, K]");
    }
}
