//! Type descriptors
//!
//! `TypeDesc` is the translator's view of a source type, expressed in terms
//! of what the Go side needs: the Go type spelling, its zero value and
//! whether it can hold `nil`.

use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    /// number → float64
    Number,
    /// string
    String,
    /// boolean → bool
    Boolean,
    /// `T | null` for value kinds → *T
    Nilable(Box<TypeDesc>),
    /// T[] → []T
    Slice(Box<TypeDesc>),
    /// Class instance → *Name[Args]
    Class { name: String, args: Vec<TypeDesc> },
    /// Promise<T> produced by an executor → chan T
    Queue(Box<TypeDesc>),
    /// any, unknown, or anything the translator cannot pin down
    Any,
    /// Interface with methods → Go interface
    Interface(String),
    /// Interface with only properties → Go struct value
    Struct(String),
    /// Enum backing type
    Enum(String),
    /// RegExp → *regexp.Regexp
    Pattern,
    /// Closure value
    Function(Box<FuncSig>),
    /// Generic parameter in scope
    TypeParam(String),
    /// Untyped object literal → map[string]interface{}
    Map,
    Void,
}

/// Signature of a function, method, constructor or closure.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncSig {
    pub params: Vec<TypeDesc>,
    /// Parameters before the first defaulted one. When smaller than
    /// `params.len()` the rest are passed through a `...interface{}` tail.
    pub required: usize,
    /// Element type of a `...rest` parameter
    pub rest: Option<TypeDesc>,
    pub ret: TypeDesc,
    /// Generic parameter names, in declaration order
    pub type_params: Vec<String>,
}

impl FuncSig {
    pub fn new(params: Vec<TypeDesc>, ret: TypeDesc) -> Self {
        let required = params.len();
        Self {
            params,
            required,
            rest: None,
            ret,
            type_params: Vec::new(),
        }
    }

    /// True when defaulted parameters collapse into a variadic tail
    pub fn has_default_tail(&self) -> bool {
        self.required < self.params.len()
    }

    /// Declared type of the parameter receiving argument `index`
    pub fn param_type(&self, index: usize) -> TypeDesc {
        match self.params.get(index) {
            Some(ty) => ty.clone(),
            None => self.rest.clone().unwrap_or(TypeDesc::Any),
        }
    }

    /// Go parameter list and result, `(float64, ...interface{}) string`.
    /// With `names`, parameters are spelled `name type`.
    pub fn go_signature(&self, names: Option<&[String]>) -> String {
        let mut parts = Vec::new();
        for (i, ty) in self.params.iter().take(self.required).enumerate() {
            match names.and_then(|n| n.get(i)) {
                Some(name) => parts.push(format!("{} {}", name, ty.go_type())),
                None => parts.push(ty.go_type()),
            }
        }
        if self.has_default_tail() {
            parts.push(match names {
                Some(_) => "args ...interface{}".to_string(),
                None => "...interface{}".to_string(),
            });
        } else if let Some(rest) = &self.rest {
            match names.and_then(|n| n.get(self.params.len())) {
                Some(name) => parts.push(format!("{} ...{}", name, rest.go_type())),
                None => parts.push(format!("...{}", rest.go_type())),
            }
        }

        let ret = self.ret.go_type();
        if ret.is_empty() {
            format!("({})", parts.join(", "))
        } else {
            format!("({}) {}", parts.join(", "), ret)
        }
    }
}

impl TypeDesc {
    pub fn slice(elem: TypeDesc) -> Self {
        TypeDesc::Slice(Box::new(elem))
    }

    pub fn queue(payload: TypeDesc) -> Self {
        TypeDesc::Queue(Box::new(payload))
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeDesc::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn function(sig: FuncSig) -> Self {
        TypeDesc::Function(Box::new(sig))
    }

    /// Make a type nil-capable. Kinds that already accept `nil` are
    /// returned unchanged, so `Nilable` only ever wraps a value kind.
    pub fn nilable(inner: TypeDesc) -> Self {
        if inner.is_value_kind() {
            TypeDesc::Nilable(Box::new(inner))
        } else {
            inner
        }
    }

    /// Kinds whose Go representation cannot hold `nil`
    pub fn is_value_kind(&self) -> bool {
        matches!(
            self,
            TypeDesc::Number | TypeDesc::String | TypeDesc::Boolean | TypeDesc::Enum(_) | TypeDesc::Struct(_)
        )
    }

    pub fn is_nil_capable(&self) -> bool {
        !self.is_value_kind() && !matches!(self, TypeDesc::TypeParam(_) | TypeDesc::Void)
    }

    pub fn is_nilable(&self) -> bool {
        matches!(self, TypeDesc::Nilable(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, TypeDesc::Number)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeDesc::String)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeDesc::Boolean)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeDesc::Any)
    }

    /// `*T` → `T`; everything else unchanged
    pub fn unwrap_nilable(&self) -> &TypeDesc {
        match self {
            TypeDesc::Nilable(inner) => inner,
            other => other,
        }
    }

    /// Element type of a slice
    pub fn element(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::Slice(elem) => Some(elem),
            _ => None,
        }
    }

    /// Class name without type arguments
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeDesc::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&FuncSig> {
        match self {
            TypeDesc::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Go spelling of the type. `Void` spells as the empty string.
    pub fn go_type(&self) -> String {
        match self {
            TypeDesc::Number => "float64".to_string(),
            TypeDesc::String => "string".to_string(),
            TypeDesc::Boolean => "bool".to_string(),
            TypeDesc::Nilable(inner) => format!("*{}", inner.go_type()),
            TypeDesc::Slice(elem) => format!("[]{}", elem.go_type()),
            TypeDesc::Class { name, args } => {
                if args.is_empty() {
                    format!("*{}", name)
                } else {
                    let args: Vec<String> = args.iter().map(TypeDesc::go_type).collect();
                    format!("*{}[{}]", name, args.join(", "))
                }
            }
            TypeDesc::Queue(payload) => format!("chan {}", payload.go_type()),
            TypeDesc::Any => "interface{}".to_string(),
            TypeDesc::Interface(name) | TypeDesc::Struct(name) | TypeDesc::Enum(name) => name.clone(),
            TypeDesc::Pattern => "*regexp.Regexp".to_string(),
            TypeDesc::Function(sig) => format!("func{}", sig.go_signature(None)),
            TypeDesc::TypeParam(name) => name.clone(),
            TypeDesc::Map => "map[string]interface{}".to_string(),
            TypeDesc::Void => String::new(),
        }
    }

    /// Go zero value, used for "not found" and nil-short-circuit results.
    pub fn zero_value(&self) -> String {
        match self {
            TypeDesc::Number => "0".to_string(),
            TypeDesc::String => "\"\"".to_string(),
            TypeDesc::Boolean => "false".to_string(),
            TypeDesc::Struct(name) => format!("{}{{}}", name),
            TypeDesc::Enum(_) | TypeDesc::TypeParam(_) => format!("*new({})", self.go_type()),
            TypeDesc::Void => String::new(),
            _ => "nil".to_string(),
        }
    }

    /// Result of `typeof` on a value of this type
    pub fn typeof_name(&self) -> &'static str {
        match self {
            TypeDesc::Number => "number",
            TypeDesc::String => "string",
            TypeDesc::Boolean => "boolean",
            TypeDesc::Function(_) => "function",
            TypeDesc::Void => "undefined",
            TypeDesc::Enum(_) => "number",
            _ => "object",
        }
    }

    /// Replace generic parameters by their bindings
    pub fn substitute(&self, bindings: &FxHashMap<String, TypeDesc>) -> TypeDesc {
        if bindings.is_empty() {
            return self.clone();
        }
        match self {
            TypeDesc::TypeParam(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeDesc::Nilable(inner) => TypeDesc::nilable(inner.substitute(bindings)),
            TypeDesc::Slice(elem) => TypeDesc::slice(elem.substitute(bindings)),
            TypeDesc::Queue(payload) => TypeDesc::queue(payload.substitute(bindings)),
            TypeDesc::Class { name, args } => TypeDesc::Class {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeDesc::Function(sig) => TypeDesc::function(FuncSig {
                params: sig.params.iter().map(|p| p.substitute(bindings)).collect(),
                required: sig.required,
                rest: sig.rest.as_ref().map(|r| r.substitute(bindings)),
                ret: sig.ret.substitute(bindings),
                type_params: sig.type_params.clone(),
            }),
            other => other.clone(),
        }
    }

    /// Bind generic parameters in `self` by matching against `actual`
    pub fn unify(&self, actual: &TypeDesc, bindings: &mut FxHashMap<String, TypeDesc>) {
        match (self, actual) {
            (TypeDesc::TypeParam(name), actual) if !actual.is_any() => {
                bindings.entry(name.clone()).or_insert_with(|| actual.clone());
            }
            (TypeDesc::Slice(a), TypeDesc::Slice(b)) => a.unify(b, bindings),
            (TypeDesc::Nilable(a), b) => a.unify(b.unwrap_nilable(), bindings),
            (TypeDesc::Queue(a), TypeDesc::Queue(b)) => a.unify(b, bindings),
            _ => {}
        }
    }

    /// Type both branches of a conditional can be assigned to
    pub fn common(a: &TypeDesc, b: &TypeDesc) -> TypeDesc {
        match (a, b) {
            _ if a == b => a.clone(),
            (TypeDesc::Any, other) | (other, TypeDesc::Any) => other.clone(),
            (TypeDesc::Void, other) | (other, TypeDesc::Void) => other.clone(),
            (TypeDesc::Nilable(inner), other) | (other, TypeDesc::Nilable(inner)) if **inner == *other => {
                TypeDesc::Nilable(inner.clone())
            }
            _ => TypeDesc::Any,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Void => write!(f, "void"),
            other => write!(f, "{}", other.go_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_spelling() {
        assert_eq!(TypeDesc::Number.go_type(), "float64");
        assert_eq!(TypeDesc::slice(TypeDesc::String).go_type(), "[]string");
        assert_eq!(TypeDesc::queue(TypeDesc::String).go_type(), "chan string");
        assert_eq!(
            TypeDesc::Class {
                name: "Box".to_string(),
                args: vec![TypeDesc::Number]
            }
            .go_type(),
            "*Box[float64]"
        );
        assert_eq!(TypeDesc::Map.go_type(), "map[string]interface{}");
    }

    #[test]
    fn test_nilable_only_wraps_value_kinds() {
        assert_eq!(
            TypeDesc::nilable(TypeDesc::String),
            TypeDesc::Nilable(Box::new(TypeDesc::String))
        );
        assert_eq!(TypeDesc::nilable(TypeDesc::class("Foo")), TypeDesc::class("Foo"));
        assert_eq!(
            TypeDesc::nilable(TypeDesc::slice(TypeDesc::Number)),
            TypeDesc::slice(TypeDesc::Number)
        );
        let once = TypeDesc::nilable(TypeDesc::Number);
        assert_eq!(TypeDesc::nilable(once.clone()), once);
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(TypeDesc::Number.zero_value(), "0");
        assert_eq!(TypeDesc::String.zero_value(), "\"\"");
        assert_eq!(TypeDesc::nilable(TypeDesc::Number).zero_value(), "nil");
        assert_eq!(TypeDesc::Struct("Point".into()).zero_value(), "Point{}");
        assert_eq!(TypeDesc::TypeParam("T".into()).zero_value(), "*new(T)");
    }

    #[test]
    fn test_signature_with_default_tail() {
        let sig = FuncSig {
            params: vec![TypeDesc::String, TypeDesc::Number, TypeDesc::Number],
            required: 1,
            rest: None,
            ret: TypeDesc::Number,
            type_params: Vec::new(),
        };
        assert_eq!(sig.go_signature(None), "(string, ...interface{}) float64");
        let names = vec!["name".to_string()];
        assert_eq!(sig.go_signature(Some(&names)), "(name string, args ...interface{}) float64");
    }

    #[test]
    fn test_signature_with_rest() {
        let sig = FuncSig {
            params: vec![TypeDesc::String],
            required: 1,
            rest: Some(TypeDesc::Number),
            ret: TypeDesc::Void,
            type_params: Vec::new(),
        };
        let names = vec!["label".to_string(), "values".to_string()];
        assert_eq!(sig.go_signature(Some(&names)), "(label string, values ...float64)");
        assert_eq!(sig.param_type(3), TypeDesc::Number);
    }

    #[test]
    fn test_substitute_and_unify() {
        let mut bindings = FxHashMap::default();
        TypeDesc::slice(TypeDesc::TypeParam("T".into())).unify(&TypeDesc::slice(TypeDesc::String), &mut bindings);
        assert_eq!(bindings.get("T"), Some(&TypeDesc::String));

        let sig = TypeDesc::function(FuncSig::new(
            vec![TypeDesc::TypeParam("T".into())],
            TypeDesc::TypeParam("T".into()),
        ));
        assert_eq!(sig.substitute(&bindings).go_type(), "func(string) string");
    }

    #[test]
    fn test_common_type() {
        assert_eq!(TypeDesc::common(&TypeDesc::Number, &TypeDesc::Number), TypeDesc::Number);
        assert_eq!(TypeDesc::common(&TypeDesc::Any, &TypeDesc::String), TypeDesc::String);
        assert_eq!(TypeDesc::common(&TypeDesc::Number, &TypeDesc::String), TypeDesc::Any);
    }
}
