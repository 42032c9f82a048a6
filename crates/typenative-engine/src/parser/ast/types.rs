//! Type annotation AST nodes

use super::*;
use crate::parser::token::Span;

/// A type annotation as written in source: `: number`, `: Box<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// number, string, boolean, void, any, ...
    Primitive(PrimitiveType),

    /// Named type with optional arguments: Promise<string>
    Reference(TypeReference),

    /// A | B
    Union(UnionType),

    /// (a: number) => string
    Function(FunctionType),

    /// T[]
    Array(ArrayType),

    /// [A, B]
    Tuple(TupleType),

    /// { x: number; y?: string }
    Object(ObjectType),

    /// 'UP'
    StringLiteral(crate::parser::interner::Symbol),

    /// 42
    NumberLiteral(f64),

    /// true
    BooleanLiteral(bool),

    /// (T)
    Parenthesized(Box<TypeAnnotation>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Number,
    String,
    Boolean,
    Null,
    Undefined,
    Void,
    Any,
    Unknown,
    Never,
    Object,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "number" => PrimitiveType::Number,
            "string" => PrimitiveType::String,
            "boolean" => PrimitiveType::Boolean,
            "undefined" => PrimitiveType::Undefined,
            "any" => PrimitiveType::Any,
            "unknown" => PrimitiveType::Unknown,
            "never" => PrimitiveType::Never,
            "object" => PrimitiveType::Object,
            _ => return None,
        })
    }

    /// null and undefined only make a union nilable.
    pub fn is_nullish(self) -> bool {
        matches!(self, PrimitiveType::Null | PrimitiveType::Undefined)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub name: Identifier,
    pub type_args: Option<Vec<TypeAnnotation>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub types: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<FunctionTypeParam>,
    pub return_type: Box<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTypeParam {
    pub name: Option<Identifier>,
    pub ty: TypeAnnotation,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub element_type: Box<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleType {
    pub element_types: Vec<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub members: Vec<ObjectTypeMember>,
}

/// Member of an object type literal or interface body.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectTypeMember {
    Property(ObjectTypeProperty),
    Method(ObjectTypeMethod),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeProperty {
    pub name: Identifier,
    pub ty: TypeAnnotation,
    pub optional: bool,
    pub readonly: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTypeMethod {
    pub name: Identifier,
    pub params: Vec<FunctionTypeParam>,
    pub return_type: TypeAnnotation,
    pub span: Span,
}

/// Generic type parameter: T, T extends Shape
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub name: Identifier,
    pub constraint: Option<TypeAnnotation>,
    pub default: Option<TypeAnnotation>,
    pub span: Span,
}
