//! Optional chaining and nullish coalescing
//!
//! Both evaluate their left side exactly once into a temporary inside an
//! immediately-invoked closure, nil-check it, and either short-circuit or
//! continue with the real value. Results that are value kinds come back
//! through a pointer so "absent" stays representable.

use crate::transpiler::types::TypeDesc;

/// Guarded access: `object?.rest`.
///
/// `object` is evaluated into `temp` (dereferenced when `object_ty` is a
/// nilable value); `inner` is the lowered remainder of the chain written
/// against `temp`, of type `inner_ty`.
pub fn guard(
    object: &str,
    object_ty: &TypeDesc,
    temp: &str,
    inner: &str,
    inner_ty: &TypeDesc,
    scratch: &str,
) -> String {
    let mut lines = Vec::new();
    let result = TypeDesc::nilable(inner_ty.clone());
    let void = matches!(inner_ty, TypeDesc::Void);

    if object_ty.is_nilable() {
        lines.push(format!("{} := {}", scratch, object));
        lines.push(nil_return(scratch, void));
        lines.push(format!("{} := *{}", temp, scratch));
    } else if object_ty.is_nil_capable() {
        lines.push(format!("{} := {}", temp, object));
        lines.push(nil_return(temp, void));
    } else {
        lines.push(format!("{} := {}", temp, object));
    }

    if void {
        lines.push(inner.to_string());
        return format!("func() {{\n{}\n}}()", lines.join("\n"));
    }
    if inner_ty.is_value_kind() {
        lines.push(format!("{} := {}", scratch_value(scratch), inner));
        lines.push(format!("return &{}", scratch_value(scratch)));
    } else {
        lines.push(format!("return {}", inner));
    }
    format!("func() {} {{\n{}\n}}()", result.go_type(), lines.join("\n"))
}

fn nil_return(name: &str, void: bool) -> String {
    if void {
        format!("if {} == nil {{\nreturn\n}}", name)
    } else {
        format!("if {} == nil {{\nreturn nil\n}}", name)
    }
}

fn scratch_value(scratch: &str) -> String {
    format!("{}v", scratch)
}

/// Result type of `left ?? right`
pub fn coalesce_type(left: &TypeDesc, right: &TypeDesc) -> TypeDesc {
    match left {
        TypeDesc::Nilable(inner) => (**inner).clone(),
        TypeDesc::Any => right.clone(),
        other => other.clone(),
    }
}

/// `left ?? right` where the left side can be nil.
///
/// `result` is the declared closure result type; `right` is already
/// lowered against it.
pub fn coalesce(left: &str, left_ty: &TypeDesc, temp: &str, right: &str, result: &TypeDesc) -> String {
    let present = match left_ty {
        TypeDesc::Nilable(_) => format!("*{}", temp),
        TypeDesc::Any if !result.is_any() => format!("{}.({})", temp, result.go_type()),
        _ => temp.to_string(),
    };
    format!(
        "func() {ty} {{\n{temp} := {left}\nif {temp} == nil {{\nreturn {right}\n}}\nreturn {present}\n}}()",
        ty = result.go_type(),
        temp = temp,
        left = left,
        right = right,
        present = present,
    )
}

/// `*p` when `p` is non-nil, the zero value otherwise
pub fn deref_or_zero(text: &str, inner: &TypeDesc, temp: &str) -> String {
    format!(
        "func() {ty} {{\nif {temp} := {text}; {temp} != nil {{\nreturn *{temp}\n}}\nreturn {zero}\n}}()",
        ty = inner.go_type(),
        temp = temp,
        text = text,
        zero = inner.zero_value(),
    )
}

/// Pointer to a fresh copy of a value
pub fn address_of(text: &str, inner: &TypeDesc, temp: &str) -> String {
    format!(
        "func() *{ty} {{\nvar {temp} {ty} = {text}\nreturn &{temp}\n}}()",
        ty = inner.go_type(),
        temp = temp,
        text = text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_on_class_instance_returns_pointer_to_value() {
        let text = guard("user", &TypeDesc::class("User"), "_o0", "_o0.name", &TypeDesc::String, "_p1");
        assert_eq!(
            text,
            "func() *string {\n_o0 := user\nif _o0 == nil {\nreturn nil\n}\n_p1v := _o0.name\nreturn &_p1v\n}()"
        );
    }

    #[test]
    fn test_guard_on_nilable_value_dereferences() {
        let text = guard(
            "s",
            &TypeDesc::nilable(TypeDesc::String),
            "_o0",
            "float64(len(_o0))",
            &TypeDesc::Number,
            "_p1",
        );
        assert!(text.contains("_p1 := s\nif _p1 == nil {\nreturn nil\n}\n_o0 := *_p1"));
        assert!(text.starts_with("func() *float64 {"));
    }

    #[test]
    fn test_guard_with_void_call() {
        let text = guard("c", &TypeDesc::class("C"), "_o0", "_o0.run()", &TypeDesc::Void, "_p1");
        assert_eq!(text, "func() {\n_o0 := c\nif _o0 == nil {\nreturn\n}\n_o0.run()\n}()");
    }

    #[test]
    fn test_coalesce_nilable() {
        let text = coalesce(
            "name",
            &TypeDesc::nilable(TypeDesc::String),
            "_l0",
            "\"anonymous\"",
            &TypeDesc::String,
        );
        assert_eq!(
            text,
            "func() string {\n_l0 := name\nif _l0 == nil {\nreturn \"anonymous\"\n}\nreturn *_l0\n}()"
        );
    }

    #[test]
    fn test_coalesce_types() {
        assert_eq!(
            coalesce_type(&TypeDesc::nilable(TypeDesc::Number), &TypeDesc::Number),
            TypeDesc::Number
        );
        assert_eq!(coalesce_type(&TypeDesc::Any, &TypeDesc::String), TypeDesc::String);
        assert_eq!(coalesce_type(&TypeDesc::class("A"), &TypeDesc::Any), TypeDesc::class("A"));
    }

    #[test]
    fn test_pointer_helpers() {
        assert_eq!(
            address_of("\"hello\"", &TypeDesc::String, "_v0"),
            "func() *string {\nvar _v0 string = \"hello\"\nreturn &_v0\n}()"
        );
        assert_eq!(
            deref_or_zero("p", &TypeDesc::Number, "_d0"),
            "func() float64 {\nif _d0 := p; _d0 != nil {\nreturn *_d0\n}\nreturn 0\n}()"
        );
    }
}
