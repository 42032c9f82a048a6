//! Classes, interfaces and enums
//!
//! A class becomes a struct, a `New{Class}` constructor function and
//! pointer-receiver methods. Inheritance embeds the parent struct by
//! pointer, so parent fields and methods are promoted; there is no virtual
//! dispatch through the parent.

use super::expr::static_name;
use super::function::signature_text;
use super::stmt::{braced, setter_name};
use super::{FnBody, Lowerer};
use crate::parser::ast::*;
use crate::transpiler::context::{FunctionFrame, LowerCtx};
use crate::transpiler::desugar::enums;
use crate::transpiler::env::{sanitize, ClassInfo, EnumValue, InterfaceShape, PropertyInfo};
use crate::transpiler::error::{TranspileError, TranspileResult};
use crate::transpiler::types::{FuncSig, TypeDesc};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Go type for a field, `interface{}` when nothing is known
fn field_type(ty: &TypeDesc) -> String {
    match ty.go_type() {
        t if t.is_empty() => "interface{}".to_string(),
        t => t,
    }
}

impl Lowerer {
    pub(super) fn lower_class(&mut self, class: &ClassDecl) -> TranspileResult<String> {
        let name = self.text(class.name.name);
        let Some(info) = self.env.classes.get(&name).cloned() else {
            return Err(TranspileError::malformed(format!("class {} was not registered", name), class.span));
        };
        debug!(class = %name, parent = ?info.parent, "lower class");

        self.classes.push(name);
        self.env.push_type_params(info.type_params.clone());
        let result = self.lower_class_parts(class, &info);
        self.env.pop_type_params();
        self.classes.pop();
        result
    }

    fn lower_class_parts(&mut self, class: &ClassDecl, info: &ClassInfo) -> TranspileResult<String> {
        let mut parts = vec![self.class_struct(info)];
        parts.extend(self.static_fields(class, info)?);
        parts.push(self.class_constructor(class, info)?);
        for member in &class.members {
            if let ClassMember::Method(method) = member {
                if let Some(text) = self.class_method(method, info)? {
                    parts.push(text);
                }
            }
        }
        Ok(parts.join("\n\n"))
    }

    fn class_struct(&mut self, info: &ClassInfo) -> String {
        let mut fields = Vec::new();
        if let Some(parent) = &info.parent {
            let args: Vec<String> = info.parent_args.iter().map(TypeDesc::go_type).collect();
            if args.is_empty() {
                fields.push(format!("*{}", parent));
            } else {
                fields.push(format!("*{}[{}]", parent, args.join(", ")));
            }
        }
        for prop in &info.properties {
            let name = self.env.go_name(&sanitize(&prop.name));
            fields.push(format!("{} {}", name, field_type(&prop.ty)));
        }
        braced(
            &format!("type {}{} struct", info.name, info.type_param_list()),
            &fields.join("\n"),
        )
    }

    /// `var Class_field T = init` for each static field
    fn static_fields(&mut self, class: &ClassDecl, info: &ClassInfo) -> TranspileResult<Vec<String>> {
        let mut out = Vec::new();
        for member in &class.members {
            let ClassMember::Field(field) = member else { continue };
            if !field.is_static {
                continue;
            }
            let raw = self.text(field.name.name);
            let ty = info
                .static_field(&raw)
                .map(|p| p.ty.clone())
                .unwrap_or(TypeDesc::Any);
            let name = static_name(&info.name, &raw);
            out.push(match &field.initializer {
                Some(init) => {
                    let value = self.lower_expr_as(init, &ty, &LowerCtx::default())?;
                    format!("var {} {} = {}", name, field_type(&ty), value)
                }
                None => format!("var {} {}", name, field_type(&ty)),
            });
        }
        Ok(out)
    }

    // ========================================================================
    // Constructor
    // ========================================================================

    /// `this.f = init` for instance field initializers and parameter
    /// properties, in declaration order
    fn field_initializers(&mut self, class: &ClassDecl, info: &ClassInfo) -> TranspileResult<Vec<String>> {
        let mut lines = Vec::new();
        for member in &class.members {
            match member {
                ClassMember::Field(field) if !field.is_static => {
                    let Some(init) = &field.initializer else { continue };
                    let raw = self.text(field.name.name);
                    let ty = info.property(&raw).map(|p| p.ty.clone()).unwrap_or(TypeDesc::Any);
                    let value = self.lower_expr_as(init, &ty, &LowerCtx::default())?;
                    let field_name = self.env.go_name(&sanitize(&raw));
                    lines.push(format!("this.{} = {}", field_name, value));
                }
                ClassMember::Constructor(ctor) => {
                    for param in ctor.params.iter().filter(|p| p.property.is_some()) {
                        let raw = self.text(param.name.name);
                        let field_name = self.env.go_name(&sanitize(&raw));
                        let value = self.go_ident(param.name.name);
                        lines.push(format!("this.{} = {}", field_name, value));
                    }
                }
                _ => {}
            }
        }
        Ok(lines)
    }

    fn class_constructor(&mut self, class: &ClassDecl, info: &ClassInfo) -> TranspileResult<String> {
        let self_type = info.self_type();
        let header_type = self_type.go_type();
        let literal = format!("{}{}", info.name, info.type_arg_list());
        let derived = info.parent.is_some();
        let inits = self.field_initializers(class, info)?;

        let declared = class.members.iter().find_map(|m| match m {
            ClassMember::Constructor(ctor) => Some(ctor),
            _ => None,
        });

        let (signature, mut body) = match declared {
            Some(ctor) => {
                let mut sig = info
                    .constructor
                    .clone()
                    .unwrap_or_else(|| FuncSig::new(Vec::new(), self_type.clone()));
                sig.ret = self_type.clone();
                let frame = FunctionFrame {
                    return_type: Some(self_type.clone()),
                    class: Some(info.name.clone()),
                    constructor: true,
                    derived_constructor: derived,
                    ..Default::default()
                };
                let previous = self.pending_field_inits.take();
                let mut prefix = Vec::new();
                if derived {
                    self.pending_field_inits = Some(inits);
                } else {
                    prefix = inits;
                }
                let result = self.lower_callable(&ctor.params, &sig, FnBody::Block(&ctor.body), frame, &LowerCtx::hoisted());
                let unconsumed = std::mem::replace(&mut self.pending_field_inits, previous);
                let (names, body) = result?;
                if let Some(waiting) = unconsumed {
                    // No `super(...)` call ran them
                    prefix = waiting;
                }
                let mut lines = prefix;
                if !body.is_empty() {
                    lines.push(body);
                }
                (signature_text(&sig, &names), lines)
            }
            None if derived => {
                let (signature, forward) = self.implicit_super(info)?;
                let mut lines = vec![forward];
                lines.extend(inits);
                (signature, lines)
            }
            None => (format!("() {}", header_type), inits),
        };

        body.insert(0, format!("this := &{}{{}}", literal));
        body.push("return this".to_string());
        Ok(format!(
            "func New{}{}{} {{\n{}\n}}",
            info.name,
            info.type_param_list(),
            signature,
            body.join("\n")
        ))
    }

    /// Signature and parent initialization of a derived class without its
    /// own constructor: the parent's parameters are forwarded as-is
    fn implicit_super(&mut self, info: &ClassInfo) -> TranspileResult<(String, String)> {
        let parent = info.parent.clone().unwrap_or_default();
        let parent_ty = TypeDesc::Class {
            name: parent.clone(),
            args: info.parent_args.clone(),
        };
        let bindings = self.env.class_bindings(&parent_ty);
        let mut sig = self.constructor_sig(&parent);
        sig.params = sig.params.iter().map(|p| p.substitute(&bindings)).collect();
        sig.rest = sig.rest.map(|r| r.substitute(&bindings));
        sig.ret = info.self_type();

        let mut names: Vec<String> = (0..sig.required).map(|i| format!("arg{}", i)).collect();
        let mut forwarded = names.clone();
        if sig.has_default_tail() {
            forwarded.push("args...".to_string());
        } else if sig.rest.is_some() {
            names.push("rest".to_string());
            forwarded.push("rest...".to_string());
        }
        let type_args: Vec<String> = info.parent_args.iter().map(TypeDesc::go_type).collect();
        let type_args = if type_args.is_empty() {
            String::new()
        } else {
            format!("[{}]", type_args.join(", "))
        };
        Ok((
            signature_text(&sig, &names),
            format!("this.{} = New{}{}({})", parent, parent, type_args, forwarded.join(", ")),
        ))
    }

    // ========================================================================
    // Methods
    // ========================================================================

    fn class_method(&mut self, method: &MethodDecl, info: &ClassInfo) -> TranspileResult<Option<String>> {
        let Some(body) = &method.body else {
            // Abstract: the parent struct carries no implementation
            return Ok(None);
        };
        let raw = self.text(method.name.name);
        let table = if method.is_static { &info.static_methods } else { &info.methods };
        let sig = table
            .iter()
            .find(|m| {
                m.name == raw
                    && match method.kind {
                        MethodKind::Getter => m.sig.params.is_empty(),
                        MethodKind::Setter => m.sig.params.len() == 1,
                        MethodKind::Normal => true,
                    }
            })
            .map(|m| m.sig.clone());
        let sig = match sig {
            Some(sig) => sig,
            None => self.function_signature(
                &method.params,
                method.return_type.as_ref(),
                method.is_async,
                FnBody::Block(body),
                &[],
                None,
            )?,
        };

        let go_name = match method.kind {
            MethodKind::Getter => {
                self.fallback("getter accessor", method.span)?;
                self.env.go_name(&sanitize(&raw))
            }
            MethodKind::Setter => setter_name(&sanitize(&raw)),
            MethodKind::Normal => self.env.go_name(&sanitize(&raw)),
        };

        let frame = FunctionFrame {
            return_type: Some(sig.ret.clone()),
            class: Some(info.name.clone()),
            ..Default::default()
        };
        let (names, text) = self.lower_callable(&method.params, &sig, FnBody::Block(body), frame, &LowerCtx::hoisted())?;
        let signature = signature_text(&sig, &names);
        Ok(Some(if method.is_static {
            format!("func {}{} {{\n{}\n}}", static_name(&info.name, &raw), signature, text)
        } else {
            format!(
                "func (this *{}{}) {}{} {{\n{}\n}}",
                info.name,
                info.type_arg_list(),
                go_name,
                signature,
                text
            )
        }))
    }

    // ========================================================================
    // Interfaces
    // ========================================================================

    /// Contract interfaces become Go interfaces; property-only ones become
    /// structs with every inherited field flattened in
    pub(super) fn lower_interface(&mut self, name: &str) -> String {
        let Some(info) = self.env.interfaces.get(name).cloned() else {
            return String::new();
        };
        match &info.shape {
            InterfaceShape::Contract(methods) => {
                let mut lines: Vec<String> = info
                    .extends
                    .iter()
                    .filter(|parent| self.env.interfaces.get(*parent).is_some_and(|p| p.is_contract()))
                    .cloned()
                    .collect();
                for method in methods {
                    let go = self.env.go_name(&sanitize(&method.name));
                    lines.push(format!("{}{}", go, method.sig.go_signature(None)));
                }
                braced(&format!("type {} interface", name), &lines.join("\n"))
            }
            InterfaceShape::Aggregate(_) => {
                let mut seen = FxHashSet::default();
                let mut fields = Vec::new();
                for prop in self.aggregate_fields(name, 0) {
                    if seen.insert(prop.name.clone()) {
                        let go = self.env.go_name(&sanitize(&prop.name));
                        fields.push(format!("{} {}", go, field_type(&prop.ty)));
                    }
                }
                braced(&format!("type {} struct", name), &fields.join("\n"))
            }
        }
    }

    /// Parent fields first, then the interface's own
    fn aggregate_fields(&self, name: &str, depth: usize) -> Vec<PropertyInfo> {
        let Some(info) = self.env.interfaces.get(name) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if depth < 64 {
            for parent in &info.extends {
                out.extend(self.aggregate_fields(parent, depth + 1));
            }
        }
        if let InterfaceShape::Aggregate(props) = &info.shape {
            out.extend(props.iter().cloned());
        }
        out
    }

    // ========================================================================
    // Enums
    // ========================================================================

    pub(super) fn lower_enum(&mut self, decl: &EnumDecl) -> TranspileResult<String> {
        let name = self.text(decl.name.name);
        let Some(info) = self.env.enums.get(&name).cloned() else {
            return Err(TranspileError::malformed(format!("enum {} was not registered", name), decl.span));
        };
        let mut computed = FxHashMap::default();
        for member in &decl.members {
            let member_name = match &member.name {
                EnumMemberName::Identifier(id) => self.text(id.name),
                EnumMemberName::StringLiteral(lit) => self.text(lit.value),
            };
            let is_computed = info
                .members
                .iter()
                .any(|(n, v)| *n == member_name && matches!(v, EnumValue::Computed));
            if let (true, Some(init)) = (is_computed, &member.initializer) {
                let text = self.lower_expr_as(init, &TypeDesc::Number, &LowerCtx::default())?;
                computed.insert(member_name, text);
            }
        }
        Ok(enums::declare(&info, &computed))
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
    // Classes
    // ========================================================================

    #[test]
    fn test_class_struct_constructor_and_method() {
        let code = go(
            "class Point {\n  constructor(public x: number, public y: number) {}\n  sum(): number { return this.x + this.y; }\n}\nconst p = new Point(1, 2);\nconsole.log(p.sum());",
        );
        assert!(code.contains("type Point struct {\n\tx float64\n\ty float64\n}"));
        assert!(code.contains("func NewPoint(x float64, y float64) *Point {\n\tthis := &Point{}\n\tthis.x = x\n\tthis.y = y\n\treturn this\n}"));
        assert!(code.contains("func (this *Point) sum() float64 {\n\treturn this.x + this.y\n}"));
        assert!(code.contains("p := NewPoint(1, 2)"));
    }

    #[test]
    fn test_field_initializers_run_first() {
        let code = go("class Counter {\n  count: number = 0;\n  inc(): void { this.count++; }\n}\nconst c = new Counter();\nc.inc();");
        assert!(code.contains("func NewCounter() *Counter {\n\tthis := &Counter{}\n\tthis.count = 0\n\treturn this\n}"));
        assert!(code.contains("\tthis.count++\n"));
    }

    #[test]
    fn test_derived_class_embeds_parent() {
        let code = go(
            "class Animal {\n  constructor(public name: string) {}\n  speak(): string { return this.name; }\n}\nclass Dog extends Animal {\n  tricks: number = 1;\n  constructor(name: string) {\n    super(name);\n  }\n}\nconst d = new Dog(\"rex\");\nconsole.log(d.speak());",
        );
        assert!(code.contains("type Dog struct {\n\t*Animal\n\ttricks float64\n}"));
        assert!(code.contains("\tthis.Animal = NewAnimal(name)\n\tthis.tricks = 1\n"));
        assert!(code.contains("d.speak()"));
    }

    #[test]
    fn test_implicit_derived_constructor_forwards() {
        let code = go(
            "class Base {\n  constructor(public id: number) {}\n}\nclass Child extends Base {}\nconst c = new Child(7);\nconsole.log(c.id);",
        );
        assert!(code.contains("func NewChild(arg0 float64) *Child {\n\tthis := &Child{}\n\tthis.Base = NewBase(arg0)\n\treturn this\n}"));
        assert!(code.contains("c := NewChild(7)"));
    }

    #[test]
    fn test_static_members() {
        let code = go(
            "class MathUtil {\n  static factor: number = 2;\n  static double(n: number): number { return n * MathUtil.factor; }\n}\nconsole.log(MathUtil.double(4));",
        );
        assert!(code.contains("var MathUtil_factor float64 = 2"));
        assert!(code.contains("func MathUtil_double(n float64) float64 {"));
        assert!(code.contains("return n * MathUtil_factor"));
        assert!(code.contains("fmt.Println(strconv.FormatFloat(MathUtil_double(4), 'f', -1, 64))"));
    }

    #[test]
    fn test_generic_class() {
        let code = go(
            "class Box<T> {\n  constructor(public value: T) {}\n  get(): T { return this.value; }\n}\nconst b = new Box<number>(3);\nconsole.log(b.get());",
        );
        assert!(code.contains("type Box[T any] struct {\n\tvalue T\n}"));
        assert!(code.contains("func NewBox[T any](value T) *Box[T] {"));
        assert!(code.contains("func (this *Box[T]) get() T {"));
        assert!(code.contains("b := NewBox[float64](3)"));
    }

    #[test]
    fn test_setter_becomes_set_method() {
        let code = go(
            "class Temp {\n  private c: number = 0;\n  set celsius(v: number) { this.c = v; }\n}\nconst t = new Temp();\nt.celsius = 5;",
        );
        assert!(code.contains("func (this *Temp) setCelsius(v float64) {"));
        assert!(code.contains("t.setCelsius(5)"));
    }

    #[test]
    fn test_getter_is_reported_and_strict_mode_rejects_it() {
        let source = "class A {\n  get two(): number { return 2; }\n}\nconsole.log(new A().two);";
        let lenient = transpile(source, &TranspileOptions::default()).unwrap();
        assert!(lenient.diagnostics.iter().any(|d| d.message.starts_with("getter accessor")));
        assert!(lenient.code.contains("func (this *A) two() float64 {"));
        assert!(lenient.code.contains("NewA().two()"));

        let strict = TranspileOptions {
            strict: true,
            ..Default::default()
        };
        let err = transpile(source, &strict).unwrap_err();
        assert!(matches!(err, TranspileError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_super_call_outside_derived_constructor() {
        let err = transpile(
            "class A {\n  constructor() { super(); }\n}",
            &TranspileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TranspileError::MalformedTree { .. }));
    }

    // ========================================================================
    // Interfaces and enums
    // ========================================================================

    #[test]
    fn test_contract_interface() {
        let code = go("interface Shape {\n  area(): number;\n  name(): string;\n}");
        assert!(code.contains("type Shape interface {\n\tarea() float64\n\tname() string\n}"));
    }

    #[test]
    fn test_aggregate_interface_flattens_parent() {
        let code = go("interface Named { name: string; }\ninterface Person extends Named { age: number; }");
        assert!(code.contains("type Person struct {\n\tname string\n\tage float64\n}"));
    }

    #[test]
    fn test_numeric_enum() {
        let code = go("enum Color { Red, Green, Blue }\nconst c = Color.Green;\nconsole.log(c);");
        assert!(code.contains("ColorGreen"));
        assert!(code.contains("type Color float64"));
    }
}
