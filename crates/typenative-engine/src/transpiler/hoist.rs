//! Declaration hoisting
//!
//! Go only accepts declarations at package level, and source programs may
//! reference a class or function before it is declared. The top level is
//! split into hoistable declarations and executable statements, and every
//! declaration is registered in the environment before any body is lowered.

use super::desugar::enums::{self, Initializer};
use super::env::{ClassInfo, EnumInfo, InterfaceInfo, InterfaceShape, MethodInfo, PropertyInfo};
use super::error::TranspileResult;
use super::lower::{FnBody, Lowerer};
use super::types::{FuncSig, TypeDesc};
use crate::parser::ast::*;
use tracing::debug;

/// Split top-level statements into (hoistable declarations, executable
/// statements), both in source order
pub fn split(statements: &[Statement]) -> (Vec<&Statement>, Vec<&Statement>) {
    statements.iter().partition(|stmt| stmt.is_hoistable())
}

/// The declaration inside `export` wrappers
pub fn declaration_of(stmt: &Statement) -> &Statement {
    match stmt {
        Statement::ExportDecl(export) => declaration_of(&export.declaration),
        other => other,
    }
}

impl Lowerer {
    /// Register every declaration in `decls`.
    ///
    /// Names go first so member types may refer to any declaration in the
    /// batch. Aliases are then resolved eagerly so a cycle fails even when
    /// nothing uses the alias.
    pub(crate) fn register_declarations(&mut self, decls: &[&Statement]) -> TranspileResult<()> {
        for decl in decls {
            self.register_name(declaration_of(decl));
        }

        let aliases: Vec<TypeAnnotation> = decls
            .iter()
            .filter_map(|decl| match declaration_of(decl) {
                Statement::TypeAliasDecl(alias) => Some(alias.type_annotation.clone()),
                _ => None,
            })
            .collect();
        for annotation in &aliases {
            self.resolve_type(annotation)?;
        }

        for decl in decls {
            self.register_members(declaration_of(decl))?;
        }
        Ok(())
    }

    fn register_name(&mut self, stmt: &Statement) {
        match stmt {
            Statement::ClassDecl(class) => {
                let name = self.text(class.name.name);
                let mut info = ClassInfo::new(name.clone());
                for param in class.type_params.iter().flatten() {
                    info.type_params.push(self.text(param.name.name));
                    info.constraints.push("any".to_string());
                }
                debug!(class = %name, "register class");
                self.env.classes.insert(name, info);
            }
            Statement::InterfaceDecl(interface) => {
                let name = self.text(interface.name.name);
                let extends = interface
                    .extends
                    .iter()
                    .filter_map(|ann| match &ann.ty {
                        Type::Reference(reference) => Some(self.text(reference.name.name)),
                        _ => None,
                    })
                    .collect();
                self.register_interface_name(name, extends, &interface.members);
            }
            Statement::TypeAliasDecl(alias) => {
                let name = self.text(alias.name.name);
                match &alias.type_annotation.ty {
                    // Object type literals get a named Go type
                    Type::Object(object) => self.register_interface_name(name, Vec::new(), &object.members),
                    _ => {
                        debug!(alias = %name, "register alias");
                        self.env.aliases.insert(name, alias.type_annotation.clone());
                    }
                }
            }
            Statement::EnumDecl(decl) => self.register_enum(decl),
            _ => {}
        }
    }

    fn register_interface_name(&mut self, name: String, extends: Vec<String>, members: &[ObjectTypeMember]) {
        let has_methods = members.iter().any(|m| matches!(m, ObjectTypeMember::Method(_)));
        let shape = if has_methods {
            InterfaceShape::Contract(Vec::new())
        } else {
            InterfaceShape::Aggregate(Vec::new())
        };
        debug!(interface = %name, contract = has_methods, "register interface");
        self.env.interfaces.insert(name.clone(), InterfaceInfo { name, extends, shape });
    }

    fn register_enum(&mut self, decl: &EnumDecl) {
        let name = self.text(decl.name.name);
        let members: Vec<(String, Initializer)> = decl
            .members
            .iter()
            .map(|member| {
                let member_name = match &member.name {
                    EnumMemberName::Identifier(id) => self.text(id.name),
                    EnumMemberName::StringLiteral(lit) => self.text(lit.value),
                };
                let init = match member.initializer.as_ref().map(Expression::unwrapped) {
                    None => Initializer::None,
                    Some(Expression::IntLiteral(lit)) => Initializer::Number(lit.value as f64),
                    Some(Expression::FloatLiteral(lit)) => Initializer::Number(lit.value),
                    Some(Expression::StringLiteral(lit)) => Initializer::String(self.text(lit.value)),
                    Some(Expression::Unary(unary)) if unary.operator == UnaryOperator::Minus => {
                        match unary.operand.unwrapped() {
                            Expression::IntLiteral(lit) => Initializer::Number(-(lit.value as f64)),
                            Expression::FloatLiteral(lit) => Initializer::Number(-lit.value),
                            _ => Initializer::Computed,
                        }
                    }
                    Some(_) => Initializer::Computed,
                };
                (member_name, init)
            })
            .collect();
        let (base, members) = enums::assign_values(&members);
        debug!(enum_name = %name, members = members.len(), "register enum");
        self.env.enums.insert(name.clone(), EnumInfo { name, base, members });
    }

    fn register_members(&mut self, stmt: &Statement) -> TranspileResult<()> {
        match stmt {
            Statement::ClassDecl(class) => self.register_class_members(class),
            Statement::InterfaceDecl(interface) => {
                let name = self.text(interface.name.name);
                self.register_interface_members(&name, &interface.members)
            }
            Statement::TypeAliasDecl(alias) => match &alias.type_annotation.ty {
                Type::Object(object) => {
                    let name = self.text(alias.name.name);
                    self.register_interface_members(&name, &object.members)
                }
                _ => Ok(()),
            },
            Statement::FunctionDecl(func) => {
                let name = self.text(func.name.name);
                let sig = self.function_signature(
                    &func.params,
                    func.return_type.as_ref(),
                    func.is_async,
                    FnBody::Block(&func.body),
                    func.type_params.as_deref().unwrap_or(&[]),
                    None,
                )?;
                debug!(function = %name, signature = %sig.go_signature(None), "register function");
                self.env.functions.insert(name, sig);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn register_interface_members(&mut self, name: &str, members: &[ObjectTypeMember]) -> TranspileResult<()> {
        let mut properties = Vec::new();
        let mut methods = Vec::new();
        for member in members {
            match member {
                ObjectTypeMember::Property(prop) => {
                    let ty = self.resolve_type(&prop.ty)?;
                    properties.push(PropertyInfo {
                        name: self.text(prop.name.name),
                        ty: if prop.optional { TypeDesc::nilable(ty) } else { ty },
                        optional: prop.optional,
                    });
                }
                ObjectTypeMember::Method(method) => {
                    let mut params = Vec::new();
                    for param in &method.params {
                        params.push(self.resolve_type(&param.ty)?);
                    }
                    let ret = self.resolve_type(&method.return_type)?;
                    methods.push(MethodInfo {
                        name: self.text(method.name.name),
                        sig: FuncSig::new(params, unwrap_promise(ret)),
                    });
                }
            }
        }
        if let Some(info) = self.env.interfaces.get_mut(name) {
            info.shape = if info.is_contract() {
                InterfaceShape::Contract(methods)
            } else {
                InterfaceShape::Aggregate(properties)
            };
        }
        Ok(())
    }

    fn register_class_members(&mut self, class: &ClassDecl) -> TranspileResult<()> {
        let name = self.text(class.name.name);
        let Some(mut info) = self.env.classes.get(&name).cloned() else {
            return Ok(());
        };

        self.env.push_type_params(info.type_params.clone());
        self.classes.push(name.clone());

        let mut constraints = Vec::new();
        for param in class.type_params.iter().flatten() {
            constraints.push(self.constraint_of(param)?);
        }
        info.constraints = constraints;

        if let Some(Type::Reference(reference)) = class.extends.as_ref().map(|ann| &ann.ty) {
            let parent = self.text(reference.name.name);
            if self.env.classes.contains_key(&parent) {
                for arg in reference.type_args.iter().flatten() {
                    info.parent_args.push(self.resolve_type(arg)?);
                }
                info.parent = Some(parent);
            } else {
                debug!(class = %name, parent = %parent, "parent is not a translated class");
            }
        }

        // Properties first so method return inference can see them
        for member in &class.members {
            match member {
                ClassMember::Field(field) => {
                    let ty = match self.resolve_opt(field.type_annotation.as_ref())? {
                        Some(ty) => ty,
                        None => match &field.initializer {
                            Some(init) => self.type_of(init),
                            None => TypeDesc::Any,
                        },
                    };
                    let prop = PropertyInfo {
                        name: self.text(field.name.name),
                        ty: if field.optional { TypeDesc::nilable(ty) } else { ty },
                        optional: field.optional,
                    };
                    if field.is_static {
                        info.static_fields.push(prop);
                    } else {
                        info.properties.push(prop);
                    }
                }
                ClassMember::Constructor(ctor) => {
                    for param in ctor.params.iter().filter(|p| p.property.is_some()) {
                        let ty = self.resolve_opt(param.type_annotation.as_ref())?.unwrap_or(TypeDesc::Any);
                        info.properties.push(PropertyInfo {
                            name: self.text(param.name.name),
                            ty: if param.optional { TypeDesc::nilable(ty) } else { ty },
                            optional: param.optional,
                        });
                    }
                }
                ClassMember::Method(_) => {}
            }
        }
        self.env.classes.insert(name.clone(), info.clone());

        for member in &class.members {
            match member {
                ClassMember::Method(method) => {
                    let method_name = self.text(method.name.name);
                    let sig = self.function_signature(
                        &method.params,
                        method.return_type.as_ref(),
                        method.is_async,
                        method.body.as_ref().map_or(FnBody::None, FnBody::Block),
                        &[],
                        None,
                    )?;
                    match method.kind {
                        MethodKind::Getter => info.getters.push(method_name.clone()),
                        MethodKind::Setter => info.setters.push(method_name.clone()),
                        MethodKind::Normal => {}
                    }
                    let entry = MethodInfo {
                        name: method_name,
                        sig,
                    };
                    if method.is_static {
                        info.static_methods.push(entry);
                    } else {
                        info.methods.push(entry);
                    }
                    self.env.classes.insert(name.clone(), info.clone());
                }
                ClassMember::Constructor(ctor) => {
                    let mut sig = self.function_signature(
                        &ctor.params,
                        None,
                        false,
                        FnBody::None,
                        &[],
                        None,
                    )?;
                    sig.ret = info.self_type();
                    info.constructor = Some(sig);
                }
                ClassMember::Field(_) => {}
            }
        }

        self.classes.pop();
        self.env.pop_type_params();
        self.env.classes.insert(name, info);
        Ok(())
    }

    /// Go constraint of a generic parameter
    pub(crate) fn constraint_of(&self, param: &TypeParameter) -> TranspileResult<String> {
        Ok(match self.resolve_opt(param.constraint.as_ref())? {
            None | Some(TypeDesc::Any) => "any".to_string(),
            Some(ty) => ty.go_type(),
        })
    }

    /// Constructor signature of a class, inherited from the nearest
    /// ancestor that declares one
    pub(crate) fn constructor_sig(&self, class: &str) -> FuncSig {
        let mut current = self.env.classes.get(class);
        let mut depth = 0;
        while let Some(info) = current {
            if let Some(sig) = &info.constructor {
                return sig.clone();
            }
            depth += 1;
            if depth > 64 {
                break;
            }
            current = info.parent.as_ref().and_then(|p| self.env.classes.get(p));
        }
        FuncSig::new(Vec::new(), TypeDesc::class(class))
    }
}

/// `Promise<T>` results of contract methods are plain `T`
fn unwrap_promise(ty: TypeDesc) -> TypeDesc {
    match ty {
        TypeDesc::Queue(payload) => *payload,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranspileOptions;
    use crate::parser::Parser;
    use crate::transpiler::env::EnumValue;
    use crate::transpiler::TranspileError;

    fn registered(source: &str) -> TranspileResult<Lowerer> {
        let (module, interner) = Parser::new(source).unwrap().parse().unwrap();
        let mut lowerer = Lowerer::new(interner, TranspileOptions::default());
        let (decls, _) = split(&module.statements);
        lowerer.register_declarations(&decls)?;
        Ok(lowerer)
    }

    #[test]
    fn test_split_keeps_source_order() {
        let (module, _) = Parser::new("let a = 1;\nfunction f() {}\nclass C {}\nf();")
            .unwrap()
            .parse()
            .unwrap();
        let (decls, exec) = split(&module.statements);
        assert_eq!(decls.len(), 2);
        assert_eq!(exec.len(), 2);
        assert!(matches!(decls[0], Statement::FunctionDecl(_)));
        assert!(matches!(decls[1], Statement::ClassDecl(_)));
    }

    #[test]
    fn test_forward_references_resolve() {
        let lowerer = registered(
            "function make(): Point { return new Point(1); }\nclass Point { constructor(public x: number) {} }",
        )
        .unwrap();
        assert_eq!(lowerer.env.functions["make"].ret, TypeDesc::class("Point"));
        assert_eq!(
            lowerer.env.find_property("Point", "x").map(|p| p.ty.clone()),
            Some(TypeDesc::Number)
        );
    }

    #[test]
    fn test_interface_shapes() {
        let lowerer = registered(
            "interface Shape { area(): number; }\ninterface Point { x: number; y?: number; }",
        )
        .unwrap();
        assert!(lowerer.env.interfaces["Shape"].is_contract());
        assert!(!lowerer.env.interfaces["Point"].is_contract());
        assert_eq!(
            lowerer.env.find_interface_property("Point", "y").map(|p| p.ty.clone()),
            Some(TypeDesc::nilable(TypeDesc::Number))
        );
    }

    #[test]
    fn test_enum_values() {
        let lowerer = registered("enum Level { Low = 1, Mid, High }").unwrap();
        let info = &lowerer.env.enums["Level"];
        assert_eq!(info.members[2].1, EnumValue::Number(3.0));
    }

    #[test]
    fn test_unused_cyclic_alias_fails() {
        let err = registered("type A = B;\ntype B = A;").err().unwrap();
        assert!(matches!(err, TranspileError::CyclicTypeAlias { .. }));
    }

    #[test]
    fn test_inherited_constructor_signature() {
        let lowerer = registered(
            "class Animal { constructor(name: string) {} }\nclass Dog extends Animal {}",
        )
        .unwrap();
        assert_eq!(lowerer.constructor_sig("Dog").params, vec![TypeDesc::String]);
        assert_eq!(lowerer.env.classes["Dog"].parent.as_deref(), Some("Animal"));
    }
}
