//! Identifier usage
//!
//! Go rejects unused locals, and plain or compound assignment to a local
//! does not count as a use. The lowering engine asks which names a body
//! reads before it declares anything, and emits `_ = x` for the rest. A
//! second walk that also counts writes finds module-level variables that
//! hoisted declarations touch.

use crate::parser::ast::*;
use crate::parser::Interner;
use rustc_hash::FxHashSet;

/// Names referenced as values anywhere in `statements`
pub fn referenced_in<'a>(
    statements: impl IntoIterator<Item = &'a Statement>,
    interner: &Interner,
) -> FxHashSet<String> {
    let mut walker = Walker::new(interner, false);
    for stmt in statements {
        walker.statement(stmt);
    }
    walker.names
}

/// Names read or written anywhere in `statements`
pub fn touched_in<'a>(
    statements: impl IntoIterator<Item = &'a Statement>,
    interner: &Interner,
) -> FxHashSet<String> {
    let mut walker = Walker::new(interner, true);
    for stmt in statements {
        walker.statement(stmt);
    }
    walker.names
}

/// Names referenced as values in one expression
pub fn referenced_in_expr(expr: &Expression, interner: &Interner) -> FxHashSet<String> {
    let mut walker = Walker::new(interner, false);
    walker.expression(expr);
    walker.names
}

struct Walker<'a> {
    interner: &'a Interner,
    names: FxHashSet<String>,
    writes: bool,
}

impl<'a> Walker<'a> {
    fn new(interner: &'a Interner, writes: bool) -> Self {
        Self {
            interner,
            names: FxHashSet::default(),
            writes,
        }
    }

    /// Assignment target: a bare identifier only counts when writes do
    fn target(&mut self, expr: &Expression) {
        match expr.unwrapped() {
            Expression::Identifier(_) if !self.writes => {}
            other => self.expression(other),
        }
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VariableDecl(decl) => self.variables(decl),
            Statement::FunctionDecl(func) => {
                self.parameters(&func.params);
                self.block(&func.body);
            }
            Statement::ClassDecl(class) => {
                for member in &class.members {
                    match member {
                        ClassMember::Field(field) => {
                            if let Some(init) = &field.initializer {
                                self.expression(init);
                            }
                        }
                        ClassMember::Method(method) => {
                            self.parameters(&method.params);
                            if let Some(body) = &method.body {
                                self.block(body);
                            }
                        }
                        ClassMember::Constructor(ctor) => {
                            self.parameters(&ctor.params);
                            self.block(&ctor.body);
                        }
                    }
                }
            }
            Statement::EnumDecl(decl) => {
                for member in &decl.members {
                    if let Some(init) = &member.initializer {
                        self.expression(init);
                    }
                }
            }
            Statement::InterfaceDecl(_) | Statement::TypeAliasDecl(_) | Statement::ImportDecl(_) => {}
            Statement::ExportDecl(export) => self.statement(&export.declaration),
            Statement::Expression(expr) => self.expression(&expr.expression),
            Statement::If(stmt) => {
                self.expression(&stmt.condition);
                self.statement(&stmt.then_branch);
                if let Some(else_branch) = &stmt.else_branch {
                    self.statement(else_branch);
                }
            }
            Statement::Switch(switch) => {
                self.expression(&switch.discriminant);
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.expression(test);
                    }
                    for stmt in &case.consequent {
                        self.statement(stmt);
                    }
                }
            }
            Statement::While(stmt) => {
                self.expression(&stmt.condition);
                self.statement(&stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.statement(&stmt.body);
                self.expression(&stmt.condition);
            }
            Statement::For(stmt) => {
                match &stmt.init {
                    Some(ForInit::VariableDecl(decl)) => self.variables(decl),
                    Some(ForInit::Expression(expr)) => self.expression(expr),
                    None => {}
                }
                if let Some(test) = &stmt.test {
                    self.expression(test);
                }
                if let Some(update) = &stmt.update {
                    self.expression(update);
                }
                self.statement(&stmt.body);
            }
            Statement::ForOf(stmt) => {
                self.expression(&stmt.right);
                self.statement(&stmt.body);
            }
            Statement::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.expression(value);
                }
            }
            Statement::Throw(throw) => self.expression(&throw.value),
            Statement::Try(stmt) => {
                self.block(&stmt.body);
                if let Some(catch) = &stmt.catch_clause {
                    self.block(&catch.body);
                }
                if let Some(finally) = &stmt.finally_clause {
                    self.block(finally);
                }
            }
            Statement::Block(block) => self.block(block),
            Statement::Break(_) | Statement::Continue(_) | Statement::Empty(_) => {}
        }
    }

    fn block(&mut self, block: &BlockStatement) {
        for stmt in &block.statements {
            self.statement(stmt);
        }
    }

    fn variables(&mut self, decl: &VariableDecl) {
        for declarator in &decl.declarations {
            if let Some(init) = &declarator.initializer {
                self.expression(init);
            }
        }
    }

    fn parameters(&mut self, params: &[Parameter]) {
        for param in params {
            if let Some(default) = &param.default_value {
                self.expression(default);
            }
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Identifier(id) => {
                self.names.insert(self.interner.resolve(id.name).to_string());
            }
            Expression::IntLiteral(_)
            | Expression::FloatLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::RegexLiteral(_)
            | Expression::BooleanLiteral(_)
            | Expression::NullLiteral(_)
            | Expression::This(_)
            | Expression::Super(_) => {}
            Expression::TemplateLiteral(template) => {
                for part in &template.parts {
                    if let TemplatePart::Expression(expr) = part {
                        self.expression(expr);
                    }
                }
            }
            Expression::Array(array) => {
                for element in &array.elements {
                    match element {
                        ArrayElement::Expression(e) | ArrayElement::Spread(e) => self.expression(e),
                    }
                }
            }
            Expression::Object(object) => {
                for property in &object.properties {
                    match property {
                        ObjectProperty::Property(p) => {
                            if let PropertyKey::Computed(key) = &p.key {
                                self.expression(key);
                            }
                            self.expression(&p.value);
                        }
                        ObjectProperty::Spread(spread) => self.expression(&spread.argument),
                    }
                }
            }
            Expression::Unary(e) if e.operator.is_update() => self.target(&e.operand),
            Expression::Unary(e) => self.expression(&e.operand),
            Expression::Binary(e) => {
                self.expression(&e.left);
                self.expression(&e.right);
            }
            Expression::Assignment(e) => {
                self.target(&e.left);
                self.expression(&e.right);
            }
            Expression::Logical(e) => {
                self.expression(&e.left);
                self.expression(&e.right);
            }
            Expression::Conditional(e) => {
                self.expression(&e.test);
                self.expression(&e.consequent);
                self.expression(&e.alternate);
            }
            Expression::Call(call) => {
                self.expression(&call.callee);
                for arg in &call.arguments {
                    self.expression(arg.expression());
                }
            }
            Expression::Member(member) => self.expression(&member.object),
            Expression::Index(index) => {
                self.expression(&index.object);
                self.expression(&index.index);
            }
            Expression::New(new) => {
                self.expression(&new.callee);
                for arg in &new.arguments {
                    self.expression(arg.expression());
                }
            }
            Expression::Arrow(arrow) => {
                self.parameters(&arrow.params);
                match &arrow.body {
                    ArrowBody::Expression(body) => self.expression(body),
                    ArrowBody::Block(block) => self.block(block),
                }
            }
            Expression::Function(func) => {
                self.parameters(&func.params);
                self.block(&func.body);
            }
            Expression::Await(e) => self.expression(&e.argument),
            Expression::Typeof(e) => self.expression(&e.argument),
            Expression::Void(e) => self.expression(&e.argument),
            Expression::Delete(e) => self.expression(&e.argument),
            Expression::Parenthesized(e) => self.expression(&e.expression),
            Expression::InstanceOf(e) => self.expression(&e.object),
            Expression::In(e) => {
                self.expression(&e.key);
                self.expression(&e.object);
            }
            Expression::TypeCast(e) => self.expression(&e.object),
            Expression::NonNull(e) => self.expression(&e.expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn names(source: &str) -> FxHashSet<String> {
        let (module, interner) = Parser::new(source).unwrap().parse().unwrap();
        referenced_in(&module.statements, &interner)
    }

    #[test]
    fn test_declarations_are_not_uses() {
        let used = names("let a = 1;\nlet b = a + 2;");
        assert!(used.contains("a"));
        assert!(!used.contains("b"));
    }

    #[test]
    fn test_member_properties_are_not_uses() {
        let used = names("obj.count = total;");
        assert!(used.contains("obj"));
        assert!(used.contains("total"));
        assert!(!used.contains("count"));
    }

    #[test]
    fn test_writes_are_not_reads() {
        let source = "let a = 0;\na = 1;\na += 2;\na++;";
        assert!(!names(source).contains("a"));
        let (module, interner) = Parser::new(source).unwrap().parse().unwrap();
        assert!(touched_in(&module.statements, &interner).contains("a"));
    }

    #[test]
    fn test_nested_functions_and_templates() {
        let used = names("function f() { return `x${inner}`; }\nconst g = () => outer;");
        assert!(used.contains("inner"));
        assert!(used.contains("outer"));
        assert!(!used.contains("f"));
    }
}
