//! Syntax tree to Go lowering
//!
//! The `Lowerer` owns every per-run table. Lowering happens in two passes
//! over the module: executable top-level statements become the body of the
//! entry point, then the hoisted declarations are lowered against the fully
//! populated environment. `impl Lowerer` blocks are split by node family.

mod call;
mod class;
mod expr;
mod function;
mod stmt;

pub(crate) use function::FnBody;

use super::capability::{Capabilities, Capability};
use super::context::LowerCtx;
use super::desugar::builtins::Rewrite;
use super::desugar::{self, Temps};
use super::env::Env;
use super::error::{TranspileError, TranspileResult};
use super::types::TypeDesc;
use super::{format, hoist, usage, Diagnostic, Transpilation};
use crate::config::{TranspileOptions, GENERATED_HEADER};
use crate::parser::ast::{Module, Statement, TypeAnnotation};
use crate::parser::{Interner, Span, Symbol};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Per-run translation state
pub struct Lowerer {
    /// Interner of the parsed module; synthesized temporaries are added to it
    pub(super) interner: Interner,
    pub(super) options: TranspileOptions,
    pub(super) env: Env,
    pub(super) caps: Capabilities,
    pub(super) temps: Temps,
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Lowered package-level declarations, in emission order
    pub(super) hoisted: Vec<String>,
    /// Package-level `var` entries
    pub(super) globals: Vec<String>,
    /// Top-level variables that hoisted declarations read
    pub(super) lifted: FxHashSet<String>,
    /// Names read by each enclosing function body, innermost last
    pub(super) used: Vec<FxHashSet<String>>,
    /// Enclosing class declarations, innermost last
    pub(super) classes: Vec<String>,
    /// `console.time` label to its start-time variable
    pub(super) timers: FxHashMap<String, String>,
    /// Field initializers waiting for the `super(...)` call of a derived
    /// constructor
    pub(super) pending_field_inits: Option<Vec<String>>,
}

impl Lowerer {
    pub fn new(interner: Interner, options: TranspileOptions) -> Self {
        Self {
            interner,
            options,
            env: Env::new(),
            caps: Capabilities::new(),
            temps: Temps::new(),
            diagnostics: Vec::new(),
            hoisted: Vec::new(),
            globals: Vec::new(),
            lifted: FxHashSet::default(),
            used: Vec::new(),
            classes: Vec::new(),
            timers: FxHashMap::default(),
            pending_field_inits: None,
        }
    }

    /// Lower a whole module to one Go source file
    pub fn lower_module(mut self, module: &Module) -> TranspileResult<Transpilation> {
        let (declarations, executable) = hoist::split(&module.statements);
        debug!(
            declarations = declarations.len(),
            executable = executable.len(),
            "hoist"
        );

        // Every top-level descriptor exists before any body is lowered
        self.register_declarations(&declarations)?;

        let top_level: FxHashSet<String> = executable
            .iter()
            .filter_map(|stmt| match stmt {
                Statement::VariableDecl(decl) => Some(decl),
                _ => None,
            })
            .flat_map(|decl| decl.declarations.iter())
            .map(|d| self.interner.resolve(d.name.name).to_string())
            .collect();
        let mut lifted = usage::touched_in(declarations.iter().copied(), &self.interner);
        lifted.retain(|name| top_level.contains(name));
        self.lifted = lifted;

        debug!(entry = self.options.entry_point(), "lower entry point");
        self.used
            .push(usage::referenced_in(executable.iter().copied(), &self.interner));
        let body = self.lower_statements(&executable, &LowerCtx::default())?;
        self.used.pop();

        for decl in &declarations {
            let text = self.lower_declaration(decl, &LowerCtx::hoisted())?;
            if !text.is_empty() {
                self.hoisted.push(text);
            }
        }

        debug!(
            hoisted = self.hoisted.len(),
            diagnostics = self.diagnostics.len(),
            "assemble"
        );
        Ok(self.assemble(body))
    }

    /// Header, package clause, imports, globals, entry point, declarations
    fn assemble(self, body: Vec<String>) -> Transpilation {
        let mut out: Vec<String> = Vec::new();
        if self.options.header_comment {
            out.push(GENERATED_HEADER.to_string());
            out.push(String::new());
        }
        out.push(format!("package {}", self.options.package));
        out.push(String::new());

        if let Some(imports) = self.caps.into_import_block() {
            out.push(imports);
            out.push(String::new());
        }

        if !self.globals.is_empty() {
            out.push("var (".to_string());
            out.extend(self.globals);
            out.push(")".to_string());
            out.push(String::new());
        }

        out.push(format!("func {}() {{", self.options.entry_point()));
        out.extend(body);
        out.push("}".to_string());

        for decl in self.hoisted {
            out.push(String::new());
            out.push(decl);
        }

        Transpilation {
            code: format::reindent(&out.join("\n")),
            diagnostics: self.diagnostics,
        }
    }

    // ========================================================================
    // Helpers shared by the lowering rules
    // ========================================================================

    pub(super) fn text(&self, symbol: Symbol) -> String {
        self.interner.resolve(symbol).to_string()
    }

    /// Go spelling of a source identifier
    pub(super) fn go_ident(&mut self, symbol: Symbol) -> String {
        let name = self.interner.resolve(symbol).to_string();
        self.env.go_name(&name)
    }

    pub(super) fn require(&mut self, capability: Capability) {
        self.caps.require(capability);
    }

    /// Stringify a lowered value, registering the packages the text uses
    pub(super) fn stringified(&mut self, text: &str, ty: &TypeDesc) -> String {
        let (text, capabilities) = desugar::stringify(text, ty);
        for capability in capabilities {
            self.require(capability);
        }
        text
    }

    /// Register the packages a rewrite needs and take its text
    pub(super) fn apply(&mut self, rewrite: Rewrite) -> String {
        for capability in &rewrite.capabilities {
            self.caps.require(*capability);
        }
        rewrite.text
    }

    pub(super) fn fresh(&mut self, prefix: &str) -> String {
        self.temps.fresh(prefix)
    }

    pub(super) fn resolve_type(&self, annotation: &TypeAnnotation) -> TranspileResult<TypeDesc> {
        self.env.resolve(annotation, &self.interner)
    }

    pub(super) fn resolve_opt(&self, annotation: Option<&TypeAnnotation>) -> TranspileResult<Option<TypeDesc>> {
        annotation.map(|a| self.resolve_type(a)).transpose()
    }

    /// True when the innermost function body reads `name`
    pub(super) fn is_used(&self, name: &str) -> bool {
        self.used.last().map_or(true, |names| names.contains(name))
    }

    /// Record the explicit fallback for a construct with no lowering rule.
    /// Strict mode turns it into an error.
    pub(super) fn fallback(&mut self, construct: &str, span: Span) -> TranspileResult<()> {
        if self.options.strict {
            return Err(TranspileError::UnsupportedConstruct {
                construct: construct.to_string(),
                span,
            });
        }
        warn!(construct, line = span.line, column = span.column, "no lowering rule, lowering parts as-is");
        self.diagnostics.push(
            Diagnostic::warning(format!("{} is not supported; its parts were lowered as-is", construct), span)
                .with_help("the emitted Go may not compile or may behave differently"),
        );
        Ok(())
    }

    /// Non-fatal note about the emitted code
    pub(super) fn warn(&mut self, message: impl Into<String>, span: Span) {
        let message = message.into();
        warn!(line = span.line, column = span.column, "{}", message);
        self.diagnostics.push(Diagnostic::warning(message, span));
    }
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
    fn test_empty_module() {
        assert_eq!(go(""), "package main\n\nfunc main() {\n}\n");
    }

    #[test]
    fn test_header_and_library_package() {
        let options = TranspileOptions::default().with_package("lib");
        let code = transpile("let x = 1;", &options).unwrap().code;
        assert!(code.starts_with("// Code generated by typenative. DO NOT EDIT.\n\npackage lib\n"));
        assert!(code.contains("func init() {"));
    }

    #[test]
    fn test_imports_only_for_used_packages() {
        let code = go("console.log(\"hi\");");
        assert!(code.contains("import (\n\t\"fmt\"\n)"));
        assert!(!code.contains("\"math\""));
    }

    #[test]
    fn test_declarations_follow_entry_point() {
        let code = go("greet();\nfunction greet(): void { console.log(\"hi\"); }");
        let main = code.find("func main()").unwrap();
        let greet = code.find("func greet()").unwrap();
        assert!(main < greet);
        assert!(code.contains("\tgreet()\n"));
    }

    #[test]
    fn test_top_level_variables_read_by_functions_are_lifted() {
        let code = go("let count = 0;\nfunction bump(): void { count++; }\nbump();");
        assert!(code.contains("var (\n\tcount float64\n)"));
        assert!(code.contains("\tcount = 0\n"));
        assert!(code.contains("\tcount++\n"));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let source = "const xs = [1, 2, 3].map(x => x * 2);\nconsole.log(xs.join(\"-\"));";
        assert_eq!(go(source), go(source));
    }
}
