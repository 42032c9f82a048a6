//! Source-annotated rendering of translation errors and diagnostics
//!
//! Wraps `codespan-reporting` so callers get the familiar
//! `error[E0101]: ...` output with the offending source line underlined.

use crate::parser::Span;
use crate::transpiler::{Diagnostic, Severity, TranspileError};
use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, Config};
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};

/// One renderable report
pub struct Report {
    inner: CsDiagnostic<usize>,
}

impl Report {
    /// Report for a fatal translation error
    pub fn from_error(error: &TranspileError, file_id: usize) -> Self {
        let label = match error {
            TranspileError::Lex(_) => "unrecognized input",
            TranspileError::Parse(_) => "syntax error",
            TranspileError::UnsupportedOperator { .. } => "no Go equivalent",
            TranspileError::CyclicTypeAlias { .. } => "alias refers back to itself",
            TranspileError::MalformedTree { .. } => "here",
            TranspileError::UnsupportedConstruct { .. } => "rejected by strict mode",
        };
        let inner = CsDiagnostic::error()
            .with_message(error.to_string())
            .with_code(error.code())
            .with_labels(vec![primary(file_id, error.span(), label)]);
        Self { inner }
    }

    /// Report for a non-fatal diagnostic
    pub fn from_diagnostic(diagnostic: &Diagnostic, file_id: usize) -> Self {
        let severity = match diagnostic.severity {
            Severity::Warning => CsSeverity::Warning,
            Severity::Note => CsSeverity::Note,
        };
        let mut inner = CsDiagnostic::new(severity)
            .with_message(diagnostic.message.clone())
            .with_labels(vec![primary(file_id, diagnostic.span, "")]);
        if let Some(help) = &diagnostic.help {
            inner.notes.push(format!("help: {}", help));
        }
        Self { inner }
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Write to any color-aware sink
    pub fn emit(
        &self,
        writer: &mut dyn WriteColor,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        term::emit(writer, &Config::default(), files, &self.inner)
    }

    /// Write to stderr, colored when the terminal supports it
    pub fn emit_stderr(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit(&mut writer, files)
    }

    /// Plain-text rendering
    pub fn render(&self, files: &SimpleFiles<String, String>) -> String {
        let mut buffer = NoColor::new(Vec::new());
        if self.emit(&mut buffer, files).is_err() {
            return self.inner.message.clone();
        }
        String::from_utf8_lossy(&buffer.into_inner()).into_owned()
    }
}

fn primary(file_id: usize, span: Span, message: &str) -> Label<usize> {
    let end = span.end.max(span.start);
    Label::primary(file_id, span.start..end).with_message(message)
}

/// File table holding one source file; its id is 0
pub fn single_file(name: impl Into<String>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(name.into(), source.into());
    files
}
