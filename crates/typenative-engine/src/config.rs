//! Translation options
//!
//! Deserializable from the `[transpile]` table of a project manifest.

use serde::{Deserialize, Serialize};

/// Header line emitted at the top of generated files
pub const GENERATED_HEADER: &str = "// Code generated by typenative. DO NOT EDIT.";

/// Options for one translation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranspileOptions {
    /// Go package clause. Anything other than `main` gets `func init()`
    /// instead of `func main()`.
    #[serde(default = "default_package")]
    pub package: String,

    /// Emit the generated-code header line
    #[serde(default = "default_true")]
    pub header_comment: bool,

    /// Turn every fallback diagnostic into a translation error
    #[serde(default)]
    pub strict: bool,
}

fn default_package() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            package: default_package(),
            header_comment: true,
            strict: false,
        }
    }
}

impl TranspileOptions {
    /// Name of the function holding the top-level statements
    pub fn entry_point(&self) -> &'static str {
        if self.package == "main" {
            "main"
        } else {
            "init"
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TranspileOptions::default();
        assert_eq!(options.package, "main");
        assert!(options.header_comment);
        assert!(!options.strict);
        assert_eq!(options.entry_point(), "main");
    }

    #[test]
    fn test_library_package_uses_init() {
        let options = TranspileOptions::default().with_package("lib");
        assert_eq!(options.entry_point(), "init");
    }

    #[test]
    fn test_partial_table_fills_defaults() {
        let options: TranspileOptions = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert_eq!(options, TranspileOptions::default().strict(true));
    }
}
