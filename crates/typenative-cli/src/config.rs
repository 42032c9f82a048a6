//! Project manifest parsing (typenative.toml)
//!
//! A manifest names the entry file, where generated Go goes and which `go`
//! binary builds it. The `[transpile]` table is handed to the engine as-is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use typenative_engine::TranspileOptions;

/// Manifest file name looked up in the project directory
pub const MANIFEST_FILE: &str = "typenative.toml";

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid manifest: {0}")]
    Validation(String),
}

/// Project manifest (typenative.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub project: ProjectSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub transpile: TranspileOptions,
}

/// `[project]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSection {
    /// Project name, also the default binary name
    pub name: String,

    /// Entry file relative to the manifest (defaults to "main.ts")
    #[serde(default = "default_entry")]
    pub entry: String,
}

/// `[build]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildSection {
    /// Output directory relative to the manifest
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Go toolchain binary
    #[serde(default = "default_go")]
    pub go: String,
}

fn default_entry() -> String {
    "main.ts".to_string()
}

fn default_out_dir() -> String {
    "dist".to_string()
}

fn default_go() -> String {
    "go".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            go: default_go(),
        }
    }
}

impl Manifest {
    /// Manifest for a project with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: ProjectSection {
                name: name.into(),
                entry: default_entry(),
            },
            build: BuildSection::default(),
            transpile: TranspileOptions::default(),
        }
    }

    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_name(&self.project.name) {
            return Err(ConfigError::Validation(format!(
                "Invalid project name: '{}'. Must contain only alphanumeric characters, hyphens and underscores",
                self.project.name
            )));
        }
        if !self.project.entry.ends_with(".ts") {
            return Err(ConfigError::Validation(format!(
                "Entry file must be a .ts file, got '{}'",
                self.project.entry
            )));
        }
        if self.build.out_dir.trim().is_empty() {
            return Err(ConfigError::Validation("build.out_dir cannot be empty".to_string()));
        }
        if self.build.go.trim().is_empty() {
            return Err(ConfigError::Validation("build.go cannot be empty".to_string()));
        }
        if !is_go_identifier(&self.transpile.package) {
            return Err(ConfigError::Validation(format!(
                "transpile.package '{}' is not a valid Go package name",
                self.transpile.package
            )));
        }
        Ok(())
    }

    /// Write manifest to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Validation(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn is_go_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// Project resolution
// ============================================================================

/// Everything a command needs to translate and build one entry file
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Directory holding the manifest, or the current directory
    pub root: PathBuf,
    pub name: String,
    pub entry: PathBuf,
    pub out_dir: PathBuf,
    pub go: String,
    pub options: TranspileOptions,
}

impl Project {
    /// Resolve from an explicit source file and/or the manifest in `dir`.
    ///
    /// With an explicit file a missing manifest is not an error: defaults
    /// apply. Without one the manifest is required.
    pub fn resolve(dir: &Path, file: Option<&Path>) -> Result<Self, ConfigError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = if manifest_path.is_file() {
            Some(Manifest::from_file(&manifest_path)?)
        } else {
            None
        };

        let manifest = match (manifest, file) {
            (Some(manifest), _) => manifest,
            (None, Some(file)) => Manifest::new(default_name(file)),
            (None, None) => {
                return Err(ConfigError::Validation(format!(
                    "no source file given and no {} in {}",
                    MANIFEST_FILE,
                    dir.display()
                )))
            }
        };

        let entry = match file {
            Some(file) => file.to_path_buf(),
            None => dir.join(&manifest.project.entry),
        };
        Ok(Self {
            root: dir.to_path_buf(),
            name: manifest.project.name,
            entry,
            out_dir: dir.join(&manifest.build.out_dir),
            go: manifest.build.go,
            options: manifest.transpile,
        })
    }

    /// Path of the generated Go file
    pub fn go_file(&self) -> PathBuf {
        self.out_dir.join("code.go")
    }
}

/// Binary name derived from a source file: its stem, or "native"
fn default_name(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| is_valid_name(s))
        .unwrap_or("native")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::parse("[project]\nname = \"app\"\n").unwrap();
        assert_eq!(manifest.project.entry, "main.ts");
        assert_eq!(manifest.build.out_dir, "dist");
        assert_eq!(manifest.build.go, "go");
        assert_eq!(manifest.transpile, TranspileOptions::default());
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::parse(
            r#"
[project]
name = "tool"
entry = "src/index.ts"

[build]
out_dir = "out"
go = "/usr/local/go/bin/go"

[transpile]
package = "main"
header_comment = false
strict = true
"#,
        )
        .unwrap();
        assert_eq!(manifest.project.entry, "src/index.ts");
        assert_eq!(manifest.build.out_dir, "out");
        assert!(manifest.transpile.strict);
        assert!(!manifest.transpile.header_comment);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = Manifest::parse("[project]\nname = \"my app\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_package_rejected() {
        let err = Manifest::parse("[project]\nname = \"a\"\n[transpile]\npackage = \"1x\"\n").unwrap_err();
        assert!(err.to_string().contains("not a valid Go package name"));
    }

    #[test]
    fn test_missing_project_table_is_parse_error() {
        let err = Manifest::parse("[build]\nout_dir = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_manifest_round_trips_through_toml() {
        let manifest = Manifest::new("demo");
        let text = toml::to_string_pretty(&manifest).unwrap();
        assert_eq!(Manifest::parse(&text).unwrap(), manifest);
    }

    #[test]
    fn test_default_name_from_file() {
        assert_eq!(default_name(Path::new("dir/hello.ts")), "hello");
        assert_eq!(default_name(Path::new("dir/my file.ts")), "native");
    }
}
