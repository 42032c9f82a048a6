//! Integration tests for the CLI driver
//!
//! Exercise manifest resolution, project scaffolding and the translate
//! stages of the commands. Nothing here needs a Go toolchain.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use typenative_cli::commands::{build, emit, new, run};
use typenative_cli::{ConfigError, Manifest, Project, MANIFEST_FILE};
use typenative_engine::TranspileOptions;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Project whose `go` binary cannot exist
fn project_without_go(dir: &Path, entry: &str) -> Project {
    let mut project = Project::resolve(dir, Some(&dir.join(entry))).unwrap();
    project.go = dir.join("no-such-go").display().to_string();
    project
}

// ============================================================================
// Project resolution
// ============================================================================

#[test]
fn test_resolve_from_manifest() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        MANIFEST_FILE,
        "[project]\nname = \"app\"\nentry = \"src/app.ts\"\n\n[build]\nout_dir = \"bin\"\n",
    );

    let project = Project::resolve(temp.path(), None).unwrap();
    assert_eq!(project.name, "app");
    assert_eq!(project.entry, temp.path().join("src/app.ts"));
    assert_eq!(project.out_dir, temp.path().join("bin"));
    assert_eq!(project.go_file(), temp.path().join("bin").join("code.go"));
    assert_eq!(project.go, "go");
}

#[test]
fn test_resolve_file_without_manifest_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("hello.ts");

    let project = Project::resolve(temp.path(), Some(&file)).unwrap();
    assert_eq!(project.name, "hello");
    assert_eq!(project.entry, file);
    assert_eq!(project.out_dir, temp.path().join("dist"));
    assert_eq!(project.options, TranspileOptions::default());
}

#[test]
fn test_explicit_file_overrides_manifest_entry() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), MANIFEST_FILE, "[project]\nname = \"app\"\n");
    let file = temp.path().join("other.ts");

    let project = Project::resolve(temp.path(), Some(&file)).unwrap();
    assert_eq!(project.name, "app");
    assert_eq!(project.entry, file);
}

#[test]
fn test_resolve_without_file_or_manifest_fails() {
    let temp = TempDir::new().unwrap();
    let err = Project::resolve(temp.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains(MANIFEST_FILE));
}

#[test]
fn test_invalid_manifest_is_reported() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), MANIFEST_FILE, "[project]\nname = \"app\"\nentry = \"main.js\"\n");
    let err = Project::resolve(temp.path(), None).unwrap_err();
    assert!(err.to_string().contains(".ts"));
}

#[test]
fn test_manifest_transpile_options_reach_project() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        MANIFEST_FILE,
        "[project]\nname = \"app\"\n\n[transpile]\nheader_comment = false\nstrict = true\n",
    );
    let project = Project::resolve(temp.path(), None).unwrap();
    assert!(project.options.strict);
    assert!(!project.options.header_comment);
}

// ============================================================================
// new
// ============================================================================

#[test]
fn test_new_scaffolds_project() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("demo");
    new::create_project(&dir, "demo").unwrap();

    assert!(dir.join("main.ts").is_file());
    assert!(dir.join(".gitignore").is_file());
    assert!(fs::read_to_string(dir.join("README.md")).unwrap().contains("# demo"));

    let manifest = Manifest::from_file(&dir.join(MANIFEST_FILE)).unwrap();
    assert_eq!(manifest.project.name, "demo");
    assert_eq!(manifest.project.entry, "main.ts");
}

#[test]
fn test_new_entry_translates() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("demo");
    new::create_project(&dir, "demo").unwrap();

    let project = Project::resolve(&dir, None).unwrap();
    let source = fs::read_to_string(&project.entry).unwrap();
    let out = typenative_engine::transpile(&source, &project.options).unwrap();
    assert!(out.code.contains("func greet(name string) string {"));
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_new_refuses_existing_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("taken");
    fs::create_dir(&dir).unwrap();
    write(&dir, "keep.txt", "mine");

    let err = new::create_project(&dir, "taken").unwrap_err();
    assert!(err.to_string().contains("already exists"));
    assert_eq!(fs::read_to_string(dir.join("keep.txt")).unwrap(), "mine");
    assert!(!dir.join(MANIFEST_FILE).exists());
}

#[test]
fn test_new_rejects_invalid_name() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("bad");
    assert!(new::create_project(&dir, "bad name").is_err());
    assert!(!dir.exists());
}

// ============================================================================
// emit
// ============================================================================

#[test]
fn test_emit_writes_go_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.ts", "console.log('hi');\n");
    let out = temp.path().join("gen").join("main.go");

    emit::execute(&temp.path().join("main.ts"), Some(&out), false, &TranspileOptions::default()).unwrap();

    let code = fs::read_to_string(out).unwrap();
    assert!(code.starts_with(typenative_engine::GENERATED_HEADER));
    assert!(code.contains("fmt.Println(\"hi\")"));
}

#[test]
fn test_emit_missing_file_fails_with_path() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.ts");
    let err = emit::execute(&missing, None, false, &TranspileOptions::default()).unwrap_err();
    assert!(err.to_string().contains("absent.ts"));
}

#[test]
fn test_emit_translation_error_writes_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.ts", "const a = 1;\nconst b = 2 in a;\n");
    let out = temp.path().join("main.go");

    let err = emit::execute(&temp.path().join("main.ts"), Some(&out), false, &TranspileOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("translation of"));
    assert!(!out.exists());
}

#[test]
fn test_emit_report_serializes_diagnostics() {
    let diagnostics = typenative_engine::transpile(
        "const xs: number[] = [2, 1];\nxs.sort();\n",
        &TranspileOptions::default(),
    )
    .unwrap()
    .diagnostics;
    let report = emit::EmitReport {
        file: "main.ts".to_string(),
        code: "package main\n",
        diagnostics: &diagnostics,
    };

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["file"], "main.ts");
    let entries = value["diagnostics"].as_array().unwrap();
    assert!(entries
        .iter()
        .any(|d| d["severity"] == "warning" && d["line"] == 2 && d["message"].as_str().unwrap().contains("sort")));
}

// ============================================================================
// build / run
// ============================================================================

#[test]
fn test_build_translation_error_skips_go() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.ts", "let x = 1;\nx ??= 2;\n");
    let project = project_without_go(temp.path(), "main.ts");

    let err = build::execute(&project, None).unwrap_err();
    // A spawn attempt would have failed with "failed to run"
    assert!(err.to_string().contains("translation of"));
    assert!(!project.go_file().exists());
}

#[test]
fn test_build_writes_go_before_invoking_toolchain() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.ts", "console.log(1);\n");
    let project = project_without_go(temp.path(), "main.ts");

    let err = build::execute(&project, Some("app".to_string())).unwrap_err();
    assert!(err.to_string().contains("failed to run"));
    assert!(fs::read_to_string(project.go_file()).unwrap().contains("package main"));
}

#[test]
fn test_run_translation_error_skips_go() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.ts", "let = ;\n");
    let project = project_without_go(temp.path(), "main.ts");

    let err = run::execute(&project, &["a".to_string()]).unwrap_err();
    assert!(err.to_string().contains("translation of"));
}

#[test]
fn test_run_reports_missing_toolchain() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "main.ts", "console.log(1);\n");
    let project = project_without_go(temp.path(), "main.ts");

    let err = run::execute(&project, &[]).unwrap_err();
    assert!(err.to_string().contains("Go toolchain"));
}
