//! Test harness for end-to-end translation
//!
//! Provides helpers that translate a source string and check the Go output,
//! plus access to the fixture corpus and an optional Go toolchain.

use std::path::{Path, PathBuf};
use std::process::Command;
use typenative_engine::{
    single_file, transpile, Report, Transpilation, TranspileError, TranspileOptions,
};

/// Options used by every e2e test: no header line, so expected text starts
/// at the package clause
pub fn options() -> TranspileOptions {
    TranspileOptions {
        header_comment: false,
        ..Default::default()
    }
}

/// Translate, panicking with a rendered report on failure
pub fn transpile_ok(source: &str) -> Transpilation {
    match transpile(source, &options()) {
        Ok(out) => out,
        Err(e) => {
            let files = single_file("test.ts", source);
            panic!(
                "Translation failed:\n{}\nSource:\n{}",
                Report::from_error(&e, 0).render(&files),
                source
            );
        }
    }
}

/// Translate and require every pattern to appear in the output
pub fn expect_contains(source: &str, patterns: &[&str]) -> String {
    let code = transpile_ok(source).code;
    for pattern in patterns {
        assert!(
            code.contains(pattern),
            "Expected output to contain:\n{}\n\nGot:\n{}",
            pattern,
            code
        );
    }
    code
}

/// Translate and require none of the patterns to appear
pub fn expect_absent(source: &str, patterns: &[&str]) {
    let code = transpile_ok(source).code;
    for pattern in patterns {
        assert!(
            !code.contains(pattern),
            "Expected output not to contain:\n{}\n\nGot:\n{}",
            pattern,
            code
        );
    }
}

/// Require translation to fail with a message containing `pattern`
pub fn expect_error(source: &str, pattern: &str) -> TranspileError {
    match transpile(source, &options()) {
        Ok(out) => panic!(
            "Expected error containing '{}', but translation succeeded:\n{}",
            pattern, out.code
        ),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(pattern),
                "Expected error containing '{}', got: {}\nSource:\n{}",
                pattern,
                message,
                source
            );
            e
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Every fixture as (file name, source), sorted by name
pub fn fixtures() -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = std::fs::read_dir(fixtures_dir())
        .expect("fixtures directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ts"))
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let source = std::fs::read_to_string(&path).expect("readable fixture");
            (name, source)
        })
        .collect();
    out.sort();
    out
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name)).expect("fixture exists")
}

// ============================================================================
// Go toolchain
// ============================================================================

/// True when a `go` binary answers `go version`
pub fn go_available() -> bool {
    Command::new("go")
        .arg("version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Write `code` into a fresh module directory and `go run` it. Returns the
/// exit status success flag with combined output.
pub fn go_run(name: &str, code: &str) -> (bool, String) {
    let dir = std::env::temp_dir().join(format!("typenative-e2e-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let file = dir.join("code.go");
    std::fs::write(&file, code).expect("write go source");
    let out = Command::new("go")
        .arg("run")
        .arg(&file)
        .current_dir(&dir)
        .output()
        .expect("spawn go");
    let _ = std::fs::remove_dir_all(&dir);
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    (out.status.success(), text)
}
