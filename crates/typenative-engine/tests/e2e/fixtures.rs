//! The fixture corpus: every program must translate; with a Go toolchain
//! present, every translation must build and run to a zero exit status

use super::harness::*;
use typenative_engine::{single_file, transpile, Report};

#[test]
fn test_every_fixture_translates() {
    let fixtures = fixtures();
    assert!(fixtures.len() >= 19, "fixture corpus is incomplete");

    let mut failures = Vec::new();
    for (name, source) in &fixtures {
        match transpile(source, &options()) {
            Ok(out) => {
                assert!(out.code.starts_with("package main\n"), "{} has no package clause", name);
                assert!(out.code.contains("func main() {"), "{} has no entry point", name);
            }
            Err(e) => {
                let files = single_file(name.clone(), source.clone());
                failures.push(Report::from_error(&e, 0).render(&files));
            }
        }
    }
    assert!(failures.is_empty(), "fixtures failed to translate:\n{}", failures.join("\n"));
}

#[test]
fn test_fixture_translation_is_deterministic() {
    for (name, source) in fixtures() {
        let first = transpile_ok(&source).code;
        let second = transpile_ok(&source).code;
        assert_eq!(first, second, "{} translated differently on a second run", name);
    }
}

#[test]
fn test_fixtures_only_import_what_they_use() {
    for (name, source) in fixtures() {
        let code = transpile_ok(&source).code;
        for package in ["strings", "strconv", "regexp", "time", "errors", "os"] {
            let imported = code.contains(&format!("\t\"{}\"\n", package));
            let used = uses_package(&code, package);
            assert_eq!(imported, used, "{}: import of {} does not match usage", name, package);
        }
    }
}

/// True when `package.` appears as a qualified reference
fn uses_package(code: &str, package: &str) -> bool {
    let needle = format!("{}.", package);
    code.match_indices(&needle).any(|(at, _)| {
        code[..at]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '.'))
    })
}

#[test]
#[ignore = "needs a Go toolchain on PATH"]
fn test_fixtures_run_under_go() {
    if !go_available() {
        eprintln!("go not found, skipping");
        return;
    }
    let mut failures = Vec::new();
    for (name, source) in fixtures() {
        let code = transpile_ok(&source).code;
        let (ok, output) = go_run(name.trim_end_matches(".ts"), &code);
        if !ok {
            failures.push(format!("{}:\n{}", name, output));
        }
    }
    assert!(failures.is_empty(), "fixtures failed under go run:\n{}", failures.join("\n\n"));
}
