//! Exceptions in the translated program and translation failures

use super::harness::*;
use typenative_engine::{transpile, TranspileError};

// ============================================================================
// try / catch / throw
// ============================================================================

#[test]
fn test_throw_and_catch() {
    expect_contains(
        "try {\n  throw new Error('boom');\n} catch (e) {\n  console.log('caught', e);\n} finally {\n  console.log('done');\n}",
        &[
            "panic(errors.New(\"boom\"))",
            "recover(); ",
            "defer func() {",
            "fmt.Println(\"done\")",
        ],
    );
}

#[test]
fn test_error_message_property() {
    expect_contains(
        "try {\n  throw new Error('bad');\n} catch (e) {\n  console.log(e.message);\n}",
        &["fmt.Sprint(e)"],
    );
}

// ============================================================================
// Translation Failures
// ============================================================================

#[test]
fn test_in_operator_is_rejected() {
    let err = expect_error("const o = { a: 1 };\nconsole.log('a' in o);", "Operator 'in' is not supported");
    assert_eq!(err.span().line, 2);
}

#[test]
fn test_logical_assignment_is_rejected() {
    expect_error("let x: number | null = null;\nx ??= 3;", "Operator '??=' is not supported");
}

#[test]
fn test_cyclic_alias_is_rejected() {
    let err = expect_error("type A = B;\ntype B = A;\nconst a: A = 1;", "is cyclic");
    assert!(matches!(err, TranspileError::CyclicTypeAlias { .. }));
}

#[test]
fn test_syntax_error_is_reported_with_location() {
    let err = transpile("const = 5;", &options()).unwrap_err();
    assert!(matches!(err, TranspileError::Parse(_)));
    assert_eq!(err.span().line, 1);
}

#[test]
fn test_strict_mode_turns_fallback_into_error() {
    let source = "const xs: number[] = [2, 1];\nxs.sort();";
    assert!(transpile(source, &options()).is_ok());
    let err = transpile(source, &options().strict(true)).unwrap_err();
    assert!(matches!(err, TranspileError::UnsupportedConstruct { .. }));
}

#[test]
fn test_no_partial_output_on_error() {
    let result = transpile("console.log(1);\nconsole.log('a' in {});", &options());
    assert!(result.is_err());
}
