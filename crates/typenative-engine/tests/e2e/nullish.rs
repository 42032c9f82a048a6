//! Nullable values, optional chaining and nullish coalescing

use super::harness::*;

#[test]
fn test_nullable_primitives_are_pointers() {
    expect_contains(
        "const a: string | null = null;\nconst b: number | undefined = undefined;\nconsole.log(a === null, b === undefined);",
        &["var a *string = nil", "var b *float64 = nil", "fmt.Println(a == nil, b == nil)"],
    );
}

#[test]
fn test_nullable_with_value_takes_address() {
    let code = transpile_ok("const c: string | null = 'hello';\nconsole.log(c !== null);").code;
    assert!(code.contains("var c *string = "));
    assert!(code.contains("c != nil"));
    assert!(!code.contains("var c *string = \"hello\""));
}

#[test]
fn test_null_compared_with_value_kind_folds() {
    expect_contains("console.log(1 === null, 'a' !== null);", &["fmt.Println(false, true)"]);
}

#[test]
fn test_folded_null_comparison_still_reads_variable() {
    expect_contains(
        "const n: number = 1;\nconsole.log(n === null, n !== null);",
        &["\tfmt.Println(func() bool {\n\t\t_ = n\n\t\treturn false\n\t}(), func() bool {\n\t\t_ = n\n\t\treturn true\n\t}())\n"],
    );
}

#[test]
fn test_folded_typeof_still_reads_variable() {
    expect_contains(
        "const s: string = 'x';\nconsole.log(typeof s);",
        &["_ = s", "return \"string\""],
    );
}

#[test]
fn test_nullable_number_prints_value_or_null() {
    let code = transpile_ok("let n: number | null = 5;\nconsole.log(n);\nconsole.log(`v=${n}`);\nn = null;\nconsole.log(n);").code;
    assert!(code.contains("\tfmt.Println(func(p *float64) string {\n\t\tif p == nil {\n\t\t\treturn \"null\"\n\t\t}\n\t\treturn strconv.FormatFloat(*p, 'f', -1, 64)\n\t}(n))\n"));
    assert!(code.contains("fmt.Println(\"v=\" + func(p *float64) string {"));
    assert!(!code.contains("fmt.Println(n)"));
    assert!(code.contains("\"strconv\""));
}

#[test]
fn test_nullable_string_prints_value_or_null() {
    let code = transpile_ok("const s: string | null = 'hi';\nconsole.log(s);").code;
    assert!(code.contains("func(p *string) string {"));
    assert!(code.contains("return *p\n"));
    assert!(!code.contains("fmt.Println(s)"));
}

#[test]
fn test_nullish_coalescing_fixture() {
    expect_contains(
        &fixture("17_optional_nullish.ts"),
        &[
            "var nullableText *string = nil",
            "return \"default\"",
            "return \"unknown\"",
            "== nil {",
            ".getName()",
        ],
    );
}

#[test]
fn test_nullish_alias_fixture() {
    expect_contains(
        &fixture("16_aliases_assertions.ts"),
        &[
            "var id float64 = 7",
            "var maybeName *string = nil",
            "return \"anonymous\"",
            "sourceAny.(string)",
            "sourceAny2.(float64)",
        ],
    );
}

#[test]
fn test_non_null_assertion_is_transparent() {
    expect_contains(
        "const xs: number[] = [1];\nconst y = xs!;\nconsole.log(y);",
        &["y := xs"],
    );
}
