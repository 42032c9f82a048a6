//! Program shape, variables, operators and control flow

use super::harness::*;

// ============================================================================
// Program Shape
// ============================================================================

#[test]
fn test_empty_program() {
    let code = transpile_ok("").code;
    assert_eq!(code, "package main\n\nfunc main() {\n}\n");
}

#[test]
fn test_header_comment_by_default() {
    let out = typenative_engine::transpile("console.log(1);", &Default::default()).unwrap();
    assert!(out.code.starts_with("// Code generated by typenative. DO NOT EDIT.\n\npackage main\n"));
}

#[test]
fn test_imports_follow_usage() {
    let code = expect_contains(
        "console.log(Math.sqrt(16));",
        &[
            "import (\n\t\"fmt\"\n\t\"math\"\n\t\"strconv\"\n)",
            "fmt.Println(strconv.FormatFloat(math.Sqrt(16), 'f', -1, 64))",
        ],
    );
    assert!(!code.contains("\"strings\""));
}

#[test]
fn test_library_package_uses_init() {
    let options = options().with_package("lib");
    let out = typenative_engine::transpile("console.log(1);", &options).unwrap();
    assert!(out.code.contains("package lib\n"));
    assert!(out.code.contains("func init() {"));
    assert!(!out.code.contains("func main()"));
}

// ============================================================================
// Variables and Operators
// ============================================================================

#[test]
fn test_string_concatenation_and_arithmetic() {
    expect_contains(
        "const s1: string = '123';\nconst s2: string = '456';\nconsole.log(s1 + s2);\nconst n1: number = 10;\nconst n2: number = 20;\nconsole.log(n1 + n2 - n1);",
        &["fmt.Println(s1 + s2)", "fmt.Println(strconv.FormatFloat(n1 + n2 - n1, 'f', -1, 64))"],
    );
}

#[test]
fn test_strict_equality_maps_to_go_equality() {
    expect_contains(
        "const a: number = 1;\nconsole.log(a === 1, a !== 2);",
        &["fmt.Println(a == 1, a != 2)"],
    );
}

#[test]
fn test_compound_assignment() {
    expect_contains("let total = 0;\ntotal += 5;\nconsole.log(total);", &["total += 5"]);
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_fibonacci_loop() {
    expect_contains(
        &fixture("03_fibonacci.ts"),
        &[
            "for i := float64(2); i <= n; i++ {",
            "c = a + b",
            ":= time.Now()",
            "time.Since(",
        ],
    );
}

#[test]
fn test_while_and_do_while() {
    expect_contains(
        "let count = 3;\nwhile (count > 0) {\n  count--;\n}\ndo {\n  count++;\n} while (count < 10);",
        &["for count > 0 {", "count--", "_do0 = count < 10 {"],
    );
}

#[test]
fn test_for_of_over_array() {
    expect_contains(
        "const xs: number[] = [1, 2];\nfor (const x of xs) {\n  console.log(x);\n}",
        &["for _, x := range xs {"],
    );
}

#[test]
fn test_switch_empty_case_falls_through() {
    expect_contains(
        "const n: number = 2;\nswitch (n) {\n  case 3:\n  default:\n    console.log('other');\n    break;\n}",
        &["case 3:\n\t\tfallthrough\n\tdefault:"],
    );
}

#[test]
fn test_functions_and_arrows() {
    expect_contains(
        &fixture("06_functions.ts"),
        &[
            "func add(a float64, b float64) float64 {",
            "return a + b",
            "logMessage := func(msg string) {",
            "logMessage(\"This is a test message.\")",
        ],
    );
}

#[test]
fn test_template_literals() {
    expect_contains(
        "const name: string = 'world';\nconst x: number = 5;\nconsole.log(`hello ${name}: ${x + 2}`);",
        &["\"hello \" + name + \": \" + strconv.FormatFloat(x + 2, 'f', -1, 64)"],
    );
}

#[test]
fn test_default_parameters() {
    expect_contains(
        &fixture("18_default_params.ts"),
        &[
            "func greeter(args ...interface{}) string {",
            "greeter()",
            "greeter(\"TypeNative\")",
            "func sum(args ...interface{}) float64 {",
            "sum(float64(4), float64(5))",
        ],
    );
}

#[test]
fn test_type_assertions() {
    expect_contains(
        "const v: any = 'hello';\nconst s: string = v as string;\nconst n: any = 12;\nconst m: number = <number>n;\nconsole.log(s, m);",
        &["var s string = v.(string)", "var m float64 = n.(float64)"],
    );
}

#[test]
fn test_integer_literal_past_i64() {
    expect_contains(
        "const big = 99999999999999999999999;\nconsole.log(big);",
        &["var big float64 = 1e23", "strconv.FormatFloat(big, 'f', -1, 64)"],
    );
}
