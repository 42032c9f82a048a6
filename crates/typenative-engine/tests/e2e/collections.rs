//! Arrays, strings, maps and their standard methods

use super::harness::*;

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_array_literal_push_and_index() {
    expect_contains(
        &fixture("04_arrays_loops.ts"),
        &[
            "[]float64{1, 1, 1, 1, 1, 1, 1, 1, 1}",
            "arr = append(arr, 1)",
            "arr[int(i)] = arr[int(i)] + i",
            "for _, element := range arr {",
        ],
    );
}

#[test]
fn test_combinator_chain_fixture() {
    expect_contains(
        &fixture("20_array_chaining.ts"),
        &[
            "func(n float64) float64 {",
            "return n * 2",
            "func(n float64) bool {",
            "return n > 1 && n < 5",
            "strings.Join(",
        ],
    );
}

#[test]
fn test_reduce_with_initial_value() {
    expect_contains(
        "const xs: number[] = [1, 2, 3];\nconst total = xs.reduce((acc, x) => acc + x, 0);\nconsole.log(total);",
        &["func(acc float64, x float64) float64 {", "return acc + x"],
    );
}

#[test]
fn test_unsupported_array_method_is_reported() {
    let out = transpile_ok("const xs: number[] = [3, 1];\nxs.sort();");
    assert!(!out.diagnostics.is_empty());
    assert!(out.code.contains("xs.sort()"));
}

// ============================================================================
// Strings and Math
// ============================================================================

#[test]
fn test_standard_methods_fixture() {
    expect_contains(
        &fixture("12_standard_methods.ts"),
        &[
            "strings.ToUpper(greeting)",
            "strings.ToLower(greeting)",
            "strings.TrimSpace(padded)",
            "strings.Split(csv, \",\")",
            "strings.Contains(greeting, \"World\")",
            "strings.HasPrefix(greeting, \"Hello\")",
            "strings.HasSuffix(greeting, \"!\")",
            "float64(strings.Index(greeting, \"World\"))",
            "strings.Replace(greeting, \"World\", \"Go\", 1)",
            "strings.ReplaceAll(multi, \"a\", \"b\")",
            "return string(s[i])",
            "}(greeting, 0)",
            "}(greeting, 0, 5)",
            "strings.Repeat(ab, 3)",
            "strings.Join(words, \" \")",
            "math.Ceil(1.2)",
            "math.Floor(1.5 + 0.5)",
            "math.Sqrt(9)",
            "math.Pow(2, 10)",
            "strconv.ParseInt(strings.TrimSpace(numStr), 10, 64)",
        ],
    );
}

#[test]
fn test_string_ranges_follow_js_bounds() {
    let code = transpile_ok(
        "const s = 'abc';\nconsole.log(s.slice(-2));\nconsole.log(s.substring(2, 0));\nconsole.log(s.charAt(7));",
    )
    .code;
    assert!(code.contains("}(s, int(-2))"));
    assert!(!code.contains("s[int(-2):]"));
    assert!(code.contains("start, end = end, start"));
    assert!(code.contains("}(s, 2, 0)"));
    assert!(code.contains("if i < 0 || i >= len(s) {"));
    assert!(code.contains("}(s, 7)"));
}

#[test]
fn test_array_slice_clamps_bounds() {
    let code = transpile_ok("const xs = [1, 2, 3];\nconst last = xs.slice(-1);\nconsole.log(last.length);").code;
    assert!(code.contains("last := func(s []float64, start int) []float64 {"));
    assert!(code.contains("}(xs, int(-1))"));
}

#[test]
fn test_to_string_fixture() {
    expect_contains(
        &fixture("14_to_string.ts"),
        &["strconv.FormatFloat(num2, 'f', -1, 64)", "strconv.FormatBool(flag)"],
    );
}

#[test]
fn test_template_literal_fixture() {
    expect_contains(
        &fixture("15_template_literals.ts"),
        &["\"hello \" + name", "strconv.FormatFloat(x + 2, 'f', -1, 64)"],
    );
}

// ============================================================================
// Regular Expressions
// ============================================================================

#[test]
fn test_regexp_fixture() {
    expect_contains(
        &fixture("11_regexp.ts"),
        &[
            "regexp.MustCompile(`^[a-zA-Z0-9]+@[a-zA-Z0-9]+\\.[a-zA-Z]+$`)",
            "regexp.MustCompile(`(?i)hello`)",
            "emailPattern.MatchString(\"user@example.com\")",
            "regexp.MustCompile(\"[0-9]+\")",
            "FindStringSubmatch(\"2025-02-15\")",
        ],
    );
}

#[test]
fn test_lookahead_pattern_is_reported() {
    let out = transpile_ok("const r = /a(?=b)/;\nconsole.log(r.test('ab'));");
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.message.contains("is not valid RE2 syntax")));
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn test_object_literal_without_shape_is_map() {
    expect_contains(
        "const o = { a: 1, b: 'two' };\nconsole.log(o.a);",
        &["map[string]interface{}{\"a\": float64(1), \"b\": \"two\"}", "fmt.Println(o[\"a\"])"],
    );
}
