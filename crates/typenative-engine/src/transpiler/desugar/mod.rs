//! Desugaring library
//!
//! Named text strategies for constructs with no direct Go counterpart. The
//! lowering engine lowers operands first and hands the resulting text to
//! these builders, so everything here is a pure function of its inputs.

pub mod builtins;
pub mod combinators;
pub mod enums;
pub mod optional;
pub mod promise;
pub mod regex;
pub mod template;

use super::capability::Capability;
use super::types::TypeDesc;

/// Fresh temporary names for synthesized closures
#[derive(Debug, Default)]
pub struct Temps {
    next: usize,
}

impl Temps {
    pub fn new() -> Self {
        Self::default()
    }

    /// `_{prefix}{n}`, unique within one run
    pub fn fresh(&mut self, prefix: &str) -> String {
        let name = format!("_{}{}", prefix, self.next);
        self.next += 1;
        name
    }
}

/// Go interpreted string literal for `value`
pub fn go_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\x00"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// True when `text` is a single operand that needs no parentheses
pub fn is_atomic(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return true;
    }
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' && quote != '`' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '`' | '\'' => in_string = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ' ' | '\n' if depth == 0 => return false,
            '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^' if depth == 0 => {
                // Leading unary operators on a literal are still atomic
                if !text.starts_with(c) || text[1..].contains(' ') {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

/// Parenthesize `text` unless it is already atomic
pub fn paren(text: &str) -> String {
    if is_atomic(text) {
        text.to_string()
    } else {
        format!("({})", text)
    }
}

/// Boolean Go expression testing the truthiness of a value of type `ty`
pub fn truthy(text: &str, ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Boolean => text.to_string(),
        TypeDesc::Number | TypeDesc::Enum(_) => format!("{} != 0", paren(text)),
        TypeDesc::String => format!("{} != \"\"", paren(text)),
        TypeDesc::Struct(_) | TypeDesc::TypeParam(_) | TypeDesc::Void => "true".to_string(),
        _ => format!("{} != nil", paren(text)),
    }
}

/// Go string expression for a value of type `ty`, formatted the way
/// JavaScript prints it, with the packages the text references.
///
/// Numbers never switch to exponent form below 1e21, and a nil `*T`
/// prints as `null`.
pub fn stringify(text: &str, ty: &TypeDesc) -> (String, Vec<Capability>) {
    match ty {
        TypeDesc::String => (text.to_string(), Vec::new()),
        TypeDesc::Number => (format_number(text), vec![Capability::Strconv]),
        TypeDesc::Nilable(inner) => {
            let (value, capabilities) = stringify("*p", inner);
            (
                format!(
                    "func(p {}) string {{\nif p == nil {{\nreturn \"null\"\n}}\nreturn {}\n}}({})",
                    ty.go_type(),
                    value,
                    text
                ),
                capabilities,
            )
        }
        _ => (format!("fmt.Sprint({})", text), vec![Capability::Fmt]),
    }
}

/// `strconv.FormatFloat` in the shortest non-exponent form
pub fn format_number(text: &str) -> String {
    format!("strconv.FormatFloat({}, 'f', -1, 64)", text)
}

/// Argument of a `console` call. Strings, booleans and short decimal
/// literals print the same through `fmt.Println`; numbers and nilable
/// values go through `stringify`.
pub fn printable(text: &str, ty: &TypeDesc) -> (String, Vec<Capability>) {
    match ty {
        TypeDesc::Number if is_plain_decimal(text) => (text.to_string(), Vec::new()),
        TypeDesc::Number | TypeDesc::Nilable(_) => stringify(text, ty),
        _ => (text.to_string(), Vec::new()),
    }
}

/// Decimal literal printed identically by Go and JavaScript
fn is_plain_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.len() <= 15
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && !digits.starts_with('.')
        && !digits.ends_with('.')
        && !(digits.contains('.') && digits.ends_with('0'))
}

/// Integer index expression for a float64 operand; integer literals pass
/// through unchanged
pub fn int_index(text: &str) -> String {
    if text.parse::<u64>().is_ok() {
        text.to_string()
    } else {
        format!("int({})", text)
    }
}

/// How the bounds of a range method are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    /// `slice`: negative bounds count from the end, a reversed range is empty
    Relative,
    /// `substring`: negative bounds are 0, a reversed range swaps
    Swapping,
}

/// `receiver[start:end]` with both bounds clamped to the length, so no
/// index can panic. `go_type` is `string` or a slice type; slices are
/// copied. `start` and `end` are already `int` expressions.
pub fn clamped_range(go_type: &str, receiver: &str, start: &str, end: Option<&str>, bounds: Bounds) -> String {
    let mut params = vec!["s ".to_string() + go_type, "start int".to_string()];
    let mut args = vec![receiver.to_string(), start.to_string()];
    let mut body = String::new();
    match end {
        Some(end) => {
            params.push("end int".to_string());
            args.push(end.to_string());
        }
        None => body.push_str("end := len(s)\n"),
    }
    for bound in ["start", "end"] {
        if bounds == Bounds::Relative {
            body.push_str(&format!("if {b} < 0 {{\n{b} += len(s)\n}}\n", b = bound));
        }
        body.push_str(&format!(
            "if {b} < 0 {{\n{b} = 0\n}}\nif {b} > len(s) {{\n{b} = len(s)\n}}\n",
            b = bound
        ));
    }
    body.push_str(match bounds {
        Bounds::Relative => "if end < start {\nend = start\n}\n",
        Bounds::Swapping => "if end < start {\nstart, end = end, start\n}\n",
    });
    let result = if go_type == "string" {
        "s[start:end]".to_string()
    } else {
        format!("append({}{{}}, s[start:end]...)", go_type)
    };
    format!(
        "func({}) {} {{\n{}return {}\n}}({})",
        params.join(", "),
        go_type,
        body,
        result,
        args.join(", ")
    )
}

/// Byte of `receiver` at `index` through `read`, or `missing` when the
/// index is out of range
pub fn checked_byte(receiver: &str, index: &str, go_type: &str, read: &str, missing: &str) -> String {
    format!(
        "func(s string, i int) {ty} {{\nif i < 0 || i >= len(s) {{\nreturn {missing}\n}}\nreturn {read}\n}}({receiver}, {index})",
        ty = go_type,
        missing = missing,
        read = read,
        receiver = receiver,
        index = index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_are_unique() {
        let mut temps = Temps::new();
        assert_eq!(temps.fresh("v"), "_v0");
        assert_eq!(temps.fresh("v"), "_v1");
        assert_eq!(temps.fresh("a"), "_a2");
    }

    #[test]
    fn test_go_quote_escapes() {
        assert_eq!(go_quote("hi"), "\"hi\"");
        assert_eq!(go_quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(go_quote("line\nnext\\"), "\"line\\nnext\\\\\"");
    }

    #[test]
    fn test_atomic_operands() {
        assert!(is_atomic("x"));
        assert!(is_atomic("obj.items[int(i)]"));
        assert!(is_atomic("f(a + b)"));
        assert!(is_atomic("\"a b\""));
        assert!(is_atomic("-5"));
        assert!(!is_atomic("a + b"));
        assert!(!is_atomic("a+b"));
        assert_eq!(paren("a + b"), "(a + b)");
        assert_eq!(paren("n"), "n");
    }

    #[test]
    fn test_truthiness_by_type() {
        assert_eq!(truthy("ok", &TypeDesc::Boolean), "ok");
        assert_eq!(truthy("n", &TypeDesc::Number), "n != 0");
        assert_eq!(truthy("a + b", &TypeDesc::String), "(a + b) != \"\"");
        assert_eq!(truthy("user", &TypeDesc::class("User")), "user != nil");
    }

    #[test]
    fn test_stringify_by_type() {
        assert_eq!(stringify("name", &TypeDesc::String), ("name".to_string(), vec![]));
        assert_eq!(
            stringify("n", &TypeDesc::Number),
            ("strconv.FormatFloat(n, 'f', -1, 64)".to_string(), vec![Capability::Strconv])
        );
        assert_eq!(stringify("ok", &TypeDesc::Boolean).0, "fmt.Sprint(ok)");
    }

    #[test]
    fn test_stringify_nilable_prints_null() {
        let (text, capabilities) = stringify("n", &TypeDesc::nilable(TypeDesc::Number));
        assert_eq!(
            text,
            "func(p *float64) string {\nif p == nil {\nreturn \"null\"\n}\nreturn strconv.FormatFloat(*p, 'f', -1, 64)\n}(n)"
        );
        assert_eq!(capabilities, vec![Capability::Strconv]);

        let (text, capabilities) = stringify("s", &TypeDesc::nilable(TypeDesc::String));
        assert!(text.contains("return *p\n}(s)"));
        assert!(capabilities.is_empty());
    }

    #[test]
    fn test_printable_arguments() {
        assert_eq!(printable("5", &TypeDesc::Number).0, "5");
        assert_eq!(printable("-2.5", &TypeDesc::Number).0, "-2.5");
        assert_eq!(printable("x", &TypeDesc::Number).0, "strconv.FormatFloat(x, 'f', -1, 64)");
        assert_eq!(printable("1000000 * 1000000", &TypeDesc::Number).0, "strconv.FormatFloat(1000000 * 1000000, 'f', -1, 64)");
        assert_eq!(printable("\"hi\"", &TypeDesc::String).0, "\"hi\"");
        assert_eq!(printable("ok", &TypeDesc::Boolean).0, "ok");
        assert!(printable("n", &TypeDesc::nilable(TypeDesc::Number)).0.contains("return \"null\""));
    }

    #[test]
    fn test_index_conversion() {
        assert_eq!(int_index("0"), "0");
        assert_eq!(int_index("i"), "int(i)");
        assert_eq!(int_index("i + 1"), "int(i + 1)");
    }

    #[test]
    fn test_relative_range_counts_from_end() {
        let text = clamped_range("string", "s", "-2", None, Bounds::Relative);
        assert!(text.starts_with("func(s string, start int) string {\nend := len(s)\n"));
        assert!(text.contains("if start < 0 {\nstart += len(s)\n}\nif start < 0 {\nstart = 0\n}"));
        assert!(text.contains("if end < start {\nend = start\n}\nreturn s[start:end]\n}(s, -2)"));
    }

    #[test]
    fn test_swapping_range_clamps_and_swaps() {
        let text = clamped_range("string", "word", "4", Some("1"), Bounds::Swapping);
        assert!(text.starts_with("func(s string, start int, end int) string {\n"));
        assert!(!text.contains("+= len(s)"));
        assert!(text.contains("if end > len(s) {\nend = len(s)\n}"));
        assert!(text.contains("start, end = end, start"));
        assert!(text.ends_with("}(word, 4, 1)"));
    }

    #[test]
    fn test_slice_range_is_copied() {
        let text = clamped_range("[]float64", "xs", "1", Some("3"), Bounds::Relative);
        assert!(text.starts_with("func(s []float64, start int, end int) []float64 {"));
        assert!(text.contains("return append([]float64{}, s[start:end]...)"));
    }

    #[test]
    fn test_checked_byte_guards_range() {
        assert_eq!(
            checked_byte("s", "9", "string", "string(s[i])", "\"\""),
            "func(s string, i int) string {\nif i < 0 || i >= len(s) {\nreturn \"\"\n}\nreturn string(s[i])\n}(s, 9)"
        );
    }
}
