//! Regular expressions
//!
//! A literal `/pat/flags` or `new RegExp(pat, flags)` becomes one
//! `regexp.MustCompile` call. Flags map onto RE2 inline flag groups.

use super::go_quote;

/// Inline flag group for JS regex flags; `g`, `y`, `u` and `d` have no
/// compile-time meaning in Go and are dropped
pub fn flag_prefix(flags: &str) -> String {
    let mut inline = String::new();
    for flag in ['i', 'm', 's'] {
        if flags.contains(flag) {
            inline.push(flag);
        }
    }
    if inline.is_empty() {
        String::new()
    } else {
        format!("(?{})", inline)
    }
}

/// Go literal for a pattern source, preferring raw strings
pub fn pattern_literal(pattern: &str) -> String {
    if pattern.contains('`') || pattern.contains('\n') {
        go_quote(pattern)
    } else {
        format!("`{}`", pattern)
    }
}

/// Compile a pattern known at translation time
pub fn compile_literal(pattern: &str, flags: &str) -> String {
    let source = format!("{}{}", flag_prefix(flags), pattern);
    format!("regexp.MustCompile({})", pattern_literal(&source))
}

/// Compile a pattern computed at run time
pub fn compile_dynamic(pattern: &str, flags: &str) -> String {
    let prefix = flag_prefix(flags);
    if prefix.is_empty() {
        format!("regexp.MustCompile({})", pattern)
    } else {
        format!("regexp.MustCompile({} + {})", go_quote(&prefix), pattern)
    }
}

/// Check a pattern against an RE2-family engine. Returns the engine's
/// complaint when the pattern uses syntax Go will reject at run time.
pub fn validate(pattern: &str, flags: &str) -> Option<String> {
    let source = format!("{}{}", flag_prefix(flags), pattern);
    match ::regex::Regex::new(&source) {
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    }
}
