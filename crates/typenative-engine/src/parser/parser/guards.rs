//! Parser guards against runaway loops and unbounded recursion

use super::ParseError;
use crate::parser::token::Span;

/// Iterations any single parser loop may take
const MAX_LOOP_ITERATIONS: usize = 100_000;

/// Statement/expression nesting accepted before the parse is rejected.
///
/// Kept low enough that debug builds on test threads do not overflow the
/// stack; arrow bodies and object literals nest several frames per level.
pub const MAX_PARSE_DEPTH: usize = 32;

/// Counts loop iterations and fails once the limit is hit.
///
/// ```ignore
/// let mut guard = LoopGuard::new("class_members");
/// while !parser.check(&Token::RightBrace) {
///     guard.check()?;
///     // ...
/// }
/// ```
pub struct LoopGuard {
    name: &'static str,
    count: usize,
    max: usize,
}

impl LoopGuard {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            count: 0,
            max: MAX_LOOP_ITERATIONS,
        }
    }

    #[inline]
    pub fn with_limit(name: &'static str, max: usize) -> Self {
        Self { name, count: 0, max }
    }

    #[inline]
    pub fn check(&mut self) -> Result<(), ParseError> {
        self.count += 1;
        if self.count > self.max {
            return Err(ParseError::parser_limit_exceeded(
                format!("Loop '{}' exceeded {} iterations", self.name, self.max),
                Span::default(),
            ));
        }
        Ok(())
    }
}

/// Fails when `depth` is already at the nesting limit.
#[inline]
pub fn check_depth(depth: usize, name: &'static str, span: Span) -> Result<(), ParseError> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(ParseError::parser_limit_exceeded(
            format!("Maximum nesting depth ({}) exceeded in {}", MAX_PARSE_DEPTH, name),
            span,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_guard_under_limit() {
        let mut guard = LoopGuard::with_limit("test", 10);
        for _ in 0..10 {
            assert!(guard.check().is_ok());
        }
    }

    #[test]
    fn test_loop_guard_exceeds_limit() {
        let mut guard = LoopGuard::with_limit("test", 3);
        for _ in 0..3 {
            let _ = guard.check();
        }
        assert!(guard.check().is_err());
    }

    #[test]
    fn test_check_depth() {
        assert!(check_depth(0, "expression", Span::default()).is_ok());
        assert!(check_depth(MAX_PARSE_DEPTH, "expression", Span::default()).is_err());
    }
}
