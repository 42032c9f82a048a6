//! Output serializer
//!
//! Lowering produces unindented lines. `reindent` walks them once and
//! applies gofmt-style tab indentation based on bracket nesting, ignoring
//! brackets inside string, rune and raw string literals.

/// Re-indent Go source produced by the lowering rules.
///
/// A line that leaves brackets open indents what follows by one level, no
/// matter how many it opened, so `f(func() {` nests its body once. The
/// line that closes any of them returns to the opening line's level.
pub fn reindent(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut levels = Levels::default();
    let mut in_raw_string = false;
    let mut blank_run = 0;

    for raw_line in source.lines() {
        if in_raw_string {
            // Raw string contents are emitted verbatim
            out.push_str(raw_line);
            out.push('\n');
            let (brackets, still_raw) = scan_brackets(raw_line, true);
            in_raw_string = still_raw;
            let level = levels.depth();
            levels.apply(&brackets, level);
            continue;
        }

        let line = raw_line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() && !out.ends_with("{\n") {
                out.push('\n');
            }
            continue;
        }
        blank_run = 0;

        let leading_closers = line.chars().take_while(|c| matches!(c, '}' | ')' | ']')).count();
        let line_level = levels.level_after_closing(leading_closers);
        let mut level = line_level;
        if is_case_label(line) {
            level = level.saturating_sub(1);
        }

        // No blank line right before a closing brace
        if leading_closers > 0 && out.ends_with("\n\n") {
            out.pop();
        }

        for _ in 0..level {
            out.push('\t');
        }
        out.push_str(line);
        out.push('\n');

        let (brackets, raw) = scan_brackets(line, false);
        in_raw_string = raw;
        levels.apply(&brackets, line_level);
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

/// Open indentation levels, each holding the count of brackets still open
/// from the line that started it
#[derive(Debug, Default)]
struct Levels {
    open: Vec<usize>,
}

impl Levels {
    fn depth(&self) -> usize {
        self.open.len()
    }

    /// Level of a line starting with `closers` closing brackets: every level
    /// those brackets reach is ended
    fn level_after_closing(&self, closers: usize) -> usize {
        let mut remaining = closers;
        let mut ended = 0;
        for &count in self.open.iter().rev() {
            if remaining == 0 {
                break;
            }
            ended += 1;
            remaining = remaining.saturating_sub(count);
        }
        self.open.len() - ended
    }

    /// Apply the brackets of a line printed at `line_level`, in order.
    /// Closers consume brackets opened earlier on the same line first. New
    /// brackets join a level the line only partly closed, as in
    /// `}(), func() {`.
    fn apply(&mut self, brackets: &[Bracket], line_level: usize) {
        let mut pending = 0usize;
        for bracket in brackets {
            match bracket {
                Bracket::Open => pending += 1,
                Bracket::Close if pending > 0 => pending -= 1,
                Bracket::Close => {
                    if let Some(top) = self.open.last_mut() {
                        *top -= 1;
                        if *top == 0 {
                            self.open.pop();
                        }
                    }
                }
            }
        }
        if pending == 0 {
            return;
        }
        let open_len = self.open.len();
        match self.open.last_mut() {
            Some(top) if open_len > line_level => *top += pending,
            _ => self.open.push(pending),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Open,
    Close,
}

fn is_case_label(line: &str) -> bool {
    (line.starts_with("case ") || line == "default:") && line.ends_with(':')
}

/// Brackets of a line in order, and whether it ends inside a raw string
/// literal.
fn scan_brackets(line: &str, starts_raw: bool) -> (Vec<Bracket>, bool) {
    let mut brackets = Vec::new();
    let mut chars = line.chars();
    let mut in_raw = starts_raw;

    while let Some(c) = chars.next() {
        if in_raw {
            if c == '`' {
                in_raw = false;
            }
            continue;
        }
        match c {
            '{' | '(' | '[' => brackets.push(Bracket::Open),
            '}' | ')' | ']' => brackets.push(Bracket::Close),
            '`' => in_raw = true,
            '"' | '\'' => {
                let quote = c;
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == quote {
                        break;
                    }
                }
            }
            '/' if chars.clone().next() == Some('/') => break,
            _ => {}
        }
    }
    (brackets, in_raw)
}
