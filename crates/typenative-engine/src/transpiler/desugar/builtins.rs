//! Builtin functions, constants and methods
//!
//! Rewrite tables for the JavaScript standard library surface the
//! translator understands. Each entry produces Go text over already-lowered
//! arguments plus the packages that text references.

use super::{checked_byte, clamped_range, format_number, int_index, paren, printable, stringify, truthy, Bounds, Temps};
use crate::transpiler::capability::Capability;
use crate::transpiler::types::TypeDesc;

/// Rewritten call and the packages it needs
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub text: String,
    pub capabilities: Vec<Capability>,
}

impl Rewrite {
    fn new(text: impl Into<String>, capabilities: &[Capability]) -> Self {
        Self {
            text: text.into(),
            capabilities: capabilities.to_vec(),
        }
    }

    fn plain(text: impl Into<String>) -> Self {
        Self::new(text, &[])
    }
}

/// Lowered argument with its static type
pub type Arg = (String, TypeDesc);

fn texts(args: &[Arg]) -> Vec<String> {
    args.iter().map(|(text, _)| text.clone()).collect()
}

fn arg(args: &[Arg], index: usize) -> Option<&str> {
    args.get(index).map(|(text, _)| text.as_str())
}

// ============================================================================
// console
// ============================================================================

/// `console.log(...)` and friends
pub fn console(method: &str, args: &[Arg]) -> Option<Rewrite> {
    let mut capabilities = vec![Capability::Fmt];
    let printed: Vec<String> = args
        .iter()
        .map(|(text, ty)| {
            let (text, needs) = printable(text, ty);
            capabilities.extend(needs);
            text
        })
        .collect();
    let joined = printed.join(", ");
    let text = match method {
        "log" | "info" | "debug" => format!("fmt.Println({})", joined),
        "error" | "warn" => {
            capabilities.push(Capability::Os);
            if joined.is_empty() {
                "fmt.Fprintln(os.Stderr)".to_string()
            } else {
                format!("fmt.Fprintln(os.Stderr, {})", joined)
            }
        }
        _ => return None,
    };
    Some(Rewrite::new(text, &capabilities))
}

/// `console.time(label)`: start a timer bound to `var`
pub fn timer_start(var: &str) -> Rewrite {
    Rewrite::new(format!("{} := time.Now()", var), &[Capability::Time])
}

/// `console.timeEnd(label)`: print elapsed time of the timer in `var`
pub fn timer_end(label: &str, var: &str) -> Rewrite {
    Rewrite::new(
        format!("fmt.Printf(\"%s: %v\\n\", {}, time.Since({}))", label, var),
        &[Capability::Fmt, Capability::Time],
    )
}

// ============================================================================
// Math and Number
// ============================================================================

/// `Math.PI` and friends
pub fn math_constant(name: &str) -> Option<&'static str> {
    Some(match name {
        "PI" => "math.Pi",
        "E" => "math.E",
        "LN2" => "math.Ln2",
        "LN10" => "math.Ln10",
        "LOG2E" => "math.Log2E",
        "LOG10E" => "math.Log10E",
        "SQRT2" => "math.Sqrt2",
        "SQRT1_2" => "(1 / math.Sqrt2)",
        _ => return None,
    })
}

/// `Number.MAX_SAFE_INTEGER` and friends
pub fn number_constant(name: &str) -> Option<Rewrite> {
    let (text, needs_math) = match name {
        "MAX_SAFE_INTEGER" => ("float64(9007199254740991)", false),
        "MIN_SAFE_INTEGER" => ("float64(-9007199254740991)", false),
        "EPSILON" => ("2.220446049250313e-16", false),
        "MAX_VALUE" => ("math.MaxFloat64", true),
        "MIN_VALUE" => ("math.SmallestNonzeroFloat64", true),
        "POSITIVE_INFINITY" => ("math.Inf(1)", true),
        "NEGATIVE_INFINITY" => ("math.Inf(-1)", true),
        "NaN" => ("math.NaN()", true),
        _ => return None,
    };
    Some(if needs_math {
        Rewrite::new(text, &[Capability::Math])
    } else {
        Rewrite::plain(text)
    })
}

/// `Math.floor(x)` and friends
pub fn math(method: &str, args: &[Arg]) -> Option<Rewrite> {
    let a = texts(args);
    let unary = |go: &str| -> Option<Rewrite> {
        Some(Rewrite::new(
            format!("math.{}({})", go, a.first().cloned().unwrap_or_else(|| "math.NaN()".to_string())),
            &[Capability::Math],
        ))
    };
    match method {
        "floor" => unary("Floor"),
        "ceil" => unary("Ceil"),
        "abs" => unary("Abs"),
        "sqrt" => unary("Sqrt"),
        "cbrt" => unary("Cbrt"),
        "trunc" => unary("Trunc"),
        "log" => unary("Log"),
        "log2" => unary("Log2"),
        "log10" => unary("Log10"),
        "exp" => unary("Exp"),
        "sin" => unary("Sin"),
        "cos" => unary("Cos"),
        "tan" => unary("Tan"),
        "asin" => unary("Asin"),
        "acos" => unary("Acos"),
        "atan" => unary("Atan"),
        "round" => Some(Rewrite::new(
            format!("math.Floor({} + 0.5)", a.first().map(String::as_str).unwrap_or("math.NaN()")),
            &[Capability::Math],
        )),
        "sign" => Some(Rewrite::new(
            format!(
                "func(v float64) float64 {{\nif v > 0 {{\nreturn 1\n}}\nif v < 0 {{\nreturn -1\n}}\nreturn v\n}}({})",
                a.first().map(String::as_str).unwrap_or("math.NaN()")
            ),
            if a.is_empty() { &[Capability::Math] } else { &[] },
        )),
        "pow" | "atan2" | "hypot" if a.len() == 2 => {
            let go = match method {
                "pow" => "Pow",
                "atan2" => "Atan2",
                _ => "Hypot",
            };
            Some(Rewrite::new(format!("math.{}({}, {})", go, a[0], a[1]), &[Capability::Math]))
        }
        "min" | "max" => {
            let (go, empty) = if method == "min" {
                ("Min", "math.Inf(1)")
            } else {
                ("Max", "math.Inf(-1)")
            };
            let text = match a.split_last() {
                None => empty.to_string(),
                Some((last, rest)) => rest
                    .iter()
                    .rev()
                    .fold(last.clone(), |acc, x| format!("math.{}({}, {})", go, x, acc)),
            };
            Some(Rewrite::new(text, &[Capability::Math]))
        }
        "random" => Some(Rewrite::new("rand.Float64()", &[Capability::Rand])),
        _ => None,
    }
}

// ============================================================================
// Global functions
// ============================================================================

/// `parseInt`, `parseFloat`, `Number`, `String`, `Boolean`, `isNaN`, `isFinite`
pub fn global(name: &str, args: &[Arg], temps: &mut Temps) -> Option<Rewrite> {
    let first = args.first();
    match name {
        "parseInt" => {
            let value = arg(args, 0).unwrap_or("\"\"");
            let radix = arg(args, 1).map(int_index).unwrap_or_else(|| "10".to_string());
            let n = temps.fresh("n");
            let err = temps.fresh("err");
            Some(Rewrite::new(
                format!(
                    "func() float64 {{\n{n}, {err} := strconv.ParseInt(strings.TrimSpace({value}), {radix}, 64)\nif {err} != nil {{\nreturn math.NaN()\n}}\nreturn float64({n})\n}}()",
                    n = n,
                    err = err,
                    value = value,
                    radix = radix,
                ),
                &[Capability::Strconv, Capability::Strings, Capability::Math],
            ))
        }
        "parseFloat" => Some(parse_float(arg(args, 0).unwrap_or("\"\""), temps)),
        "Number" => Some(match first {
            None => Rewrite::plain("float64(0)"),
            Some((text, TypeDesc::String)) => parse_float(text, temps),
            Some((text, TypeDesc::Boolean)) => Rewrite::plain(format!(
                "func() float64 {{\nif {} {{\nreturn 1\n}}\nreturn 0\n}}()",
                text
            )),
            Some((text, TypeDesc::Any)) => Rewrite::plain(format!("{}.(float64)", text)),
            Some((text, _)) => Rewrite::plain(format!("float64({})", text)),
        }),
        "String" => Some(match first {
            None => Rewrite::plain("\"\""),
            Some((text, ty)) => {
                let (text, capabilities) = stringify(text, ty);
                Rewrite::new(text, &capabilities)
            }
        }),
        "Boolean" => Some(match first {
            None => Rewrite::plain("false"),
            Some((text, ty)) => Rewrite::plain(truthy(text, ty)),
        }),
        "isNaN" => Some(Rewrite::new(
            format!("math.IsNaN({})", arg(args, 0).unwrap_or("math.NaN()")),
            &[Capability::Math],
        )),
        "isFinite" => {
            let value = paren(arg(args, 0).unwrap_or("math.NaN()"));
            Some(Rewrite::new(
                format!("!math.IsInf({v}, 0) && !math.IsNaN({v})", v = value),
                &[Capability::Math],
            ))
        }
        _ => None,
    }
}

fn parse_float(value: &str, temps: &mut Temps) -> Rewrite {
    let n = temps.fresh("n");
    let err = temps.fresh("err");
    Rewrite::new(
        format!(
            "func() float64 {{\n{n}, {err} := strconv.ParseFloat(strings.TrimSpace({value}), 64)\nif {err} != nil {{\nreturn math.NaN()\n}}\nreturn {n}\n}}()",
            n = n,
            err = err,
            value = value,
        ),
        &[Capability::Strconv, Capability::Strings, Capability::Math],
    )
}

// ============================================================================
// Methods on primitive receivers
// ============================================================================

/// String method result type
pub fn string_method_type(method: &str) -> Option<TypeDesc> {
    Some(match method {
        "toUpperCase" | "toLowerCase" | "trim" | "trimStart" | "trimEnd" | "replace" | "replaceAll"
        | "charAt" | "substring" | "slice" | "repeat" | "padStart" | "padEnd" | "toString" | "valueOf"
        | "concat" => TypeDesc::String,
        "split" | "match" => TypeDesc::slice(TypeDesc::String),
        "includes" | "startsWith" | "endsWith" => TypeDesc::Boolean,
        "indexOf" | "lastIndexOf" | "charCodeAt" => TypeDesc::Number,
        _ => return None,
    })
}

/// `s.method(args)` on a string receiver
pub fn string_method(method: &str, receiver: &str, args: &[Arg], temps: &mut Temps) -> Option<Rewrite> {
    let a0 = arg(args, 0);
    let a1 = arg(args, 1);
    let strings = |text: String| Some(Rewrite::new(text, &[Capability::Strings]));
    let arg_is_pattern = matches!(args.first(), Some((_, TypeDesc::Pattern)));

    match method {
        "toUpperCase" => strings(format!("strings.ToUpper({})", receiver)),
        "toLowerCase" => strings(format!("strings.ToLower({})", receiver)),
        "trim" => strings(format!("strings.TrimSpace({})", receiver)),
        "trimStart" => strings(format!("strings.TrimLeft({}, \" \\t\\n\\r\")", receiver)),
        "trimEnd" => strings(format!("strings.TrimRight({}, \" \\t\\n\\r\")", receiver)),
        "split" => match a0 {
            None => Some(Rewrite::plain(format!("[]string{{{}}}", receiver))),
            Some(sep) if arg_is_pattern => Some(Rewrite::plain(format!("{}.Split({}, -1)", sep, receiver))),
            Some(sep) => strings(format!("strings.Split({}, {})", receiver, sep)),
        },
        "includes" => strings(format!("strings.Contains({}, {})", receiver, a0?)),
        "startsWith" => strings(format!("strings.HasPrefix({}, {})", receiver, a0?)),
        "endsWith" => strings(format!("strings.HasSuffix({}, {})", receiver, a0?)),
        "indexOf" => strings(format!("float64(strings.Index({}, {}))", receiver, a0?)),
        "lastIndexOf" => strings(format!("float64(strings.LastIndex({}, {}))", receiver, a0?)),
        "replace" if arg_is_pattern => Some(Rewrite::plain(format!(
            "{}.ReplaceAllString({}, {})",
            a0?, receiver, a1?
        ))),
        "replace" => strings(format!("strings.Replace({}, {}, {}, 1)", receiver, a0?, a1?)),
        "replaceAll" if arg_is_pattern => Some(Rewrite::plain(format!(
            "{}.ReplaceAllString({}, {})",
            a0?, receiver, a1?
        ))),
        "replaceAll" => strings(format!("strings.ReplaceAll({}, {}, {})", receiver, a0?, a1?)),
        "charAt" => Some(Rewrite::plain(checked_byte(
            receiver,
            &int_index(a0.unwrap_or("0")),
            "string",
            "string(s[i])",
            "\"\"",
        ))),
        "charCodeAt" => Some(Rewrite::new(
            checked_byte(
                receiver,
                &int_index(a0.unwrap_or("0")),
                "float64",
                "float64(s[i])",
                "math.NaN()",
            ),
            &[Capability::Math],
        )),
        "substring" | "slice" => {
            let bounds = if method == "slice" { Bounds::Relative } else { Bounds::Swapping };
            Some(Rewrite::plain(match a0 {
                Some(start) => clamped_range(
                    "string",
                    receiver,
                    &int_index(start),
                    a1.map(int_index).as_deref(),
                    bounds,
                ),
                None => receiver.to_string(),
            }))
        }
        "repeat" => strings(format!("strings.Repeat({}, {})", receiver, int_index(a0?))),
        "padStart" | "padEnd" => {
            let s = temps.fresh("s");
            let n = temps.fresh("n");
            let fill = a1.unwrap_or("\" \"");
            let joined = if method == "padStart" {
                format!("strings.Repeat({fill}, {n})[:{n}] + {s}", fill = fill, n = n, s = s)
            } else {
                format!("{s} + strings.Repeat({fill}, {n})[:{n}]", fill = fill, n = n, s = s)
            };
            strings(format!(
                "func() string {{\n{s} := {receiver}\nif {n} := {width} - len({s}); {n} > 0 && {fill} != \"\" {{\n{s} = {joined}\n}}\nreturn {s}\n}}()",
                s = s,
                n = n,
                receiver = receiver,
                width = int_index(a0?),
                fill = fill,
                joined = joined,
            ))
        }
        "toString" | "valueOf" => Some(Rewrite::plain(receiver.to_string())),
        "concat" => {
            let mut parts = vec![receiver.to_string()];
            parts.extend(texts(args).iter().map(|t| paren(t)));
            Some(Rewrite::plain(parts.join(" + ")))
        }
        "match" if arg_is_pattern => Some(Rewrite::plain(format!("{}.FindStringSubmatch({})", a0?, receiver))),
        "match" => Some(Rewrite::new(
            format!(
                "regexp.MustCompile(regexp.QuoteMeta({})).FindStringSubmatch({})",
                a0?, receiver
            ),
            &[Capability::Regexp],
        )),
        _ => None,
    }
}

/// `n.toString()` / `n.toFixed(d)` on a number receiver
pub fn number_method(method: &str, receiver: &str, args: &[Arg]) -> Option<Rewrite> {
    match method {
        "toString" => Some(match arg(args, 0) {
            None => Rewrite::new(format_number(receiver), &[Capability::Strconv]),
            Some(radix) => Rewrite::new(
                format!("strconv.FormatInt(int64({}), {})", receiver, int_index(radix)),
                &[Capability::Strconv],
            ),
        }),
        "toFixed" => Some(Rewrite::new(
            format!(
                "strconv.FormatFloat({}, 'f', {}, 64)",
                receiver,
                int_index(arg(args, 0).unwrap_or("0"))
            ),
            &[Capability::Strconv],
        )),
        "valueOf" => Some(Rewrite::plain(receiver.to_string())),
        _ => None,
    }
}

/// `b.toString()` on a boolean receiver
pub fn boolean_method(method: &str, receiver: &str) -> Option<Rewrite> {
    match method {
        "toString" => Some(Rewrite::new(
            format!("strconv.FormatBool({})", receiver),
            &[Capability::Strconv],
        )),
        "valueOf" => Some(Rewrite::plain(receiver.to_string())),
        _ => None,
    }
}

/// `re.test(s)` / `re.exec(s)` on a compiled pattern
pub fn pattern_method(method: &str, receiver: &str, args: &[Arg]) -> Option<Rewrite> {
    let subject = arg(args, 0).unwrap_or("\"\"");
    match method {
        "test" => Some(Rewrite::plain(format!("{}.MatchString({})", receiver, subject))),
        "exec" => Some(Rewrite::plain(format!("{}.FindStringSubmatch({})", receiver, subject))),
        _ => None,
    }
}
