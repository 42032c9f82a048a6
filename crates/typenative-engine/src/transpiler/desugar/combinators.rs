//! Array combinators
//!
//! Go slices have no `map`/`filter`/`find`/... Each call expands into an
//! immediately-invoked closure that captures the receiver once, binds the
//! callback once and loops. Callback arity is honored positionally:
//! element, then the index as float64, then the whole slice.

use super::{clamped_range, go_quote, stringify, truthy, Bounds, Temps};
use crate::transpiler::capability::Capability;
use crate::transpiler::types::TypeDesc;

/// A combinator call after its receiver and callback were lowered
#[derive(Debug, Clone)]
pub struct Callback<'a> {
    pub receiver: &'a str,
    pub element: &'a TypeDesc,
    pub function: &'a str,
    /// Number of parameters the callback declares
    pub arity: usize,
    /// Declared or inferred result type of the callback
    pub returns: &'a TypeDesc,
}

struct Names {
    arr: String,
    idx: String,
    elem: String,
    func: String,
}

impl Names {
    fn new(temps: &mut Temps) -> Self {
        Self {
            arr: temps.fresh("a"),
            idx: temps.fresh("i"),
            elem: temps.fresh("e"),
            func: temps.fresh("f"),
        }
    }

    /// `for i, e := range arr {`, binding only what the body uses
    fn range_header(&self, index: bool, element: bool) -> String {
        match (index, element) {
            (true, true) => format!("for {}, {} := range {} {{", self.idx, self.elem, self.arr),
            (true, false) => format!("for {} := range {} {{", self.idx, self.arr),
            (false, true) => format!("for _, {} := range {} {{", self.elem, self.arr),
            (false, false) => format!("for range {} {{", self.arr),
        }
    }

    /// Callback invocation passing the first `arity` positional arguments
    fn call(&self, arity: usize, leading: Option<&str>) -> String {
        let positional = [
            self.elem.clone(),
            format!("float64({})", self.idx),
            self.arr.clone(),
        ];
        let mut args: Vec<String> = leading.map(|a| vec![a.to_string()]).unwrap_or_default();
        args.extend(positional.into_iter().take(arity.min(3)));
        format!("{}({})", self.func, args.join(", "))
    }

    fn prologue(&self, cb: &Callback<'_>) -> String {
        format!("{} := {}\n{} := {}", self.arr, cb.receiver, self.func, cb.function)
    }
}

/// `arr.map(cb)`
pub fn map(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    let out = temps.fresh("r");
    let result = TypeDesc::slice(cb.returns.clone()).go_type();
    format!(
        "func() {result} {{\n{prologue}\n{out} := make({result}, 0, len({arr}))\n{header}\n{out} = append({out}, {call})\n}}\nreturn {out}\n}}()",
        result = result,
        prologue = n.prologue(cb),
        out = out,
        arr = n.arr,
        header = n.range_header(cb.arity >= 2, cb.arity >= 1),
        call = n.call(cb.arity, None),
    )
}

/// `arr.filter(cb)`
pub fn filter(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    let out = temps.fresh("r");
    let result = TypeDesc::slice(cb.element.clone()).go_type();
    format!(
        "func() {result} {{\n{prologue}\n{out} := make({result}, 0)\n{header}\nif {cond} {{\n{out} = append({out}, {elem})\n}}\n}}\nreturn {out}\n}}()",
        result = result,
        prologue = n.prologue(cb),
        out = out,
        header = n.range_header(cb.arity >= 2, true),
        cond = truthy(&n.call(cb.arity, None), cb.returns),
        elem = n.elem,
    )
}

/// `arr.some(cb)`
pub fn some(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    format!(
        "func() bool {{\n{prologue}\n{header}\nif {cond} {{\nreturn true\n}}\n}}\nreturn false\n}}()",
        prologue = n.prologue(cb),
        header = n.range_header(cb.arity >= 2, cb.arity >= 1),
        cond = truthy(&n.call(cb.arity, None), cb.returns),
    )
}

/// `arr.every(cb)`
pub fn every(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    format!(
        "func() bool {{\n{prologue}\n{header}\nif !({cond}) {{\nreturn false\n}}\n}}\nreturn true\n}}()",
        prologue = n.prologue(cb),
        header = n.range_header(cb.arity >= 2, cb.arity >= 1),
        cond = truthy(&n.call(cb.arity, None), cb.returns),
    )
}

/// `arr.find(cb)`: the first match, or the element type's zero value
pub fn find(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    format!(
        "func() {ty} {{\n{prologue}\n{header}\nif {cond} {{\nreturn {elem}\n}}\n}}\nreturn {zero}\n}}()",
        ty = cb.element.go_type(),
        prologue = n.prologue(cb),
        header = n.range_header(cb.arity >= 2, true),
        cond = truthy(&n.call(cb.arity, None), cb.returns),
        elem = n.elem,
        zero = cb.element.zero_value(),
    )
}

/// `arr.findIndex(cb)`: the first matching index, or -1
pub fn find_index(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    format!(
        "func() float64 {{\n{prologue}\n{header}\nif {cond} {{\nreturn float64({idx})\n}}\n}}\nreturn -1\n}}()",
        prologue = n.prologue(cb),
        header = n.range_header(true, cb.arity >= 1),
        cond = truthy(&n.call(cb.arity, None), cb.returns),
        idx = n.idx,
    )
}

/// `arr.forEach(cb)`
pub fn for_each(cb: &Callback<'_>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    format!(
        "func() {{\n{prologue}\n{header}\n{call}\n}}\n}}()",
        prologue = n.prologue(cb),
        header = n.range_header(cb.arity >= 2, cb.arity >= 1),
        call = n.call(cb.arity, None),
    )
}

/// `arr.reduce(cb, init)`. Without an initial value the first element
/// seeds the accumulator and the loop starts at index 1.
pub fn reduce(cb: &Callback<'_>, accumulator: &TypeDesc, init: Option<&str>, temps: &mut Temps) -> String {
    let n = Names::new(temps);
    let acc = temps.fresh("acc");
    let ty = accumulator.go_type();
    // Callback arity includes the accumulator
    let arity = cb.arity.saturating_sub(1);
    let call = n.call(arity, Some(&acc));
    match init {
        Some(init) => format!(
            "func() {ty} {{\n{prologue}\nvar {acc} {ty} = {init}\n{header}\n{acc} = {call}\n}}\nreturn {acc}\n}}()",
            ty = ty,
            prologue = n.prologue(cb),
            acc = acc,
            init = init,
            header = n.range_header(arity >= 2, arity >= 1),
            call = call,
        ),
        None => {
            let bind = if arity >= 1 {
                format!("{} := {}[{}]\n", n.elem, n.arr, n.idx)
            } else {
                String::new()
            };
            format!(
                "func() {ty} {{\n{prologue}\nvar {acc} {ty} = {arr}[0]\nfor {idx} := 1; {idx} < len({arr}); {idx}++ {{\n{bind}{acc} = {call}\n}}\nreturn {acc}\n}}()",
                ty = ty,
                prologue = n.prologue(cb),
                acc = acc,
                arr = n.arr,
                idx = n.idx,
                bind = bind,
                call = call,
            )
        }
    }
}

/// `arr.join(sep)`, with the packages the element formatting needs
pub fn join(
    receiver: &str,
    element: &TypeDesc,
    separator: Option<&str>,
    temps: &mut Temps,
) -> (String, Vec<Capability>) {
    let default_sep = go_quote(",");
    let sep = separator.unwrap_or(&default_sep);
    if element.is_string() {
        return (format!("strings.Join({}, {})", receiver, sep), Vec::new());
    }
    let arr = temps.fresh("a");
    let parts = temps.fresh("s");
    let idx = temps.fresh("i");
    let elem = temps.fresh("e");
    let (formatted, capabilities) = stringify(&elem, element);
    (
        format!(
            "func() string {{\n{arr} := {receiver}\n{parts} := make([]string, len({arr}))\nfor {idx}, {elem} := range {arr} {{\n{parts}[{idx}] = {formatted}\n}}\nreturn strings.Join({parts}, {sep})\n}}()",
            arr = arr,
            receiver = receiver,
            parts = parts,
            idx = idx,
            elem = elem,
            formatted = formatted,
            sep = sep,
        ),
        capabilities,
    )
}

/// `arr.indexOf(x)`
pub fn index_of(receiver: &str, value: &str, temps: &mut Temps) -> String {
    let idx = temps.fresh("i");
    let elem = temps.fresh("e");
    format!(
        "func() float64 {{\nfor {idx}, {elem} := range {receiver} {{\nif {elem} == {value} {{\nreturn float64({idx})\n}}\n}}\nreturn -1\n}}()",
        idx = idx,
        elem = elem,
        receiver = receiver,
        value = value,
    )
}

/// `arr.includes(x)`
pub fn includes(receiver: &str, value: &str, temps: &mut Temps) -> String {
    let elem = temps.fresh("e");
    format!(
        "func() bool {{\nfor _, {elem} := range {receiver} {{\nif {elem} == {value} {{\nreturn true\n}}\n}}\nreturn false\n}}()",
        elem = elem,
        receiver = receiver,
        value = value,
    )
}

/// `arr.reverse()`, in place, yielding the same slice
pub fn reverse(receiver: &str, element: &TypeDesc, temps: &mut Temps) -> String {
    let arr = temps.fresh("a");
    let i = temps.fresh("i");
    let j = temps.fresh("j");
    format!(
        "func() []{ty} {{\n{arr} := {receiver}\nfor {i}, {j} := 0, len({arr})-1; {i} < {j}; {i}, {j} = {i}+1, {j}-1 {{\n{arr}[{i}], {arr}[{j}] = {arr}[{j}], {arr}[{i}]\n}}\nreturn {arr}\n}}()",
        ty = element.go_type(),
        arr = arr,
        receiver = receiver,
        i = i,
        j = j,
    )
}

/// `arr.slice(start, end)`, always a copy
pub fn slice(receiver: &str, element: &TypeDesc, start: Option<&str>, end: Option<&str>) -> String {
    match start {
        Some(start) => clamped_range(
            &TypeDesc::slice(element.clone()).go_type(),
            receiver,
            start,
            end,
            Bounds::Relative,
        ),
        None => format!("append([]{}{{}}, {}...)", element.go_type(), receiver),
    }
}

/// `arr.concat(a, b)`; each part is `(text, is_slice)`
pub fn concat(receiver: &str, element: &TypeDesc, parts: &[(String, bool)]) -> String {
    let mut text = format!("append([]{}{{}}, {}...)", element.go_type(), receiver);
    for (part, is_slice) in parts {
        text = if *is_slice {
            format!("append({}, {}...)", text, part)
        } else {
            format!("append({}, {})", text, part)
        };
    }
    text
}

/// `arr.pop()` / `arr.shift()` as values. `target` must be assignable.
pub fn take(target: &str, element: &TypeDesc, from_front: bool, temps: &mut Temps) -> String {
    let last = temps.fresh("e");
    let (pick, rest) = if from_front {
        (format!("{}[0]", target), format!("{}[1:]", target))
    } else {
        (
            format!("{}[len({})-1]", target, target),
            format!("{}[:len({})-1]", target, target),
        )
    };
    format!(
        "func() {ty} {{\nif len({target}) == 0 {{\nreturn {zero}\n}}\n{last} := {pick}\n{target} = {rest}\nreturn {last}\n}}()",
        ty = element.go_type(),
        target = target,
        zero = element.zero_value(),
        last = last,
        pick = pick,
        rest = rest,
    )
}

/// `arr.push(x)` in value position: append, then the new length
pub fn push_value(target: &str, values: &[String]) -> String {
    format!(
        "func() float64 {{\n{target} = append({target}, {values})\nreturn float64(len({target}))\n}}()",
        target = target,
        values = values.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback<'a>(function: &'a str, arity: usize, returns: &'a TypeDesc) -> Callback<'a> {
        Callback {
            receiver: "nums",
            element: &TypeDesc::Number,
            function,
            arity,
            returns,
        }
    }

    #[test]
    fn test_map_single_argument() {
        let mut temps = Temps::new();
        let ret = TypeDesc::Number;
        let text = map(&callback("double", 1, &ret), &mut temps);
        assert_eq!(
            text,
            "func() []float64 {\n_a0 := nums\n_f3 := double\n_r4 := make([]float64, 0, len(_a0))\nfor _, _e2 := range _a0 {\n_r4 = append(_r4, _f3(_e2))\n}\nreturn _r4\n}()"
        );
    }

    #[test]
    fn test_map_with_index_and_array() {
        let mut temps = Temps::new();
        let ret = TypeDesc::String;
        let text = map(&callback("f", 3, &ret), &mut temps);
        assert!(text.starts_with("func() []string {"));
        assert!(text.contains("for _i1, _e2 := range _a0 {"));
        assert!(text.contains("_f3(_e2, float64(_i1), _a0)"));
    }

    #[test]
    fn test_filter_uses_truthiness_for_non_boolean_callbacks() {
        let mut temps = Temps::new();
        let ret = TypeDesc::Number;
        let text = filter(&callback("f", 1, &ret), &mut temps);
        assert!(text.contains("if _f3(_e2) != 0 {"));
    }

    #[test]
    fn test_find_returns_zero_value() {
        let mut temps = Temps::new();
        let ret = TypeDesc::Boolean;
        let text = find(&callback("f", 1, &ret), &mut temps);
        assert!(text.starts_with("func() float64 {"));
        assert!(text.ends_with("return 0\n}()"));
    }

    #[test]
    fn test_find_index_always_binds_index() {
        let mut temps = Temps::new();
        let ret = TypeDesc::Boolean;
        let text = find_index(&callback("f", 1, &ret), &mut temps);
        assert!(text.contains("for _i1, _e2 := range _a0 {"));
        assert!(text.contains("return float64(_i1)"));
        assert!(text.contains("return -1"));
    }

    #[test]
    fn test_reduce_with_and_without_seed() {
        let mut temps = Temps::new();
        let ret = TypeDesc::Number;
        let seeded = reduce(&callback("add", 2, &ret), &TypeDesc::Number, Some("0"), &mut temps);
        assert!(seeded.contains("var _acc4 float64 = 0"));
        assert!(seeded.contains("_acc4 = _f3(_acc4, _e2)"));

        let unseeded = reduce(&callback("add", 2, &ret), &TypeDesc::Number, None, &mut temps);
        assert!(unseeded.contains("= _a5[0]"));
        assert!(unseeded.contains("for _i6 := 1; _i6 < len(_a5); _i6++ {"));
    }

    #[test]
    fn test_join_strings_directly() {
        let mut temps = Temps::new();
        let (text, capabilities) = join("words", &TypeDesc::String, Some("\" \""), &mut temps);
        assert_eq!(text, "strings.Join(words, \" \")");
        assert!(capabilities.is_empty());

        let (text, capabilities) = join("nums", &TypeDesc::Number, None, &mut temps);
        assert_eq!(capabilities, vec![Capability::Strconv]);
        assert!(text.contains("_s1[_i2] = strconv.FormatFloat(_e3, 'f', -1, 64)"));
        assert!(text.contains("strings.Join(_s1, \",\")"));

        let (text, capabilities) = join("flags", &TypeDesc::Boolean, None, &mut temps);
        assert_eq!(capabilities, vec![Capability::Fmt]);
        assert!(text.contains("fmt.Sprint(_e7)"));
    }

    #[test]
    fn test_slice_and_concat_copy() {
        let range = slice("nums", &TypeDesc::Number, Some("int(-1)"), None);
        assert!(range.starts_with("func(s []float64, start int) []float64 {\nend := len(s)\n"));
        assert!(range.contains("start += len(s)"));
        assert!(range.ends_with("return append([]float64{}, s[start:end]...)\n}(nums, int(-1))"));
        assert_eq!(slice("nums", &TypeDesc::Number, None, None), "append([]float64{}, nums...)");
        assert_eq!(
            concat("a", &TypeDesc::Number, &[("b".to_string(), true), ("4".to_string(), false)]),
            "append(append(append([]float64{}, a...), b...), 4)"
        );
    }

    #[test]
    fn test_push_value_returns_length() {
        assert_eq!(
            push_value("nums", &["4".to_string()]),
            "func() float64 {\nnums = append(nums, 4)\nreturn float64(len(nums))\n}()"
        );
    }
}
