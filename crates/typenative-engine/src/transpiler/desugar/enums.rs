//! Enums
//!
//! A numeric enum becomes `type E float64` plus one named value per member;
//! a string enum becomes `type E string`. Constant members go in a `const`
//! block, anything depending on a computed initializer in a `var` block.

use crate::transpiler::env::{EnumBase, EnumInfo, EnumValue};
use rustc_hash::FxHashMap;

/// Member initializer as written in source
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    None,
    Number(f64),
    String(String),
    Computed,
}

/// Assign a value to every member.
///
/// Numeric auto-increment continues from the previous member. After a
/// computed member it counts up from that member's name instead.
pub fn assign_values(members: &[(String, Initializer)]) -> (EnumBase, Vec<(String, EnumValue)>) {
    let base = if members.iter().any(|(_, init)| matches!(init, Initializer::String(_))) {
        EnumBase::String
    } else {
        EnumBase::Number
    };

    let mut values = Vec::with_capacity(members.len());
    let mut next = 0.0;
    let mut anchor: Option<(String, u32)> = None;

    for (name, init) in members {
        let value = match init {
            Initializer::Number(n) => {
                next = n + 1.0;
                anchor = None;
                EnumValue::Number(*n)
            }
            Initializer::String(s) => EnumValue::String(s.clone()),
            Initializer::Computed => {
                anchor = Some((name.clone(), 0));
                EnumValue::Computed
            }
            Initializer::None if base == EnumBase::String => EnumValue::String(name.clone()),
            Initializer::None => match anchor.as_mut() {
                Some((from, by)) => {
                    *by += 1;
                    EnumValue::Offset {
                        from: from.clone(),
                        by: *by,
                    }
                }
                None => {
                    let value = next;
                    next += 1.0;
                    EnumValue::Number(value)
                }
            },
        };
        values.push((name.clone(), value));
    }
    (base, values)
}

/// Go numeric literal for an enum value
pub fn number_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else if value.abs() >= 1e21 {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    }
}

/// Type declaration and value block. `computed` holds the lowered
/// initializer of each computed member.
pub fn declare(info: &EnumInfo, computed: &FxHashMap<String, String>) -> String {
    let backing = match info.base {
        EnumBase::Number => "float64",
        EnumBase::String => "string",
    };
    let keyword = if info.is_constant() { "const" } else { "var" };

    let mut lines = vec![format!("type {} {}", info.name, backing), String::new()];
    if info.members.is_empty() {
        return lines.join("\n").trim_end().to_string();
    }
    lines.push(format!("{} (", keyword));
    for (member, value) in &info.members {
        let text = match value {
            EnumValue::Number(n) => number_literal(*n),
            EnumValue::String(s) => super::go_quote(s),
            EnumValue::Computed => match computed.get(member) {
                Some(text) => format!("{}({})", info.name, text),
                None => "0".to_string(),
            },
            EnumValue::Offset { from, by } => format!("{} + {}", info.member_const(from), by),
        };
        lines.push(format!("{} {} = {}", info.member_const(member), info.name, text));
    }
    lines.push(")".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(inits: Vec<(&str, Initializer)>) -> Vec<(String, Initializer)> {
        inits.into_iter().map(|(n, i)| (n.to_string(), i)).collect()
    }

    #[test]
    fn test_auto_increment_from_zero() {
        let (base, values) = assign_values(&named(vec![
            ("Pending", Initializer::None),
            ("Running", Initializer::None),
            ("Done", Initializer::None),
        ]));
        assert_eq!(base, EnumBase::Number);
        let numbers: Vec<_> = values.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(
            numbers,
            vec![EnumValue::Number(0.0), EnumValue::Number(1.0), EnumValue::Number(2.0)]
        );
    }

    #[test]
    fn test_increment_continues_after_initializer() {
        let (_, values) = assign_values(&named(vec![
            ("A", Initializer::Number(10.0)),
            ("B", Initializer::None),
            ("C", Initializer::Computed),
            ("D", Initializer::None),
            ("E", Initializer::None),
        ]));
        assert_eq!(values[1].1, EnumValue::Number(11.0));
        assert_eq!(values[2].1, EnumValue::Computed);
        assert_eq!(
            values[4].1,
            EnumValue::Offset {
                from: "C".to_string(),
                by: 2
            }
        );
    }

    #[test]
    fn test_string_enum_declaration() {
        let (base, members) = assign_values(&named(vec![
            ("Up", Initializer::String("UP".to_string())),
            ("Down", Initializer::String("DOWN".to_string())),
        ]));
        let info = EnumInfo {
            name: "Direction".to_string(),
            base,
            members,
        };
        assert_eq!(
            declare(&info, &FxHashMap::default()),
            "type Direction string\n\nconst (\nDirectionUp Direction = \"UP\"\nDirectionDown Direction = \"DOWN\"\n)"
        );
    }

    #[test]
    fn test_computed_members_use_var_block() {
        let (base, members) = assign_values(&named(vec![
            ("A", Initializer::Computed),
            ("B", Initializer::None),
        ]));
        let info = EnumInfo {
            name: "Size".to_string(),
            base,
            members,
        };
        let mut computed = FxHashMap::default();
        computed.insert("A".to_string(), "float64(len(\"abc\"))".to_string());
        assert_eq!(
            declare(&info, &computed),
            "type Size float64\n\nvar (\nSizeA Size = Size(float64(len(\"abc\")))\nSizeB Size = SizeA + 1\n)"
        );
    }

    #[test]
    fn test_number_literal_forms() {
        assert_eq!(number_literal(3.0), "3");
        assert_eq!(number_literal(2.5), "2.5");
        assert_eq!(number_literal(1e23), "1e23");
    }
}
