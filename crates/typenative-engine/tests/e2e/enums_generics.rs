//! Enums and generics

use super::harness::*;

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_fixture() {
    expect_contains(
        &fixture("19_enums.ts"),
        &[
            "type Status float64",
            "StatusPending Status = 0",
            "StatusRunning Status = 1",
            "StatusDone Status = 2",
            "type Direction string",
            "DirectionUp Direction = \"UP\"",
            "DirectionDown Direction = \"DOWN\"",
            "pending == StatusPending",
            "up == DirectionUp",
        ],
    );
}

#[test]
fn test_enum_initializer_offsets() {
    expect_contains(
        "enum Level { Low = 10, Mid, High = 20 }\nconsole.log(Level.Mid);",
        &["LevelLow Level = 10", "LevelMid Level = 11", "LevelHigh Level = 20"],
    );
}

#[test]
fn test_enum_in_arithmetic_converts() {
    expect_contains(
        "enum Step { One = 1 }\nconst n: number = Step.One + 1;\nconsole.log(n);",
        &["float64(StepOne) + 1"],
    );
}

// ============================================================================
// Generics
// ============================================================================

#[test]
fn test_generics_fixture() {
    expect_contains(
        &fixture("09_generics.ts"),
        &[
            "func identity[T any](value T) T {",
            "identity[string](\"hello\")",
            "identity[float64](",
            "type Box[T any] struct {\n\tvalue T\n}",
            "func NewBox[T any](value T) *Box[T] {",
            "func (this *Box[T]) getValue() T {",
            "NewBox[string](\"boxed\")",
            "NewBox[float64](",
            "func pair[A any, B any](first A, second B) string {",
        ],
    );
}

#[test]
fn test_generic_argument_inferred_from_call() {
    expect_contains(
        "function first<T>(xs: T[]): T { return xs[0]; }\nconst names: string[] = ['a'];\nconsole.log(first(names));",
        &["func first[T any](xs []T) T {", "(names))"],
    );
}

#[test]
fn test_type_alias_resolves_through_chain() {
    expect_contains(
        "type Id = number;\ntype Key = Id;\nconst k: Key = 3;\nconsole.log(k);",
        &["var k float64 = 3"],
    );
}
