//! Classes, interfaces and inheritance

use super::harness::*;

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_interfaces_and_inheritance_fixture() {
    expect_contains(
        &fixture("07_interfaces_classes.ts"),
        &[
            "type IBasic interface {\n\tisBasic() bool\n}",
            "type IComplex interface {\n\tIBasic\n\tisComplex(string) bool\n}",
            "type Basic struct {\n}",
            "type Complex struct {\n\t*Basic\n\tname string\n}",
            "func NewBasic() *Basic {\n\tthis := &Basic{}\n\treturn this\n}",
            "func NewComplex(name string) *Complex {\n\tthis := &Complex{}\n\tthis.Basic = NewBasic()\n\tthis.name = name\n\treturn this\n}",
            "func (this *Complex) isBasic() bool {\n\treturn false\n}",
            "func (this *Complex) isComplex(p string) bool {\n\treturn p == this.name\n}",
            "simpleObj := NewBasic()",
            "obj := NewComplex(\"Test\")",
            "fmt.Println(\"Should print true:\", simpleObj.isBasic())",
        ],
    );
}

#[test]
fn test_class_methods_shadow_array_rewrites() {
    let code = expect_contains(
        &fixture("13_method_dispatch.ts"),
        &[
            "counter.push(10)",
            "counter.length == 60",
            "arrPush = append(arrPush, 4)",
            "float64(len(arrPush)) == 4",
            "strings.ToUpper(msg2)",
        ],
    );
    assert!(!code.contains("counter = append("));
    assert!(!code.contains("len(counter)"));
}

#[test]
fn test_inherited_method_promoted() {
    expect_contains(
        "class Animal {\n  constructor(public name: string) {}\n  describe(): string { return 'animal ' + this.name; }\n}\nclass Cat extends Animal {\n  meow(): string { return this.describe() + ' meows'; }\n}\nconst c = new Cat('tom');\nconsole.log(c.meow(), c.name);",
        &[
            "func NewCat(arg0 string) *Cat {",
            "this.Animal = NewAnimal(arg0)",
            "return this.describe() + \" meows\"",
            "fmt.Println(c.meow(), c.name)",
        ],
    );
}

#[test]
fn test_super_method_call() {
    expect_contains(
        "class Base {\n  hello(): string { return 'base'; }\n}\nclass Derived extends Base {\n  hello(): string { return super.hello() + '!'; }\n}\nconsole.log(new Derived().hello());",
        &["return this.Base.hello() + \"!\""],
    );
}

#[test]
fn test_static_members_become_package_level() {
    expect_contains(
        "class Config {\n  static retries: number = 3;\n  static describe(): string { return 'retries'; }\n}\nconsole.log(Config.retries, Config.describe());",
        &[
            "var Config_retries float64 = 3",
            "func Config_describe() string {",
            "fmt.Println(strconv.FormatFloat(Config_retries, 'f', -1, 64), Config_describe())",
        ],
    );
}

#[test]
fn test_nullable_class_instance() {
    expect_contains(
        &fixture("10_null_undefined.ts"),
        &[
            "var eN *Foo = nil",
            "eN == nil",
            "var fN *Foo = NewFoo(\"bar\")",
            "fN != nil",
        ],
    );
}

#[test]
fn test_abstract_method_has_no_body() {
    expect_absent(
        "abstract class Shape {\n  abstract area(): number;\n}\nclass Square extends Shape {\n  constructor(private side: number) { super(); }\n  area(): number { return this.side * this.side; }\n}",
        &["func (this *Shape) area()"],
    );
}

// ============================================================================
// Interfaces
// ============================================================================

#[test]
fn test_property_interface_is_struct() {
    expect_contains(
        "interface Point { x: number; y: number; }\nconst p: Point = { x: 1, y: 2 };\nconsole.log(p.x + p.y);",
        &[
            "type Point struct {\n\tx float64\n\ty float64\n}",
            "Point{x: 1, y: 2}",
            "fmt.Println(strconv.FormatFloat(p.x + p.y, 'f', -1, 64))",
        ],
    );
}

#[test]
fn test_interface_typed_parameter() {
    expect_contains(
        "interface Greeter { greet(): string; }\nclass English implements Greeter {\n  greet(): string { return 'hello'; }\n}\nfunction run(g: Greeter): string { return g.greet(); }\nconsole.log(run(new English()));",
        &[
            "type Greeter interface {\n\tgreet() string\n}",
            "func run(g Greeter) string {\n\treturn g.greet()\n}",
            "fmt.Println(run(NewEnglish()))",
        ],
    );
}
