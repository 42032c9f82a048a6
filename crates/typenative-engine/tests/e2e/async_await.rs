//! Promises, async functions and timers

use super::harness::*;

#[test]
fn test_promise_executor_becomes_goroutine() {
    expect_contains(
        &fixture("08_async_await.ts"),
        &[
            "func asyncFunc() chan string {",
            "make(chan string, 1)",
            "go func() {",
            "time.AfterFunc(time.Duration(1000)*time.Millisecond, func() {",
            "<- \"Async Result\"",
        ],
    );
}

#[test]
fn test_await_receives_from_queue() {
    expect_contains(
        &fixture("08_async_await.ts"),
        &["func run() {", "result := <-asyncFunc()", "\trun()\n"],
    );
}

#[test]
fn test_async_without_executor_is_synchronous() {
    let code = expect_contains(
        "async function load(): Promise<number> {\n  return 7;\n}\nasync function main2() {\n  const v = await load();\n  console.log(v);\n}\nmain2();",
        &["func load() float64 {", "var v float64 = load()"],
    );
    assert!(!code.contains("chan float64"));
}

#[test]
fn test_set_timeout_schedules_callback() {
    expect_contains(
        "setTimeout(() => {\n  console.log('later');\n}, 50);",
        &["time.AfterFunc(time.Duration(50)*time.Millisecond, func() {", "fmt.Println(\"later\")"],
    );
}

#[test]
fn test_reject_panics() {
    expect_contains(
        "function fail(): Promise<string> {\n  return new Promise((resolve, reject) => {\n    reject(new Error('nope'));\n  });\n}",
        &["panic(errors.New(\"nope\"))"],
    );
}
