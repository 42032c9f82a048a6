//! Promises
//!
//! A promise whose executor is known lowers to a buffered channel of the
//! payload type, a goroutine running the executor, and the channel handed
//! back immediately. Settling sends on the channel; awaiting receives.

use crate::transpiler::types::TypeDesc;

/// Channel element type for a promise payload. `Promise<void>` carries an
/// untyped value so `resolve()` still has something to send.
pub fn payload_type(payload: &TypeDesc) -> TypeDesc {
    match payload {
        TypeDesc::Void => TypeDesc::Any,
        other => other.clone(),
    }
}

/// Statements that allocate `queue`, launch `task` and return the queue.
/// Used as a function body when the body is exactly `return new Promise(…)`.
pub fn spawn_and_return(queue: &str, payload: &TypeDesc, task: &str) -> String {
    format!(
        "{queue} := make(chan {ty}, 1)\ngo func() {{\n{task}\n}}()\nreturn {queue}",
        queue = queue,
        ty = payload_type(payload).go_type(),
        task = task,
    )
}

/// The same sequence wrapped in an immediately-invoked closure, for a
/// `new Promise(…)` used as a value
pub fn spawn_value(queue: &str, payload: &TypeDesc, task: &str) -> String {
    format!(
        "func() chan {ty} {{\n{body}\n}}()",
        ty = payload_type(payload).go_type(),
        body = spawn_and_return(queue, payload, task),
    )
}

/// Settle through the resolver: a blocking send
pub fn resolve(queue: &str, value: &str) -> String {
    format!("{} <- {}", queue, value)
}

/// Reject through the resolver
pub fn reject(reason: &str) -> String {
    format!("panic({})", reason)
}

/// Executor given as a function value rather than an inline closure
pub fn call_executor(executor: &str, queue: &str, payload: &TypeDesc) -> String {
    let ty = payload_type(payload).go_type();
    format!(
        "{executor}(func(v {ty}) {{\n{queue} <- v\n}}, func(e interface{{}}) {{\npanic(e)\n}})",
        executor = executor,
        ty = ty,
        queue = queue,
    )
}

/// `await x`: a receive on a channel, pass-through for anything else
pub fn await_value(text: &str, ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Queue(_) => format!("<-{}", text),
        _ => text.to_string(),
    }
}

/// `setTimeout(cb, ms)`
pub fn schedule(callback: &str, delay: &str) -> String {
    format!(
        "time.AfterFunc(time.Duration({})*time.Millisecond, {})",
        delay, callback
    )
}
