//! End-to-end tests for the TypeScript to Go translator
//!
//! Each test translates a complete program and checks the emitted Go text.
//! The fixture corpus under `tests/fixtures` is additionally built and run
//! with the Go toolchain by the ignored `go_run` tests.

mod e2e;
