//! `typenative emit`: translate one file and print or write the Go source.

use super::{translate, write_go};
use serde::Serialize;
use std::path::Path;
use typenative_engine::{Diagnostic, TranspileOptions};

/// Machine-readable form printed by `emit --json`
#[derive(Debug, Serialize)]
pub struct EmitReport<'a> {
    pub file: String,
    pub code: &'a str,
    pub diagnostics: &'a [Diagnostic],
}

pub fn execute(
    file: &Path,
    output: Option<&Path>,
    json: bool,
    options: &TranspileOptions,
) -> anyhow::Result<()> {
    let out = translate(file, options)?;
    if json {
        let report = EmitReport {
            file: file.display().to_string(),
            code: &out.code,
            diagnostics: &out.diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match output {
        Some(path) => write_go(path, &out.code)?,
        None => print!("{}", out.code),
    }
    Ok(())
}
