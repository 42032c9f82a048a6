//! Subcommand implementations

pub mod build;
pub mod emit;
pub mod new;
pub mod run;

use anyhow::{bail, Context};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};
use typenative_engine::{single_file, transpile, Report, Transpilation, TranspileOptions};

/// Translate one file. Diagnostics are rendered to stderr; a translation
/// error is rendered and turned into a failure.
pub fn translate(path: &Path, options: &TranspileOptions) -> anyhow::Result<Transpilation> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let files = single_file(path.display().to_string(), source.clone());

    debug!(file = %path.display(), "translate");
    match transpile(&source, options) {
        Ok(out) => {
            if !out.diagnostics.is_empty() {
                warn!(count = out.diagnostics.len(), "translation produced diagnostics");
            }
            for diagnostic in &out.diagnostics {
                let _ = Report::from_diagnostic(diagnostic, 0).emit_stderr(&files);
            }
            Ok(out)
        }
        Err(e) => {
            let _ = Report::from_error(&e, 0).emit_stderr(&files);
            bail!("translation of {} failed: {}", path.display(), e)
        }
    }
}

/// Write generated Go to `file`, creating its directory
pub fn write_go(file: &Path, code: &str) -> anyhow::Result<()> {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(file, code).with_context(|| format!("failed to write {}", file.display()))?;
    info!("wrote {}", file.display());
    Ok(())
}

/// `go <args…>` with inherited stdio; returns the exit code
pub fn go(go: &str, args: &[&std::ffi::OsStr], dir: &Path) -> anyhow::Result<i32> {
    debug!(go, ?args, "spawn");
    let status = Command::new(go)
        .args(args)
        .current_dir(dir)
        .status()
        .with_context(|| format!("failed to run '{}'; is the Go toolchain installed?", go))?;
    Ok(status.code().unwrap_or(1))
}

/// Executable file name for the current platform
pub fn binary_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}
