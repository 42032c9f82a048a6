//! `typenative build`: translate into `<out_dir>/code.go` and compile it
//! with `go build`.

use super::{binary_name, go, translate, write_go};
use crate::config::Project;
use anyhow::bail;
use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::info;

pub fn execute(project: &Project, output: Option<String>) -> anyhow::Result<PathBuf> {
    let code = translate(&project.entry, &project.options)?.code;
    let go_file = project.go_file();
    write_go(&go_file, &code)?;

    let binary = project
        .out_dir
        .join(binary_name(output.as_deref().unwrap_or(&project.name)));
    let args = [OsStr::new("build"), OsStr::new("-o"), binary.as_os_str(), go_file.as_os_str()];
    let code = go(&project.go, &args, &project.root)?;
    if code != 0 {
        bail!("go build exited with status {}", code);
    }
    info!("built {}", binary.display());
    Ok(binary)
}
