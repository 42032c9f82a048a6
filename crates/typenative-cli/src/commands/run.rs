//! `typenative run`: translate and `go run` the result, forwarding the
//! program's exit status.

use super::{go, translate, write_go};
use crate::config::Project;
use std::ffi::OsStr;

pub fn execute(project: &Project, args: &[String]) -> anyhow::Result<i32> {
    let code = translate(&project.entry, &project.options)?.code;
    let go_file = project.go_file();
    write_go(&go_file, &code)?;

    let mut go_args = vec![OsStr::new("run"), go_file.as_os_str()];
    go_args.extend(args.iter().map(OsStr::new));
    go(&project.go, &go_args, &project.root)
}
