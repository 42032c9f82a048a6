//! `typenative new`: scaffold a project directory.

use crate::config::{Manifest, MANIFEST_FILE};
use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

const MAIN_TS: &str = r#"// Entry point

function greet(name: string): string {
  return `Hello, ${name}!`;
}

console.log(greet('TypeNative'));
"#;

const GITIGNORE: &str = "dist/\n";

/// Create `dir` with a manifest, an entry file, `.gitignore` and a README
pub fn create_project(dir: &Path, name: &str) -> anyhow::Result<()> {
    if dir.exists() {
        bail!("{} already exists", dir.display());
    }
    let manifest = Manifest::new(name);
    manifest.validate()?;

    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    manifest.to_file(&dir.join(MANIFEST_FILE))?;
    fs::write(dir.join(&manifest.project.entry), MAIN_TS)?;
    fs::write(dir.join(".gitignore"), GITIGNORE)?;
    fs::write(dir.join("README.md"), readme(name))?;
    Ok(())
}

fn readme(name: &str) -> String {
    format!(
        "# {name}\n\nBuilt with TypeNative.\n\n```sh\ntypenative run      # translate and run\ntypenative build    # native binary in dist/\n```\n",
        name = name
    )
}

pub fn execute(name: &str) -> anyhow::Result<()> {
    let dir = Path::new(name);
    let project = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string();
    create_project(dir, &project)?;
    println!("Created new TypeNative project: {}", project);
    println!("  - {}", MANIFEST_FILE);
    println!("  - main.ts");
    Ok(())
}
