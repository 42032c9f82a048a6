//! TypeNative CLI
//!
//! Translates TypeScript to Go and drives the Go toolchain to build or run
//! the result.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use typenative_cli::commands::{build, emit, new, run};
use typenative_cli::{logger, Project, Verbosity};

#[derive(Parser)]
#[command(name = "typenative")]
#[command(about = "Compile TypeScript to native binaries through Go", long_about = None)]
#[command(version)]
struct Cli {
    /// Log each step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a file and print the Go source
    Emit {
        /// Input file
        file: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print code and diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate and compile to a native binary
    Build {
        /// Input file (defaults to the manifest entry)
        file: Option<PathBuf>,
        /// Output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Binary name
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Translate and run with `go run`
    Run {
        /// Input file (defaults to the manifest entry)
        file: Option<PathBuf>,
        /// Arguments to pass to the program
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Create a new project
    New {
        /// Project directory name
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(Verbosity::from_flags(cli.verbose, cli.quiet));
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Emit { file, output, json } => {
            let project = Project::resolve(&cwd, Some(&file))?;
            emit::execute(&file, output.as_deref(), json, &project.options)?;
        }

        Commands::Build {
            file,
            out_dir,
            output,
        } => {
            let mut project = Project::resolve(&cwd, file.as_deref())?;
            if let Some(out_dir) = out_dir {
                project.out_dir = out_dir;
            }
            let binary = build::execute(&project, output)?;
            if !cli.quiet {
                println!("Built {}", binary.display());
            }
        }

        Commands::Run { file, args } => {
            let project = Project::resolve(&cwd, file.as_deref())?;
            let code = run::execute(&project, &args)?;
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::New { name } => {
            new::execute(&name)?;
        }
    }

    Ok(())
}
