//! TypeNative command-line driver
//!
//! Project manifest loading, logging setup and the subcommands behind the
//! `typenative` binary.

pub mod commands;
pub mod config;
pub mod logger;

pub use config::{ConfigError, Manifest, Project, MANIFEST_FILE};
pub use logger::Verbosity;
