//! CLI definitions for dockerutil.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Config file read when `--config` is not given. Optional.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "dockerutil.toml";

/// dockerutil CLI.
#[derive(Parser, Debug)]
#[command(name = "dockerutil")]
#[command(about = "Label-driven cron jobs and autoheal for Docker containers")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (must exist when given)
    #[arg(short, long, env = "DOCKERUTIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Run the daemon in the foreground (default)
    Run,

    /// Load and validate the configuration, then exit
    CheckConfig,
}
