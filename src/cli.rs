// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `camfleet`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "camfleet",
    version,
    about = "Launch and supervise one detector pipeline per camera.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the camera config file (TOML).
    ///
    /// Default: `Camfleet.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CAMFLEET_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[shutdown].grace_period` (e.g. "8s", "500ms").
    #[arg(long, value_name = "DURATION")]
    pub grace_period: Option<String>,

    /// Validate the config and print every camera command, but launch nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
