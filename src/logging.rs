// src/logging.rs

//! Logging setup for `camfleet` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection:
//! 1. `--log-level` wins and applies to everything.
//! 2. Otherwise `CAMFLEET_LOG` is read as an `EnvFilter` directive, so both
//!    `debug` and `camfleet::exec=trace,info` work.
//! 3. Otherwise `info`.
//!
//! Output goes to stderr; uncaptured children keep the inherited stdout.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "CAMFLEET_LOG";

/// Install the global subscriber. Call once, before anything is launched.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::default().add_directive(LevelFilter::from(level).into()),
        None => filter_from_env(std::env::var(LOG_ENV_VAR).ok().as_deref()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Unset, empty or unparsable values fall back to `info`.
fn filter_from_env(raw: Option<&str>) -> EnvFilter {
    let fallback = || EnvFilter::default().add_directive(LevelFilter::INFO.into());

    match raw.map(str::trim) {
        None | Some("") => fallback(),
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("camfleet: ignoring invalid {LOG_ENV_VAR}={directives:?}: {e}");
            fallback()
        }),
    }
}
