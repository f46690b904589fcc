// src/types.rs

//! Small shared value types: supervised targets, exit outcomes and the
//! duration strings used in the config file.

use std::fmt;
use std::time::Duration;

/// One supervised camera.
///
/// Only constructed through [`Target::new`], which trims both fields and
/// rejects blanks, so every `Target` in the crate is already valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    tag: String,
    url: String,
}

impl Target {
    /// Build a target from raw config strings.
    ///
    /// Surrounding whitespace is stripped; an empty tag or url after
    /// trimming is rejected with a human-readable reason.
    pub fn new(tag: &str, url: &str) -> Result<Self, String> {
        let tag = tag.trim();
        let url = url.trim();

        if tag.is_empty() {
            return Err("tag is empty".to_string());
        }
        if url.is_empty() {
            return Err(format!("camera '{tag}' has an empty url"));
        }
        if tag == "." || tag == ".." || tag.contains(['/', '\\']) {
            return Err(format!(
                "camera tag '{tag}' cannot be used as an output directory name"
            ));
        }

        Ok(Self {
            tag: tag.to_string(),
            url: url.to_string(),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with the given status code.
    Code(i32),
    /// Terminated by a signal (unix only).
    Signal(i32),
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Code(0))
    }

    /// Convert a std/tokio exit status.
    ///
    /// A status carrying neither a code nor a signal is reported as `Code(-1)`.
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ExitOutcome::Signal(sig);
            }
        }

        ExitOutcome::Code(-1)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Code(code) => write!(f, "code {code}"),
            ExitOutcome::Signal(sig) => write!(f, "signal {sig}"),
        }
    }
}

/// Parse a simple duration string like `"8s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
