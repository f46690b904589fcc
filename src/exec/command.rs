// src/exec/command.rs

//! Turning a [`Target`] into a launchable command.

use std::fmt;
use std::path::Path;

use crate::config::DetectorSection;
use crate::types::Target;

/// A fully-built invocation for one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Camera tag this command belongs to (not passed to the process itself;
    /// it already appears in `args` after `--name`).
    pub tag: String,
    pub program: String,
    pub args: Vec<String>,
}

/// Program followed by every argument, space separated, for logs.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Build the detector invocation for a single camera.
///
/// Shape:
/// `<program> [<script>] --source <url> --project <root> --name <tag> --exist-ok <common args...>`
///
/// Target fields are substituted verbatim; the common block is identical
/// for every camera.
pub fn build_command(target: &Target, detector: &DetectorSection, output_root: &Path) -> CommandSpec {
    let mut args = Vec::with_capacity(8 + detector.common_args.len());

    let script = detector.script.trim();
    if !script.is_empty() {
        args.push(script.to_string());
    }

    args.extend([
        "--source".to_string(),
        target.url().to_string(),
        "--project".to_string(),
        output_root.to_string_lossy().into_owned(),
        "--name".to_string(),
        target.tag().to_string(),
        "--exist-ok".to_string(),
    ]);
    args.extend(detector.common_args.iter().cloned());

    CommandSpec {
        tag: target.tag().to_string(),
        program: detector.program.trim().to_string(),
        args,
    }
}
