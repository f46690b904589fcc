// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{FleetError, Result};
use crate::types::Target;

/// Detection/HLS options shared by every camera unless
/// `[detector].common_args` overrides them.
///
/// - only persons (`--classes 0`) with a lowered confidence threshold
/// - no text labels, an ellipse around each person
pub const DEFAULT_COMMON_ARGS: &[&str] = &[
    "--weights",
    "yolov5s.pt",
    "--save-hls",
    "--hls-time",
    "2",
    "--hls-list-size",
    "100",
    "--hls-delete-threshold",
    "2",
    "--hls-segment-type",
    "ts",
    "--hls-vcodec",
    "auto",
    "--rtsp-transport",
    "tcp",
    "--hls-fps",
    "20",
    "--classes",
    "0",
    "--conf-thres",
    "0.05",
    "--hide-labels",
    "--hide-conf",
    "--person-ellipse",
];

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [output]
/// root = "runs/hls"
///
/// [detector]
/// program = "python3"
/// script = "detect.py"
///
/// [shutdown]
/// grace_period = "8s"
///
/// [[camera]]
/// tag = "camera2"
/// url = "rtsp://user:pass@ip:554/stream"
/// ```
///
/// Every section except `[[camera]]` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFleetConfig {
    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub detector: DetectorSection,

    #[serde(default)]
    pub shutdown: ShutdownSection,

    /// All cameras from `[[camera]]`, in file order.
    #[serde(default)]
    pub camera: Vec<RawCamera>,
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    /// Root directory; each camera writes to `<root>/<tag>/`.
    #[serde(default = "default_output_root")]
    pub root: PathBuf,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("runs/hls")
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            root: default_output_root(),
        }
    }
}

/// `[detector]` section: how the external pipeline is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetectorSection {
    /// Executable to run (interpreter or binary).
    #[serde(default = "default_program")]
    pub program: String,

    /// Script passed as first argument; an empty string omits it.
    #[serde(default = "default_script")]
    pub script: String,

    /// Options appended after the per-camera overrides.
    #[serde(default = "default_common_args")]
    pub common_args: Vec<String>,

    /// Pipe child stdout/stderr into the log (tagged per camera). Off by
    /// default: children write straight to the inherited terminal.
    #[serde(default = "default_capture_output")]
    pub capture_output: bool,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_script() -> String {
    "detect.py".to_string()
}

fn default_common_args() -> Vec<String> {
    DEFAULT_COMMON_ARGS.iter().map(|s| s.to_string()).collect()
}

fn default_capture_output() -> bool {
    false
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            script: default_script(),
            common_args: default_common_args(),
            capture_output: default_capture_output(),
        }
    }
}

/// `[shutdown]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShutdownSection {
    /// How long each child gets between SIGTERM and SIGKILL, e.g. `"8s"`.
    /// Unset means [`DEFAULT_GRACE_PERIOD`](crate::shutdown::DEFAULT_GRACE_PERIOD).
    #[serde(default)]
    pub grace_period: Option<String>,
}

/// One `[[camera]]` entry as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCamera {
    pub tag: String,
    pub url: String,
}

impl RawCamera {
    pub fn new(tag: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            url: url.into(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable via `FleetConfig::try_from(RawFleetConfig)`, so holding
/// one means the camera list is non-empty, trimmed and uniquely tagged.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    output_root: PathBuf,
    detector: DetectorSection,
    grace_period: Duration,
    targets: Vec<Target>,
}

impl FleetConfig {
    pub(crate) fn new_unchecked(
        output_root: PathBuf,
        detector: DetectorSection,
        grace_period: Duration,
        targets: Vec<Target>,
    ) -> Self {
        Self {
            output_root,
            detector,
            grace_period,
            targets,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn detector(&self) -> &DetectorSection {
        &self.detector
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Targets in configuration order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Replace the grace period (used for the `--grace-period` flag).
    ///
    /// Rejects a zero duration, same as validation of `[shutdown]`.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Result<Self> {
        if grace_period.is_zero() {
            return Err(FleetError::ConfigError(
                "grace period must be greater than zero".to_string(),
            ));
        }
        self.grace_period = grace_period;
        Ok(self)
    }
}
