#![allow(dead_code)]

use std::path::{Path, PathBuf};

use camfleet::config::{FleetConfig, RawCamera, RawFleetConfig};

/// Builder for `RawFleetConfig` / `FleetConfig` to simplify test setup.
pub struct FleetConfigBuilder {
    config: RawFleetConfig,
}

impl FleetConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawFleetConfig {
                output: Default::default(),
                detector: Default::default(),
                shutdown: Default::default(),
                camera: Vec::new(),
            },
        }
    }

    pub fn with_camera(mut self, tag: &str, url: &str) -> Self {
        self.config.camera.push(RawCamera::new(tag, url));
        self
    }

    /// Add `n` cameras tagged `cam0..cam{n-1}`.
    pub fn with_cameras(mut self, n: usize) -> Self {
        for i in 0..n {
            self.config
                .camera
                .push(RawCamera::new(format!("cam{i}"), format!("rtsp://10.0.0.{i}/stream")));
        }
        self
    }

    pub fn output_root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.output.root = PathBuf::from(root.as_ref());
        self
    }

    pub fn grace_period(mut self, grace: &str) -> Self {
        self.config.shutdown.grace_period = Some(grace.to_string());
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.detector.program = program.to_string();
        self
    }

    pub fn script(mut self, script: &str) -> Self {
        self.config.detector.script = script.to_string();
        self
    }

    pub fn common_args(mut self, args: &[&str]) -> Self {
        self.config.detector.common_args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build_raw(self) -> RawFleetConfig {
        self.config
    }

    pub fn build(self) -> FleetConfig {
        FleetConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for FleetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
