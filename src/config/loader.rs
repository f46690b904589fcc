// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{FleetConfig, RawFleetConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawFleetConfig`.
///
/// This only performs TOML deserialization; it does **not** validate the
/// camera list. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFleetConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawFleetConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the entry point used by the binary:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks the camera list (non-empty, no blank tag/url, unique tags) and
///   the detector / shutdown sections.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FleetConfig> {
    let raw_config = load_from_path(&path)?;
    let config = FleetConfig::try_from(raw_config)?;
    Ok(config)
}

/// Default config path: `Camfleet.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Camfleet.toml")
}
