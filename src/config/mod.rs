// src/config/mod.rs

//! Configuration loading and validation for camfleet.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the camera list before anything is launched (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    DEFAULT_COMMON_ARGS, DetectorSection, FleetConfig, OutputSection, RawCamera, RawFleetConfig,
    ShutdownSection,
};
pub use validate::validate_targets;
