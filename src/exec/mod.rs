// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for turning camera targets into running
//! processes, using `tokio::process::Command`, and for watching each one
//! until it is gone.
//!
//! - [`command`] builds the detector argument vector for a target.
//! - [`backend`] provides the `Launcher` / `ChildProcess` traits and the
//!   real implementations; tests replace them with fakes.
//! - [`monitor`] owns one child per Tokio task and runs the
//!   terminate → grace → kill sequence on request.

pub mod backend;
pub mod command;
pub mod monitor;

pub use backend::{BoxFuture, ChildProcess, Launcher, RealChild, RealLauncher};
pub use command::{CommandSpec, build_command};
pub use monitor::{ChildExit, KILL_REAP_TIMEOUT};
