// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod os_signals;
pub mod shutdown;
pub mod supervisor;
pub mod types;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::FleetConfig;
use crate::config::loader::load_and_validate;
use crate::errors::{FleetError, Result};
use crate::exec::{Launcher, RealLauncher, build_command};
use crate::os_signals::ShutdownSignals;
use crate::shutdown::{ShutdownCoordinator, ShutdownReason};
use crate::supervisor::{FleetReport, ProcessSupervisor};
use crate::types::parse_duration;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + validation
/// - signal listeners
/// - the real process launcher
/// - [`supervise`]
///
/// Returns the process exit code for the whole fleet.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = load_and_validate(&args.config)?;

    if let Some(ref raw) = args.grace_period {
        let grace = parse_duration(raw)
            .map_err(|e| FleetError::InvalidDuration(format!("--grace-period: {e}")))?;
        cfg = cfg.with_grace_period(grace)?;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let signals = ShutdownSignals::install().context("installing signal handlers")?;
    let launcher = RealLauncher::new(cfg.detector().capture_output);

    let report = supervise(&cfg, launcher, signals.recv()).await?;
    Ok(report.exit_code())
}

/// Launch every configured camera and supervise the fleet until all of
/// them have exited.
///
/// - The output root is created before anything is launched.
/// - A launch failure stops the cameras already started, then returns the
///   error.
/// - When `shutdown_signal` completes, the termination sequence runs.
/// - Once every member is terminal the termination sequence is triggered
///   again; it only ever runs once, so this is a no-op after a signal.
pub async fn supervise<L, S>(cfg: &FleetConfig, launcher: L, shutdown_signal: S) -> Result<FleetReport>
where
    L: Launcher,
    S: Future<Output = ()> + Send + 'static,
{
    prepare_output_root(cfg.output_root())?;

    let mut supervisor = ProcessSupervisor::new(launcher);
    let launched = supervisor.spawn_all(cfg.targets(), cfg.detector(), cfg.output_root());
    let coordinator = Arc::new(ShutdownCoordinator::new(
        supervisor.controller(),
        cfg.grace_period(),
    ));

    if let Err(err) = launched {
        error!(error = %err, "launch failed; stopping cameras that already started");
        coordinator.trigger(ShutdownReason::LaunchFailure).await;
        let partial = supervisor.wait_all().await;
        debug!(?partial, "partial fleet stopped");
        return Err(err);
    }

    let signal_task = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            shutdown_signal.await;
            coordinator.trigger(ShutdownReason::Signal).await;
        })
    };

    info!(
        cameras = supervisor.members().len(),
        grace = ?coordinator.grace_period(),
        "fleet running; waiting for exits or a shutdown signal"
    );
    let report = supervisor.wait_all().await;

    let reason = if report.succeeded() {
        ShutdownReason::Completion
    } else {
        ShutdownReason::ChildFailure
    };
    coordinator.trigger(reason).await;
    signal_task.abort();

    if report.succeeded() {
        info!(cameras = report.len(), "all camera processes exited cleanly");
    } else {
        error!(failed = ?report.failed_tags(), "one or more camera processes failed");
    }

    Ok(report)
}

/// Create the output root (recursively; an existing directory is fine).
pub fn prepare_output_root(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("creating output root {:?}", root))?;
    debug!(root = ?root, "output root ready");
    Ok(())
}

/// Simple dry-run output: print cameras and their commands.
fn print_dry_run(cfg: &FleetConfig) {
    println!("camfleet dry-run");
    println!("  output root = {}", cfg.output_root().display());
    println!("  grace period = {:?}", cfg.grace_period());
    println!();

    println!("cameras ({}):", cfg.targets().len());
    for target in cfg.targets() {
        let command = build_command(target, cfg.detector(), cfg.output_root());
        println!("  - {}", target.tag());
        println!("      url: {}", target.url());
        println!("      cmd: {}", command);
    }

    debug!("dry-run complete (nothing launched)");
}
