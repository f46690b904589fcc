// src/supervisor/mod.rs

//! Process supervision for the camera fleet.
//!
//! - [`ProcessSupervisor`] launches one process per target, owns the
//!   supervision set and collects exits in the order they happen.
//! - [`controller`] holds the cloneable stop handle used by shutdown.
//! - [`report`] defines per-process lifecycle state and the fleet result.

pub mod controller;
pub mod report;

pub use controller::{FleetController, SignalSummary};
pub use report::{FleetReport, ProcessState};

use std::path::Path;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::DetectorSection;
use crate::errors::{FleetError, Result};
use crate::exec::command::{CommandSpec, build_command};
use crate::exec::monitor::{ChildExit, ExitEvent, monitor_child};
use crate::exec::Launcher;
use crate::types::Target;

use controller::ChildControl;

/// Runtime handle for one launched target.
#[derive(Debug)]
pub struct ManagedProcess {
    target: Target,
    pid: Option<u32>,
    state: ProcessState,
    control: ChildControl,
    /// Monitor task owning the OS child; released once the terminal state
    /// has been recorded.
    monitor: Option<JoinHandle<()>>,
}

impl ManagedProcess {
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }
}

/// Owns the set of running camera processes.
///
/// Membership is fixed once [`spawn_all`](Self::spawn_all) returns (even if
/// it returned an error); afterwards only state transitions happen.
pub struct ProcessSupervisor<L: Launcher> {
    launcher: L,
    members: Vec<ManagedProcess>,
    launched: bool,
    exit_tx: mpsc::UnboundedSender<ExitEvent>,
    exit_rx: mpsc::UnboundedReceiver<ExitEvent>,
    exit_order: Vec<String>,
}

impl<L: Launcher> std::fmt::Debug for ProcessSupervisor<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("members", &self.members)
            .field("exit_order", &self.exit_order)
            .finish_non_exhaustive()
    }
}

impl<L: Launcher> ProcessSupervisor<L> {
    pub fn new(launcher: L) -> Self {
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        Self {
            launcher,
            members: Vec::new(),
            launched: false,
            exit_tx,
            exit_rx,
            exit_order: Vec::new(),
        }
    }

    /// Members in configuration order.
    pub fn members(&self) -> &[ManagedProcess] {
        &self.members
    }

    /// Launch every target, in order.
    ///
    /// The first launch failure aborts the loop and is returned as
    /// [`FleetError::LaunchError`]; members launched before it stay in the
    /// set so the caller can shut them down.
    pub fn spawn_all(
        &mut self,
        targets: &[Target],
        detector: &DetectorSection,
        output_root: &Path,
    ) -> Result<()> {
        if self.launched {
            return Err(FleetError::Other(anyhow!(
                "fleet already launched; membership is fixed"
            )));
        }
        self.launched = true;

        for target in targets {
            let command = build_command(target, detector, output_root);
            info!(tag = %target.tag(), command = %command, "[start] launching camera process");
            self.spawn_one(target, &command)?;
        }

        info!(count = self.members.len(), "all camera processes launched");
        Ok(())
    }

    fn spawn_one(&mut self, target: &Target, command: &CommandSpec) -> Result<()> {
        let child = self.launcher.launch(command).map_err(|source| {
            error!(tag = %target.tag(), error = %source, "failed to launch camera process");
            FleetError::LaunchError {
                tag: target.tag().to_string(),
                source,
            }
        })?;

        let pid = child.id();
        let index = self.members.len();
        let (control_tx, control_rx) = mpsc::channel(1);

        let mut member = ManagedProcess {
            target: target.clone(),
            pid,
            state: ProcessState::Launched,
            control: ChildControl {
                tag: target.tag().to_string(),
                control_tx,
            },
            monitor: None,
        };
        debug!(tag = %target.tag(), ?pid, "camera process launched");

        member.monitor = Some(tokio::spawn(monitor_child(
            index,
            target.tag().to_string(),
            child,
            control_rx,
            self.exit_tx.clone(),
        )));
        member.state = ProcessState::Running;

        self.members.push(member);
        Ok(())
    }

    /// Stop handle for the current members.
    pub fn controller(&self) -> FleetController {
        FleetController::new(self.members.iter().map(|m| m.control.clone()).collect())
    }

    /// Block until every member is terminal and return the fleet report.
    ///
    /// Exits are recorded in the order they are observed. Cancel safe: if
    /// the future is dropped (e.g. raced in `tokio::select!`), already
    /// recorded exits are kept and a later call resumes.
    pub async fn wait_all(&mut self) -> FleetReport {
        while !self.all_terminal() {
            match self.exit_rx.recv().await {
                Some(event) => self.record(event),
                // Unreachable while `self.exit_tx` is alive.
                None => break,
            }
        }

        self.report()
    }

    fn all_terminal(&self) -> bool {
        self.members.iter().all(|m| m.state.is_terminal())
    }

    fn record(&mut self, event: ExitEvent) {
        let Some(member) = self.members.get_mut(event.index) else {
            warn!(tag = %event.tag, index = event.index, "exit event for unknown member");
            return;
        };

        if member.state.is_terminal() {
            debug!(tag = %event.tag, "duplicate exit event ignored");
            return;
        }

        member.state = match event.exit {
            ChildExit::Exited(outcome) => {
                if outcome.success() {
                    info!(tag = %event.tag, "[exit] camera process exited cleanly");
                } else {
                    warn!(tag = %event.tag, pid = ?member.pid, "[exit] camera process exited with {outcome}");
                }
                ProcessState::Exited(outcome)
            }
            ChildExit::Killed => {
                warn!(tag = %event.tag, pid = ?member.pid, "[exit] camera process was force-killed");
                ProcessState::Killed
            }
        };

        // The monitor has finished with the child; drop our handle to it.
        member.monitor.take();
        self.exit_order.push(event.tag);
    }

    /// Snapshot of the current states (terminal or not).
    pub fn report(&self) -> FleetReport {
        FleetReport::new(
            self.members
                .iter()
                .map(|m| (m.target.tag().to_string(), m.state))
                .collect(),
            self.exit_order.clone(),
        )
    }
}

impl<L: Launcher> Drop for ProcessSupervisor<L> {
    fn drop(&mut self) {
        for member in &mut self.members {
            if let Some(monitor) = member.monitor.take() {
                if !member.state.is_terminal() {
                    // Aborting drops the child, which kills it (`kill_on_drop`).
                    warn!(tag = %member.target.tag(), "supervisor dropped with camera still running; killing it");
                    monitor.abort();
                }
            }
        }
    }
}
