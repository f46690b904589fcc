// src/exec/monitor.rs

//! Per-child monitor task.
//!
//! Every launched camera process is moved into its own Tokio task, which is
//! then the only owner of the child handle. The task waits for whichever
//! comes first:
//! - the child exits on its own, or
//! - the supervisor asks it to stop, in which case it sends SIGTERM, waits
//!   up to the grace period and force-kills on timeout.
//!
//! Either way exactly one [`ExitEvent`] is emitted and the handle is
//! dropped with the task.

use std::io;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::exec::backend::ChildProcess;
use crate::types::ExitOutcome;

/// How long to wait for the OS to reap a child after SIGKILL before the
/// monitor gives up on it.
pub const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal result for one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Exited on its own or within the grace period after SIGTERM.
    Exited(ExitOutcome),
    /// Force-killed after the grace period ran out.
    Killed,
}

/// Request sent from the fleet controller to a monitor.
#[derive(Debug)]
pub enum ControlRequest {
    /// Stop the child, allowing `grace` before SIGKILL. The monitor replies
    /// on `ack` once the child is gone.
    Terminate {
        grace: Duration,
        ack: oneshot::Sender<ChildExit>,
    },
}

/// Emitted by a monitor when its child reaches a terminal state.
#[derive(Debug, Clone)]
pub struct ExitEvent {
    /// Position of the member in the supervision set.
    pub index: usize,
    pub tag: String,
    pub exit: ChildExit,
}

/// Drive one child until it is terminal, then report on `exit_tx`.
///
/// A closed control channel only disables the stop path; the monitor keeps
/// waiting for the child.
pub async fn monitor_child(
    index: usize,
    tag: String,
    mut child: Box<dyn ChildProcess>,
    mut control_rx: mpsc::Receiver<ControlRequest>,
    exit_tx: mpsc::UnboundedSender<ExitEvent>,
) {
    let (exit, ack) = tokio::select! {
        res = child.wait() => (ChildExit::Exited(outcome_or_failed(&tag, res)), None),

        Some(request) = control_rx.recv() => match request {
            ControlRequest::Terminate { grace, ack } => {
                (stop_child(&tag, child.as_mut(), grace).await, Some(ack))
            }
        },
    };

    if exit_tx
        .send(ExitEvent {
            index,
            tag: tag.clone(),
            exit,
        })
        .is_err()
    {
        debug!(tag = %tag, "supervisor gone before exit event was delivered");
    }

    if let Some(ack) = ack {
        let _ = ack.send(exit);
    }

    debug!(tag = %tag, "monitor finished; releasing child handle");
}

/// Two-phase stop: SIGTERM, bounded wait, SIGKILL.
async fn stop_child(tag: &str, child: &mut dyn ChildProcess, grace: Duration) -> ChildExit {
    if let Err(e) = child.terminate() {
        warn!(tag = %tag, error = %e, "failed to deliver terminate request");
    }

    match timeout(grace, child.wait()).await {
        Ok(res) => {
            let outcome = outcome_or_failed(tag, res);
            info!(tag = %tag, %outcome, "camera process stopped after terminate request");
            ChildExit::Exited(outcome)
        }
        Err(_) => {
            warn!(
                tag = %tag,
                grace = ?grace,
                "[kill] camera process ignored terminate request; force-killing"
            );
            force_kill(tag, child).await;
            ChildExit::Killed
        }
    }
}

async fn force_kill(tag: &str, child: &mut dyn ChildProcess) {
    if let Err(e) = child.kill().await {
        warn!(tag = %tag, error = %e, "kill failed; child may already have been reaped");
    }

    match timeout(KILL_REAP_TIMEOUT, child.wait()).await {
        Ok(_) => debug!(tag = %tag, "killed camera process reaped"),
        Err(_) => error!(
            tag = %tag,
            pid = ?child.id(),
            "camera process still not reaped {:?} after kill; abandoning it",
            KILL_REAP_TIMEOUT
        ),
    }
}

/// Wait errors are reported as a failed exit (code -1).
fn outcome_or_failed(tag: &str, res: io::Result<ExitOutcome>) -> ExitOutcome {
    match res {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(tag = %tag, error = %e, "error waiting for camera process");
            ExitOutcome::Code(-1)
        }
    }
}
