// src/supervisor/controller.rs

//! Cloneable control plane for a launched fleet.
//!
//! The supervisor keeps ownership of the exit stream and the per-member
//! state; the controller only holds the request side of each monitor's
//! control channel, so the shutdown path can run from any task while the
//! coordinating task is blocked in `wait_all`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::exec::monitor::{ChildExit, ControlRequest};

/// Request side of one member's monitor.
#[derive(Debug, Clone)]
pub(crate) struct ChildControl {
    pub(crate) tag: String,
    pub(crate) control_tx: mpsc::Sender<ControlRequest>,
}

/// What one `signal_all` pass did, by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSummary {
    /// Received a terminate request and exited within the grace period.
    pub terminated: Vec<String>,
    /// Ignored the terminate request and were force-killed.
    pub killed: Vec<String>,
    /// Had already exited before (or while) the request was sent.
    pub already_exited: Vec<String>,
}

impl SignalSummary {
    /// Members that were sent a terminate request.
    pub fn signaled(&self) -> usize {
        self.terminated.len() + self.killed.len()
    }
}

/// Handle used to stop every running member of a fleet.
#[derive(Debug, Clone)]
pub struct FleetController {
    members: Arc<[ChildControl]>,
}

impl FleetController {
    pub(crate) fn new(members: Vec<ChildControl>) -> Self {
        Self {
            members: members.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ask every still-running member to stop and wait until all are gone.
    ///
    /// Each monitor handles its own SIGTERM → wait(`grace`) → SIGKILL
    /// sequence, so members are stopped concurrently and this returns after
    /// roughly `grace` at most. A member that exits on its own between the
    /// check and the request is recorded as already exited, not as an error.
    pub async fn signal_all(&self, grace: Duration) -> SignalSummary {
        let mut summary = SignalSummary::default();
        let mut pending = Vec::with_capacity(self.members.len());

        for member in self.members.iter() {
            if member.control_tx.is_closed() {
                debug!(tag = %member.tag, "camera process already exited; not signalling");
                summary.already_exited.push(member.tag.clone());
                continue;
            }

            let (ack_tx, ack_rx) = oneshot::channel();
            match member.control_tx.try_send(ControlRequest::Terminate { grace, ack: ack_tx }) {
                Ok(()) => {
                    info!(tag = %member.tag, "[stop] terminate requested");
                    pending.push((member.tag.clone(), ack_rx));
                }
                Err(e) => {
                    debug!(tag = %member.tag, error = %e, "monitor not accepting requests; treating as exited");
                    summary.already_exited.push(member.tag.clone());
                }
            }
        }

        for (tag, ack_rx) in pending {
            match ack_rx.await {
                Ok(ChildExit::Killed) => summary.killed.push(tag),
                Ok(ChildExit::Exited(_)) => summary.terminated.push(tag),
                // The child won the race: it exited before the monitor read
                // the request, which was dropped with the monitor.
                Err(_) => summary.already_exited.push(tag),
            }
        }

        summary
    }
}
