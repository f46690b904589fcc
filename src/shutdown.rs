// src/shutdown.rs

//! Idempotent fleet shutdown.
//!
//! Every path that wants the fleet stopped (OS signal, a launch failure,
//! wait-all finishing with or without failures) calls
//! [`ShutdownCoordinator::trigger`]. The check-and-set of the stopping state
//! and the termination sequence itself run under one async mutex, so the
//! sequence executes at most once no matter how many callers race, and
//! every caller returns only after it has completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::supervisor::{FleetController, SignalSummary};

/// Default time between terminate request and force-kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(8);

/// Why shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / SIGTERM / Ctrl-C.
    Signal,
    /// All members finished and at least one failed.
    ChildFailure,
    /// A member could not be launched.
    LaunchFailure,
    /// All members finished successfully.
    Completion,
}

/// Record of the single termination sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownSummary {
    pub reason: ShutdownReason,
    pub signal: SignalSummary,
    pub elapsed: Duration,
}

#[derive(Debug)]
enum ShutdownState {
    Running,
    Stopped(ShutdownSummary),
}

/// Runs the fleet's termination sequence exactly once.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    controller: FleetController,
    grace: Duration,
    stopping: AtomicBool,
    state: Mutex<ShutdownState>,
}

impl ShutdownCoordinator {
    pub fn new(controller: FleetController, grace: Duration) -> Self {
        Self {
            controller,
            grace,
            stopping: AtomicBool::new(false),
            state: Mutex::new(ShutdownState::Running),
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    /// Lock-free view of whether shutdown has started.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Request shutdown.
    ///
    /// The first caller runs `signal_all` and gets the summary back; every
    /// other caller (concurrent or later) waits for that run to finish and
    /// gets `None`.
    pub async fn trigger(&self, reason: ShutdownReason) -> Option<ShutdownSummary> {
        if self.is_stopping() {
            debug!(?reason, "shutdown already in progress; waiting for it to finish");
        }

        let mut state = self.state.lock().await;
        if let ShutdownState::Stopped(done) = &*state {
            debug!(
                ?reason,
                first_reason = ?done.reason,
                "shutdown already completed; ignoring trigger"
            );
            return None;
        }

        self.stopping.store(true, Ordering::Release);
        info!(
            ?reason,
            grace = ?self.grace,
            members = self.controller.len(),
            "[stop] terminating camera processes"
        );

        let started = Instant::now();
        let signal = self.controller.signal_all(self.grace).await;
        let summary = ShutdownSummary {
            reason,
            signal,
            elapsed: started.elapsed(),
        };

        info!(
            ?reason,
            signaled = summary.signal.signaled(),
            killed = summary.signal.killed.len(),
            elapsed = ?summary.elapsed,
            "shutdown sequence complete"
        );

        *state = ShutdownState::Stopped(summary.clone());
        Some(summary)
    }

    /// Summary of the completed sequence, if it has run.
    pub async fn summary(&self) -> Option<ShutdownSummary> {
        match &*self.state.lock().await {
            ShutdownState::Stopped(summary) => Some(summary.clone()),
            ShutdownState::Running => None,
        }
    }
}
