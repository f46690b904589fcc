// src/supervisor/report.rs

//! Per-process lifecycle state and the aggregated fleet result.

use std::fmt;

use crate::types::ExitOutcome;

/// Lifecycle of one managed process.
///
/// `Launched → Running → (Exited | Killed)`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawn succeeded, no monitor attached yet.
    Launched,
    /// Monitor attached; waiting for exit or a stop request.
    Running,
    /// Exited on its own or within the grace period.
    Exited(ExitOutcome),
    /// Force-killed after ignoring the terminate request.
    Killed,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Exited(_) | ProcessState::Killed)
    }

    /// Only a clean `Code(0)` exit counts; a kill is always a failure.
    pub fn succeeded(&self) -> bool {
        matches!(self, ProcessState::Exited(outcome) if outcome.success())
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Launched => f.write_str("launched"),
            ProcessState::Running => f.write_str("running"),
            ProcessState::Exited(outcome) => write!(f, "exited ({outcome})"),
            ProcessState::Killed => f.write_str("killed"),
        }
    }
}

/// Final state of every camera, keyed by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetReport {
    /// Configuration order.
    entries: Vec<(String, ProcessState)>,
    /// Tags in the order their exits were observed.
    exit_order: Vec<String>,
}

impl FleetReport {
    pub fn new(entries: Vec<(String, ProcessState)>, exit_order: Vec<String>) -> Self {
        Self {
            entries,
            exit_order,
        }
    }

    /// True iff every member exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.entries.iter().all(|(_, state)| state.succeeded())
    }

    /// Process exit code for the whole fleet: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }

    pub fn state_of(&self, tag: &str) -> Option<ProcessState> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, state)| *state)
    }

    pub fn entries(&self) -> &[(String, ProcessState)] {
        &self.entries
    }

    pub fn exit_order(&self) -> &[String] {
        &self.exit_order
    }

    pub fn failed_tags(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, state)| !state.succeeded())
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(states: &[(&str, ProcessState)]) -> FleetReport {
        FleetReport::new(
            states.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
            Vec::new(),
        )
    }

    #[test]
    fn all_zero_exits_succeed() {
        let r = report(&[
            ("a", ProcessState::Exited(ExitOutcome::Code(0))),
            ("b", ProcessState::Exited(ExitOutcome::Code(0))),
        ]);
        assert!(r.succeeded());
        assert_eq!(r.exit_code(), 0);
        assert!(r.failed_tags().is_empty());
    }

    #[test]
    fn killed_or_signalled_members_fail_the_fleet() {
        let r = report(&[
            ("a", ProcessState::Exited(ExitOutcome::Code(0))),
            ("b", ProcessState::Killed),
            ("c", ProcessState::Exited(ExitOutcome::Signal(15))),
        ]);
        assert_eq!(r.exit_code(), 1);
        assert_eq!(r.failed_tags(), vec!["b", "c"]);
        assert_eq!(r.state_of("b"), Some(ProcessState::Killed));
        assert_eq!(r.state_of("zzz"), None);
    }

    #[test]
    fn non_terminal_states_are_not_success() {
        assert!(!ProcessState::Running.succeeded());
        assert!(!ProcessState::Launched.is_terminal());
        assert!(ProcessState::Killed.is_terminal());
    }
}
