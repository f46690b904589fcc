use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use camfleet::exec::{BoxFuture, ChildProcess, CommandSpec, Launcher};
use camfleet::types::ExitOutcome;

/// SIGKILL, as reported for fake children that were killed.
pub const FAKE_KILL_SIGNAL: i32 = 9;

static NEXT_PID: AtomicU32 = AtomicU32::new(40_000);

/// How a fake child reacts to a terminate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnTerminate {
    /// Exit immediately with this code.
    Exit(i32),
    /// Keep running until killed.
    Ignore,
}

/// Scripted behaviour for one fake child.
#[derive(Debug, Clone, Copy)]
pub struct ChildScript {
    pub exit_after: Option<(Duration, i32)>,
    pub on_terminate: OnTerminate,
}

impl ChildScript {
    /// Runs until terminated; exits 0 on terminate.
    pub fn run_forever() -> Self {
        Self {
            exit_after: None,
            on_terminate: OnTerminate::Exit(0),
        }
    }

    /// Exits on its own with `code` after `delay`.
    pub fn exit_after(delay: Duration, code: i32) -> Self {
        Self {
            exit_after: Some((delay, code)),
            on_terminate: OnTerminate::Exit(0),
        }
    }

    pub fn on_terminate(mut self, reaction: OnTerminate) -> Self {
        self.on_terminate = reaction;
        self
    }

    pub fn ignoring_terminate(self) -> Self {
        self.on_terminate(OnTerminate::Ignore)
    }
}

/// Counters shared with a launched fake child.
#[derive(Debug, Default)]
pub struct ChildProbe {
    pub terminates: AtomicUsize,
    pub kills: AtomicUsize,
}

impl ChildProbe {
    pub fn terminates(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

/// A fake launcher that:
/// - records every command it was asked to launch
/// - hands out scripted [`FakeChild`]s, keyed by camera tag
/// - can be told to fail for specific tags.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    scripts: HashMap<String, ChildScript>,
    default_script: Option<ChildScript>,
    fail_for: HashSet<String>,
    launched: Arc<Mutex<Vec<CommandSpec>>>,
    probes: Arc<Mutex<HashMap<String, Arc<ChildProbe>>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, tag: &str, script: ChildScript) -> Self {
        self.scripts.insert(tag.to_string(), script);
        self
    }

    /// Script used for tags without an explicit one (default: run forever).
    pub fn with_default_script(mut self, script: ChildScript) -> Self {
        self.default_script = Some(script);
        self
    }

    pub fn failing_for(mut self, tag: &str) -> Self {
        self.fail_for.insert(tag.to_string());
        self
    }

    /// Commands launched so far, in launch order.
    pub fn launched(&self) -> Vec<CommandSpec> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_tags(&self) -> Vec<String> {
        self.launched().into_iter().map(|c| c.tag).collect()
    }

    pub fn probe(&self, tag: &str) -> Arc<ChildProbe> {
        self.probes
            .lock()
            .unwrap()
            .get(tag)
            .cloned()
            .unwrap_or_else(|| panic!("no child launched for tag '{tag}'"))
    }
}

impl Launcher for FakeLauncher {
    fn launch(&self, command: &CommandSpec) -> io::Result<Box<dyn ChildProcess>> {
        if self.fail_for.contains(&command.tag) {
            debug!(tag = %command.tag, "fake launch failure");
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("fake launch failure for '{}'", command.tag),
            ));
        }

        self.launched.lock().unwrap().push(command.clone());

        let script = self
            .scripts
            .get(&command.tag)
            .copied()
            .or(self.default_script)
            .unwrap_or_else(ChildScript::run_forever);

        let probe = Arc::new(ChildProbe::default());
        self.probes
            .lock()
            .unwrap()
            .insert(command.tag.clone(), Arc::clone(&probe));

        debug!(tag = %command.tag, ?script, "fake child started");
        Ok(Box::new(FakeChild::start(script, probe)))
    }
}

/// In-memory child process driven by a [`ChildScript`].
pub struct FakeChild {
    pid: u32,
    script: ChildScript,
    probe: Arc<ChildProbe>,
    exit_tx: Arc<watch::Sender<Option<ExitOutcome>>>,
    exit_rx: watch::Receiver<Option<ExitOutcome>>,
    timer: Option<JoinHandle<()>>,
}

impl FakeChild {
    pub fn start(script: ChildScript, probe: Arc<ChildProbe>) -> Self {
        let (tx, rx) = watch::channel(None);
        let exit_tx = Arc::new(tx);

        let timer = script.exit_after.map(|(delay, code)| {
            let tx = Arc::clone(&exit_tx);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                finish(&tx, ExitOutcome::Code(code));
            })
        });

        Self {
            pid: NEXT_PID.fetch_add(1, Ordering::SeqCst),
            script,
            probe,
            exit_tx,
            exit_rx: rx,
            timer,
        }
    }

    fn has_exited(&self) -> bool {
        self.exit_rx.borrow().is_some()
    }
}

/// First exit wins; later ones are ignored.
fn finish(tx: &watch::Sender<Option<ExitOutcome>>, outcome: ExitOutcome) {
    tx.send_if_modified(|current| {
        if current.is_none() {
            *current = Some(outcome);
            true
        } else {
            false
        }
    });
}

impl ChildProcess for FakeChild {
    fn id(&self) -> Option<u32> {
        if self.has_exited() { None } else { Some(self.pid) }
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.probe.terminates.fetch_add(1, Ordering::SeqCst);
        debug!(pid = self.pid, reaction = ?self.script.on_terminate, "fake child got terminate");
        if let OnTerminate::Exit(code) = self.script.on_terminate {
            finish(&self.exit_tx, ExitOutcome::Code(code));
        }
        Ok(())
    }

    fn kill(&mut self) -> BoxFuture<'_, io::Result<()>> {
        self.probe.kills.fetch_add(1, Ordering::SeqCst);
        debug!(pid = self.pid, "fake child killed");
        finish(&self.exit_tx, ExitOutcome::Signal(FAKE_KILL_SIGNAL));
        Box::pin(async { Ok(()) })
    }

    fn wait(&mut self) -> BoxFuture<'_, io::Result<ExitOutcome>> {
        let mut rx = self.exit_rx.clone();
        Box::pin(async move {
            let outcome = *rx
                .wait_for(|v| v.is_some())
                .await
                .map_err(|_| io::Error::other("fake child exit channel closed"))?;
            outcome.ok_or_else(|| io::Error::other("fake child reported no outcome"))
        })
    }
}

impl Drop for FakeChild {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
