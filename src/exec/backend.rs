// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a [`Launcher`] and to boxed [`ChildProcess`]
//! handles instead of `tokio::process` directly. This makes it easy to swap
//! in fake children in tests (ones that ignore SIGTERM, exit after a delay,
//! count how often they were signalled) while keeping the production
//! implementation in [`RealLauncher`] / [`RealChild`].

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::exec::command::CommandSpec;
use crate::types::ExitOutcome;

/// Boxed future returned by the object-safe process traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A live child process owned by its monitor task.
pub trait ChildProcess: Send {
    /// OS process id, if the child has not been reaped yet.
    fn id(&self) -> Option<u32>;

    /// Ask the child to stop (SIGTERM on unix).
    ///
    /// A child that already exited is not an error.
    fn terminate(&mut self) -> io::Result<()>;

    /// Forcefully stop the child (SIGKILL on unix) and reap it.
    fn kill(&mut self) -> BoxFuture<'_, io::Result<()>>;

    /// Wait for the child to exit. Must be cancel safe.
    fn wait(&mut self) -> BoxFuture<'_, io::Result<ExitOutcome>>;
}

/// Trait abstracting how camera commands become running processes.
///
/// Production code uses [`RealLauncher`]; tests provide their own
/// implementation that doesn't spawn real processes.
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &CommandSpec) -> io::Result<Box<dyn ChildProcess>>;
}

/// Launcher backed by `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct RealLauncher {
    capture_output: bool,
}

impl RealLauncher {
    /// With `capture_output`, child stdout/stderr are piped and logged line
    /// by line with the camera tag; otherwise they are inherited.
    pub fn new(capture_output: bool) -> Self {
        Self { capture_output }
    }
}

impl Launcher for RealLauncher {
    fn launch(&self, command: &CommandSpec) -> io::Result<Box<dyn ChildProcess>> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if self.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = cmd.spawn()?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(command.tag.clone(), "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(command.tag.clone(), "stderr", stderr);
        }

        Ok(Box::new(RealChild { child }))
    }
}

/// Drain a child pipe until EOF, logging each line.
///
/// Bytes are decoded lossily; the pipe must stay open for as long as the
/// child writes to it, or the child dies of SIGPIPE.
fn forward_lines<R>(tag: String, stream: &'static str, pipe: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    info!(tag = %tag, stream, "{}", line.trim_end_matches(['\r', '\n']));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(tag = %tag, stream, error = %e, "reading child output failed");
                    break;
                }
            }
        }
        debug!(tag = %tag, stream, "output stream closed");
    });
}

/// A real OS child process.
#[derive(Debug)]
pub struct RealChild {
    child: Child,
}

impl ChildProcess for RealChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        // `id()` is None once tokio has reaped the child.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };

        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!(pid, "process already gone when sending SIGTERM");
                Ok(())
            }
            Err(e) => Err(io::Error::from(e)),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        // No graceful signal here; the grace period still applies before
        // the supervisor gives up on the child.
        if self.child.id().is_none() {
            return Ok(());
        }
        self.child.start_kill()
    }

    fn kill(&mut self) -> BoxFuture<'_, io::Result<()>> {
        Box::pin(async move { self.child.kill().await })
    }

    fn wait(&mut self) -> BoxFuture<'_, io::Result<ExitOutcome>> {
        Box::pin(async move { self.child.wait().await.map(ExitOutcome::from_status) })
    }
}
