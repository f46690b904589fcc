// tests/cli_binary.rs
//
// Drives the `camfleet` binary itself: config file in, OS signal in,
// process exit code out.

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::process::{Child, Command};

type TestResult = Result<(), Box<dyn Error>>;

/// Each child records its pid under `<root>/<tag>/pid`, then behaves
/// according to its tag.
const DETECTOR_SH: &str = r#"
mkdir -p "$4/$6"
echo $$ > "$4/$6/pid"
case "$6" in
  sleeper)  exec sleep 30 ;;
  stubborn) trap '' TERM; while :; do sleep 0.1; done ;;
  graceful) trap 'exit 0' TERM; while :; do sleep 0.1; done ;;
esac
exit 42
"#;

struct Fleet {
    dir: tempfile::TempDir,
    config: PathBuf,
}

impl Fleet {
    fn new(tags: &[&str], grace: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("detect.sh");
        std::fs::write(&script, DETECTOR_SH)?;

        let mut toml = format!(
            "[output]\nroot = {out:?}\n\n\
             [detector]\nprogram = \"sh\"\nscript = {script:?}\ncommon_args = []\n\n\
             [shutdown]\ngrace_period = {grace:?}\n",
            out = dir.path().join("out"),
            script = script,
        );
        for tag in tags {
            toml.push_str(&format!("\n[[camera]]\ntag = \"{tag}\"\nurl = \"rtsp://{tag}\"\n"));
        }

        let config = dir.path().join("Camfleet.toml");
        std::fs::write(&config, toml)?;
        Ok(Self { dir, config })
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn spawn(&self, extra: &[&str]) -> std::io::Result<Child> {
        Command::new(env!("CARGO_BIN_EXE_camfleet"))
            .arg("--config")
            .arg(&self.config)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }
}

/// Wait until every camera has written its pid file.
async fn child_pids(root: &Path, tags: &[&str]) -> Result<Vec<Pid>, Box<dyn Error>> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let pids: Vec<Option<Pid>> = tags
            .iter()
            .map(|tag| {
                std::fs::read_to_string(root.join(tag).join("pid"))
                    .ok()
                    .and_then(|s| s.trim().parse::<i32>().ok())
                    .map(Pid::from_raw)
            })
            .collect();

        if pids.iter().all(Option::is_some) {
            // Give the shells a moment to install their traps.
            tokio::time::sleep(Duration::from_millis(200)).await;
            return Ok(pids.into_iter().flatten().collect());
        }
        if Instant::now() > deadline {
            return Err("camera processes never started".into());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn sigterm(child: &Child) -> TestResult {
    let pid = child.id().ok_or("supervisor already exited")?;
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)?;
    Ok(())
}

fn assert_gone(pids: &[Pid]) {
    for pid in pids {
        assert_eq!(kill(*pid, None), Err(Errno::ESRCH), "child {pid} still alive");
    }
}

async fn exit_status(child: &mut Child) -> std::io::Result<ExitStatus> {
    with_timeout(child.wait()).await
}

#[tokio::test]
async fn sigterm_with_clean_children_exits_zero() -> TestResult {
    init_tracing();
    let tags = ["graceful"];
    let fleet = Fleet::new(&tags, "5s")?;
    let mut supervisor = fleet.spawn(&[])?;

    let pids = child_pids(&fleet.out(), &tags).await?;
    sigterm(&supervisor)?;

    let status = exit_status(&mut supervisor).await?;
    assert_eq!(status.code(), Some(0));
    assert_gone(&pids);

    Ok(())
}

#[tokio::test]
async fn sigterm_stops_every_child_and_reports_failure() -> TestResult {
    init_tracing();
    let tags = ["sleeper", "stubborn", "graceful"];
    // The file says 30s; the flag must win or this test times out.
    let fleet = Fleet::new(&tags, "30s")?;
    let mut supervisor = fleet.spawn(&["--grace-period", "300ms"])?;

    let pids = child_pids(&fleet.out(), &tags).await?;
    let started = Instant::now();
    sigterm(&supervisor)?;

    let status = exit_status(&mut supervisor).await?;
    let elapsed = started.elapsed();

    // `sleeper` dies from SIGTERM and `stubborn` is killed: both failures.
    assert_eq!(status.code(), Some(1));
    assert!(elapsed >= Duration::from_millis(300), "killed before grace: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "grace override ignored: {elapsed:?}");
    assert_gone(&pids);

    Ok(())
}

#[tokio::test]
async fn repeated_signals_do_not_disturb_shutdown() -> TestResult {
    init_tracing();
    let tags = ["graceful"];
    let fleet = Fleet::new(&tags, "5s")?;
    let mut supervisor = fleet.spawn(&[])?;

    let pids = child_pids(&fleet.out(), &tags).await?;
    sigterm(&supervisor)?;
    // A second signal during shutdown is absorbed by the listener's queue
    // or finds the process already gone.
    if let Some(pid) = supervisor.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGINT);
    }

    let status = exit_status(&mut supervisor).await?;
    assert_eq!(status.code(), Some(0));
    assert_gone(&pids);

    Ok(())
}

#[tokio::test]
async fn dry_run_launches_nothing() -> TestResult {
    init_tracing();
    let fleet = Fleet::new(&["sleeper", "stubborn"], "8s")?;

    let output = with_timeout(
        Command::new(env!("CARGO_BIN_EXE_camfleet"))
            .arg("--config")
            .arg(&fleet.config)
            .arg("--dry-run")
            .stdin(Stdio::null())
            .output(),
    )
    .await?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sleeper"));
    assert!(stdout.contains("--source rtsp://stubborn"));
    assert!(!fleet.out().exists(), "dry run must not create the output root");

    Ok(())
}

#[tokio::test]
async fn invalid_config_exits_one_without_creating_output() -> TestResult {
    init_tracing();
    let fleet = Fleet::new(&[], "8s")?;

    let output = with_timeout(
        Command::new(env!("CARGO_BIN_EXE_camfleet"))
            .arg("--config")
            .arg(&fleet.config)
            .stdin(Stdio::null())
            .output(),
    )
    .await?;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one"));
    assert!(!fleet.out().exists());

    Ok(())
}
