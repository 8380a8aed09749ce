//! Bounded supervision of a child process.
//!
//! The browser pipeline runs in its own process so that a wedged browser can
//! be killed without taking the caller down. [`run_bounded`] starts a command,
//! merges its stdout and stderr into one log in arrival order, and enforces an
//! optional deadline. It never returns an error: every failure ends up in the
//! [`RunOutcome`].

use crate::error::Result;
use crate::record::{artifact_path, canonicalize_records, load_artifact, TrialRecord};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

/// Wait after a kill before giving up on reaping the child
const KILL_GRACE: Duration = Duration::from_secs(5);

/// How long to keep reading output after the child itself has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Status reported when the child's exit code is unknown
pub const UNKNOWN_STATUS: i32 = -1;

/// Default deadline for an orchestrated pipeline run
pub const DEFAULT_PIPELINE_TIMEOUT: Duration = Duration::from_secs(600);

pub const TIMEOUT_LOG_LINE: &str = "Process killed due to timeout.";

/// Program, arguments and deadline for one supervised run.
#[derive(Debug, Clone)]
pub struct BoundedCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl BoundedCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

/// What happened to a supervised run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Exit code, or [`UNKNOWN_STATUS`]
    pub status: i32,
    pub elapsed: Duration,
    /// Output lines of both streams, then any supervisor notes
    pub logs: Vec<String>,
    pub timed_out: bool,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.status == 0 && !self.timed_out
    }
}

fn forward_lines<R>(stream: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if tx.send(line.trim_end_matches(['\r', '\n']).to_string()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(format!("Failed to read child output: {}", e));
                    break;
                }
            }
        }
    });
}

fn push_line(logs: &mut Vec<String>, line: String) {
    debug!(target: "child", "{}", line);
    logs.push(line);
}

/// Sleep until `deadline`, or forever without one.
async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn supervise(
    child: &mut Child,
    limit: Option<Duration>,
    logs: &mut Vec<String>,
    timed_out: &mut bool,
) -> std::io::Result<i32> {
    let (tx, mut lines) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx.clone());
    }
    drop(tx);

    let deadline = limit.map(|limit| Instant::now() + limit);
    let mut streams_open = true;
    let exited = loop {
        tokio::select! {
            line = lines.recv(), if streams_open => match line {
                Some(line) => push_line(logs, line),
                None => streams_open = false,
            },
            status = child.wait() => break Some(status?),
            _ = deadline_elapsed(deadline) => break None,
        }
    };

    if let Some(status) = exited {
        // descendants may still hold the pipes open
        let grace_end = Instant::now() + OUTPUT_GRACE;
        while streams_open {
            match timeout_at(grace_end, lines.recv()).await {
                Ok(Some(line)) => push_line(logs, line),
                Ok(None) => streams_open = false,
                Err(_) => {
                    debug!("Child output still open after exit, not waiting further");
                    break;
                }
            }
        }
        return Ok(status.code().unwrap_or(UNKNOWN_STATUS));
    }

    *timed_out = true;
    while let Ok(line) = lines.try_recv() {
        push_line(logs, line);
    }
    warn!(?limit, "Child exceeded its deadline, killing");
    logs.push(TIMEOUT_LOG_LINE.to_string());
    child.start_kill()?;
    match timeout(KILL_GRACE, child.wait()).await {
        Ok(status) => Ok(status?.code().unwrap_or(UNKNOWN_STATUS)),
        Err(_) => {
            warn!("Child not reaped within the kill grace period");
            Ok(UNKNOWN_STATUS)
        }
    }
}

/// Run `cmd` to completion or until its deadline.
pub async fn run_bounded(cmd: &BoundedCommand) -> RunOutcome {
    let started = Instant::now();
    let mut logs = Vec::new();
    let mut timed_out = false;
    info!(program = %cmd.program.display(), args = ?cmd.args, timeout = ?cmd.timeout, "Starting child process");

    let spawned = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let status = match spawned {
        Ok(mut child) => match supervise(&mut child, cmd.timeout, &mut logs, &mut timed_out).await {
            Ok(status) => status,
            Err(e) => {
                if let Err(kill_err) = child.start_kill() {
                    debug!(error = %kill_err, "Best-effort kill failed");
                }
                logs.push(format!("Exception while running {}: {}", cmd.program.display(), e));
                UNKNOWN_STATUS
            }
        },
        Err(e) => {
            logs.push(format!("Exception while running {}: {}", cmd.program.display(), e));
            UNKNOWN_STATUS
        }
    };

    let outcome = RunOutcome {
        status,
        elapsed: started.elapsed(),
        logs,
        timed_out,
    };
    info!(
        status = outcome.status,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        timed_out = outcome.timed_out,
        lines = outcome.logs.len(),
        "Child process finished"
    );
    outcome
}

/// Command line for a pipeline child run of `exe scrape …`.
pub fn scrape_command(
    exe: &Path,
    query: &str,
    max: usize,
    output: &Path,
    headless: bool,
    limit: Option<Duration>,
) -> BoundedCommand {
    let mut cmd = BoundedCommand::new(exe)
        .arg("scrape")
        .arg("--disease")
        .arg(query)
        .arg("--max-results")
        .arg(max.to_string())
        .arg("--output")
        .arg(output.display().to_string())
        .arg(if headless { "--headless" } else { "--no-headless" });
    cmd.timeout = limit;
    cmd
}

/// Result of an orchestrated browser run.
#[derive(Debug)]
pub struct BrowserRun {
    pub outcome: RunOutcome,
    pub artifact: PathBuf,
    /// Canonicalized records; empty unless the run succeeded
    pub records: Vec<TrialRecord>,
}

/// Run the pipeline in a child process and load its artifact.
///
/// Only a failure to read the artifact of a successful run is an error; a
/// failed run comes back with its outcome and no records.
pub async fn run_browser_pipeline(
    exe: &Path,
    condition: &str,
    max: usize,
    output_dir: &Path,
    limit: Option<Duration>,
) -> Result<BrowserRun> {
    let artifact = artifact_path(output_dir, "browser", condition);
    let cmd = scrape_command(exe, condition, max, &artifact, true, limit);
    let outcome = run_bounded(&cmd).await;

    let records = if outcome.success() && artifact.exists() {
        let records = canonicalize_records(load_artifact(&artifact)?);
        info!(count = records.len(), artifact = %artifact.display(), "Loaded browser artifact");
        records
    } else {
        warn!(status = outcome.status, timed_out = outcome.timed_out, "Browser pipeline failed");
        Vec::new()
    };

    Ok(BrowserRun {
        outcome,
        artifact,
        records,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> BoundedCommand {
        BoundedCommand::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_collects_both_streams() {
        let outcome = run_bounded(&sh("echo one; echo two 1>&2; exit 3")).await;
        assert_eq!(outcome.status, 3);
        assert!(!outcome.timed_out);
        assert!(!outcome.success());
        assert!(outcome.logs.contains(&"one".to_string()));
        assert!(outcome.logs.contains(&"two".to_string()));
    }

    #[tokio::test]
    async fn test_ordered_log_on_one_stream() {
        let outcome = run_bounded(&sh("echo a; echo b; echo c").timeout(Duration::from_secs(10))).await;
        assert!(outcome.success());
        assert_eq!(outcome.logs, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let cmd = BoundedCommand::new("sleep").arg("10").timeout(Duration::from_secs(1));
        let outcome = run_bounded(&cmd).await;
        assert!(outcome.timed_out);
        assert!(!outcome.success());
        assert_eq!(outcome.status, UNKNOWN_STATUS);
        assert_eq!(outcome.logs.last().map(String::as_str), Some(TIMEOUT_LOG_LINE));
        assert!(outcome.elapsed < Duration::from_secs(5), "took {:?}", outcome.elapsed);
    }

    #[tokio::test]
    async fn test_exit_with_lingering_descendant() {
        let script = "(sleep 5 &); echo done; exit 0";
        let outcome = run_bounded(&sh(script).timeout(Duration::from_secs(3))).await;
        assert_eq!(outcome.status, 0);
        assert!(!outcome.timed_out);
        assert!(outcome.success());
        assert_eq!(outcome.logs, vec!["done"]);
        assert!(outcome.elapsed < Duration::from_secs(2), "took {:?}", outcome.elapsed);

        let unbounded = run_bounded(&sh(script)).await;
        assert!(unbounded.success());
        assert!(unbounded.elapsed < Duration::from_secs(2), "took {:?}", unbounded.elapsed);
    }

    #[tokio::test]
    async fn test_missing_program_is_reported() {
        let outcome = run_bounded(&BoundedCommand::new("/nonexistent/trialharvest-child")).await;
        assert_eq!(outcome.status, UNKNOWN_STATUS);
        assert!(!outcome.success());
        assert_eq!(outcome.logs.len(), 1);
        assert!(outcome.logs[0].starts_with("Exception while running /nonexistent/trialharvest-child:"));
    }

    #[test]
    fn test_scrape_command() {
        let cmd = scrape_command(
            Path::new("/bin/trialharvest"),
            "lung cancer",
            25,
            Path::new("out/run.jsonl"),
            false,
            Some(Duration::from_secs(60)),
        );
        assert_eq!(cmd.program, PathBuf::from("/bin/trialharvest"));
        assert_eq!(
            cmd.args,
            vec!["scrape", "--disease", "lung cancer", "--max-results", "25", "--output", "out/run.jsonl", "--no-headless"]
        );
        assert_eq!(cmd.timeout, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_failed_run_yields_no_records() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let run = run_browser_pipeline(Path::new("false"), "asthma", 5, dir.path(), Some(Duration::from_secs(5))).await?;
        assert!(!run.outcome.success());
        assert!(run.records.is_empty());
        Ok(())
    }
}
