//! Process execution.
//!
//! [`SystemExecutor`] spawns real OS processes with `tokio::process::Command`.
//! A process that outlives its budget is killed (the child handle is created
//! with `kill_on_drop`) and whatever it printed is discarded.
//!
//! Captured output is bounded per stream. Bytes past the limit are read and
//! dropped so the child never blocks on a full pipe.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::RunnerError;

/// Bytes kept from each of stdout and stderr unless a spec says otherwise.
pub const DEFAULT_OUTPUT_LIMIT: usize = 4 * 1024 * 1024;

/// One external command: program, argument vector, working directory and budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
    /// Maximum bytes captured per output stream.
    pub output_limit: usize,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout: None,
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn output_limit(mut self, bytes: usize) -> Self {
        self.output_limit = bytes;
        self
    }

    /// Shell-quoted rendering for logs only. Nothing ever executes this string.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| shell_escape::escape(s.as_str().into()).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// True when either stream was cut at the spec's output limit.
    pub truncated: bool,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs commands. Production code uses [`SystemExecutor`]; tests provide a
/// scripted implementation that never touches the OS.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, RunnerError>;
}

/// Executor backed by real OS processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

#[async_trait]
impl ProcessExecutor for SystemExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, RunnerError> {
        let invocation_error = |source| RunnerError::ToolInvocation {
            program: spec.program.clone(),
            source,
        };

        tracing::debug!(
            command = %spec.display(),
            dir = %spec.working_dir.display(),
            "spawning process"
        );
        let started = Instant::now();

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(invocation_error)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = spec.output_limit;
        let collect = async {
            let (status, out, err) = tokio::join!(
                child.wait(),
                read_capped(stdout, limit),
                read_capped(stderr, limit)
            );
            Ok::<_, std::io::Error>((status?, out?, err?))
        };

        // Dropping the collect future releases the child, which kills it.
        let waited = match spec.timeout {
            Some(limit) => match timeout(limit, collect).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        program = %spec.program,
                        timeout_secs = limit.as_secs_f64(),
                        "process timed out and was killed"
                    );
                    return Err(RunnerError::ProcessTimeout {
                        program: spec.program.clone(),
                        timeout: limit,
                    });
                }
            },
            None => collect.await,
        };
        let (status, (stdout, out_cut), (stderr, err_cut)) = waited.map_err(invocation_error)?;

        let truncated = out_cut || err_cut;
        if truncated {
            tracing::warn!(
                program = %spec.program,
                limit_bytes = spec.output_limit,
                "process output truncated"
            );
        }
        tracing::debug!(
            program = %spec.program,
            exit_code = ?status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "process finished"
        );

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            truncated,
        })
    }
}

/// Reads `pipe` to EOF, keeping at most `limit` bytes. Returns the kept bytes
/// and whether anything was dropped.
async fn read_capped<R>(pipe: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok((Vec::new(), false));
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok((kept, truncated))
}
