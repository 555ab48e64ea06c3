//! Synchronous-style invocation of external tools.
//!
//! Every external program the collector relies on (`df`, `du`, `cp`,
//! `systemctl`, `systemd-analyze`) goes through [`ToolRunner`], so tests can
//! substitute scripted results.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::errors::{GhostError, GhostResult};

/// Where a tool's standard output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutSink {
    /// Collected into [`ToolOutput::stdout`]
    Capture,
    /// Written to a file, created or truncated before the tool starts
    File(PathBuf),
}

/// Program, arguments and output routing for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables, on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub stdout: StdoutSink,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdout: StdoutSink::Capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run under the C locale so the output can be parsed.
    pub fn c_locale(self) -> Self {
        self.env("LC_ALL", "C")
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = StdoutSink::File(path.into());
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a tool terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    /// Normal termination with an exit code
    Exited(i32),
    /// Killed by a signal
    Signaled(Option<i32>),
}

impl ToolExit {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ToolExit::Exited(code),
            None => ToolExit::Signaled(status.signal()),
        }
    }

    /// Terminated through `exit`, whatever the code.
    pub fn exited_normally(&self) -> bool {
        matches!(self, ToolExit::Exited(_))
    }

    pub fn success(&self) -> bool {
        matches!(self, ToolExit::Exited(0))
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit: ToolExit,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Fail with [`GhostError::Tool`] unless the tool exited with status 0.
    pub fn require_success(self, invocation: &ToolInvocation) -> GhostResult<Self> {
        if self.exit.success() {
            return Ok(self);
        }
        Err(GhostError::Tool(format!(
            "`{}` terminated with {:?}: {}",
            invocation,
            self.exit,
            self.stderr_text().trim()
        )))
    }
}

/// Runs external tools to completion.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the tool and wait for it to terminate.
    ///
    /// Returns `Err` only when the tool could not be started; a tool that
    /// starts and fails is reported through [`ToolOutput::exit`].
    async fn run(&self, invocation: &ToolInvocation) -> GhostResult<ToolOutput>;
}

/// Runs tools as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> GhostResult<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &invocation.stdout {
            StdoutSink::Capture => {
                cmd.stdout(Stdio::piped());
            }
            StdoutSink::File(path) => {
                let file = std::fs::File::create(path).map_err(|e| {
                    GhostError::storage(format!("Failed to create {}", path.display()), e)
                })?;
                cmd.stdout(Stdio::from(file));
            }
        }

        tracing::trace!(command = %invocation, "Running tool");

        let spawn_err = |e: std::io::Error| {
            let err_msg = format!("Failed to run `{}`: {}", invocation, e);
            tracing::error!("{}", err_msg);
            GhostError::Tool(err_msg)
        };

        // output() would re-pipe stdout, so a file sink waits on the child instead.
        let output = match &invocation.stdout {
            StdoutSink::Capture => cmd.output().await.map_err(spawn_err)?,
            StdoutSink::File(_) => cmd
                .spawn()
                .map_err(spawn_err)?
                .wait_with_output()
                .await
                .map_err(spawn_err)?,
        };

        let exit = ToolExit::from_status(output.status);
        tracing::debug!(command = %invocation, ?exit, "Tool finished");

        Ok(ToolOutput {
            exit,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
