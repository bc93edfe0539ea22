//! Engine subprocess execution.

use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, warn};

use super::command::EngineCommand;
use super::error::ConverterError;
use super::instance::EngineInstance;

/// Exit status and captured streams of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Whether the engine exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turns a non-zero exit into [`ConverterError::EngineConversionFailed`].
    pub fn into_result(self) -> Result<Self, ConverterError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ConverterError::EngineConversionFailed {
                exit_code: self.exit_code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs engine commands and tears down their working context.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Creates a runner that kills the engine after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `command` to completion and then releases `instance`.
    ///
    /// The instance is released on every path: success, non-zero exit, spawn
    /// failure and timeout. A non-zero exit is not an error here; callers inspect
    /// [`ProcessOutput::exit_code`] or use [`ProcessOutput::into_result`].
    pub async fn run(
        &self,
        command: &EngineCommand,
        instance: EngineInstance,
    ) -> Result<ProcessOutput, ConverterError> {
        let result = self.execute(command).await;
        instance.release().await;
        result
    }

    async fn execute(&self, command: &EngineCommand) -> Result<ProcessOutput, ConverterError> {
        let start = Instant::now();
        debug!("Running engine: {}", command.to_shell_string());

        let mut child = command
            .to_command()
            .spawn()
            .map_err(|e| ConverterError::EngineSpawnFailed {
                path: command.program().to_path_buf(),
                reason: e.to_string(),
            })?;

        // Nothing to feed; closing stdin tells the engine no input follows.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(b"").await {
                warn!("Failed to write engine stdin: {}", e);
            }
        }

        let pid = child.id();

        // wait_with_output drains stdout and stderr concurrently. On timeout the
        // child is dropped with the future and killed; its process group goes too.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!("Failed waiting for engine {}: {}", command.program().display(), e);
                return Err(ConverterError::Io(e));
            }
            Err(_) => {
                error!(
                    "Engine timed out after {}s: {}",
                    self.timeout.as_secs(),
                    command.program().display()
                );
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                return Err(ConverterError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            "Engine exited with {:?} after {}ms",
            result.exit_code, result.duration_ms
        );
        Ok(result)
    }
}

/// Sends SIGKILL to every process in the group led by `pid`.
#[cfg(unix)]
async fn kill_process_group(pid: u32) {
    let result = tokio::process::Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", pid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match result {
        Ok(status) if status.success() => debug!("Killed engine process group {}", pid),
        Ok(status) => debug!("Engine process group {} already gone ({})", pid, status),
        Err(e) => warn!("Failed to kill engine process group {}: {}", pid, e),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: u32) {}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
