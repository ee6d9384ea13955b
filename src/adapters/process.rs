use crate::domain::model::{CapturedOutput, CommandSpec, ExitOutcome};
use crate::domain::ports::ProcessRunner;
use crate::utils::error::{LauncherError, Result};
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Runs commands as real child processes on the tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).current_dir(&spec.cwd);
        command
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> LauncherError {
        LauncherError::Spawn {
            program: spec.program.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExitOutcome> {
        tracing::debug!("Running: {}", spec.display_line());
        let status = Self::command(spec)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;
        Ok(status.into())
    }

    async fn run_logged(&self, spec: &CommandSpec, log_path: &Path) -> Result<ExitOutcome> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stdout_log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        let stderr_log = stdout_log.try_clone()?;

        tracing::debug!(
            "Running: {} (output -> {})",
            spec.display_line(),
            log_path.display()
        );
        let status = Self::command(spec)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_log))
            .stderr(Stdio::from(stderr_log))
            .status()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;
        Ok(status.into())
    }

    async fn capture(&self, spec: &CommandSpec) -> Result<CapturedOutput> {
        tracing::debug!("Capturing: {}", spec.display_line());
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;
        Ok(CapturedOutput {
            outcome: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
