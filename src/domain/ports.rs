use crate::domain::model::{CapturedOutput, CommandSpec, ExitOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Runs external programs. The only seam between the launcher and the OS
/// process table, so tests can record commands instead of running them.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run with inherited stdio and wait for exit.
    async fn run(&self, command: &CommandSpec) -> Result<ExitOutcome>;

    /// Run with stdout and stderr appended to `log_path`.
    async fn run_logged(&self, command: &CommandSpec, log_path: &Path) -> Result<ExitOutcome>;

    /// Run and capture both streams.
    async fn capture(&self, command: &CommandSpec) -> Result<CapturedOutput>;
}

/// The person at the console.
pub trait Operator: Send + Sync {
    /// Block until the operator acknowledges `message`.
    fn pause(&self, message: &str) -> Result<()>;

    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

#[async_trait]
impl<'a, T: ProcessRunner + ?Sized> ProcessRunner for &'a T {
    async fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        (**self).run(command).await
    }

    async fn run_logged(&self, command: &CommandSpec, log_path: &Path) -> Result<ExitOutcome> {
        (**self).run_logged(command, log_path).await
    }

    async fn capture(&self, command: &CommandSpec) -> Result<CapturedOutput> {
        (**self).capture(command).await
    }
}

impl<'a, T: Operator + ?Sized> Operator for &'a T {
    fn pause(&self, message: &str) -> Result<()> {
        (**self).pause(message)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        (**self).confirm(prompt)
    }
}
