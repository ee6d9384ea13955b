use crate::domain::ports::Operator;
use crate::utils::error::Result;
use std::io::{self, BufRead, Write};

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOperator;

impl ConsoleOperator {
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl Operator for ConsoleOperator {
    fn pause(&self, message: &str) -> Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", message)?;
        write!(stderr, "Press Enter to continue...")?;
        stderr.flush()?;
        drop(stderr);

        // EOF on stdin means nobody is there to acknowledge; carry on.
        if Self::read_line()?.is_none() {
            tracing::debug!("stdin closed, continuing without acknowledgment");
        }
        Ok(())
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{} [y/N]: ", prompt)?;
        stderr.flush()?;
        drop(stderr);

        Ok(Self::read_line()?.is_some_and(|answer| is_yes(&answer)))
    }
}

/// Non-interactive operator for `--no-pause` / `--yes` runs.
#[derive(Debug, Clone, Default)]
pub struct AutoOperator {
    assume_yes: bool,
}

impl AutoOperator {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Operator for AutoOperator {
    fn pause(&self, message: &str) -> Result<()> {
        tracing::info!("{} (not pausing)", message);
        Ok(())
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        tracing::info!("{} -> {}", prompt, if self.assume_yes { "yes" } else { "no" });
        Ok(self.assume_yes)
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
