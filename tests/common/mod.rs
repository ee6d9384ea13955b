#![allow(dead_code)]

use async_trait::async_trait;
use mailbot_launcher::core::bootstrap::venv_python;
use mailbot_launcher::domain::model::{CapturedOutput, CommandSpec, ExitOutcome};
use mailbot_launcher::domain::ports::{Operator, ProcessRunner};
use mailbot_launcher::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Records every command instead of running it. Exit codes and captured
/// stdout are scripted by substring match on the command line.
#[derive(Default)]
pub struct FakeRunner {
    pub commands: Mutex<Vec<CommandSpec>>,
    pub logged: Mutex<Vec<(CommandSpec, PathBuf)>>,
    exit_rules: Mutex<Vec<(String, i32)>>,
    stdout_rules: Mutex<Vec<(String, String)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `git rev-parse --is-inside-work-tree` with `true`.
    pub fn git_repo() -> Self {
        let runner = Self::default();
        runner.stdout_when("rev-parse", "true\n");
        runner
    }

    pub fn fail_when(&self, needle: &str, code: i32) -> &Self {
        self.exit_rules
            .lock()
            .unwrap()
            .push((needle.to_string(), code));
        self
    }

    pub fn stdout_when(&self, needle: &str, stdout: &str) -> &Self {
        self.stdout_rules
            .lock()
            .unwrap()
            .push((needle.to_string(), stdout.to_string()));
        self
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(CommandSpec::display_line)
            .collect()
    }

    pub fn launches(&self) -> Vec<(CommandSpec, PathBuf)> {
        self.logged.lock().unwrap().clone()
    }

    fn exit_for(&self, command: &CommandSpec) -> ExitOutcome {
        let line = command.display_line();
        let code = self
            .exit_rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        ExitOutcome::from_code(code)
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        self.commands.lock().unwrap().push(command.clone());
        let outcome = self.exit_for(command);

        // Mimic `python -m venv <dir>` so the venv interpreter exists afterwards.
        let args: Vec<String> = command
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        if outcome.success && args.len() == 3 && args[0] == "-m" && args[1] == "venv" {
            make_executable(&venv_python(Path::new(&args[2])));
        }
        Ok(outcome)
    }

    async fn run_logged(&self, command: &CommandSpec, log_path: &Path) -> Result<ExitOutcome> {
        self.logged
            .lock()
            .unwrap()
            .push((command.clone(), log_path.to_path_buf()));
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut log = OpenOptions::new().create(true).append(true).open(log_path)?;
        writeln!(log, "fake run: {}", command.display_line())?;
        Ok(self.exit_for(command))
    }

    async fn capture(&self, command: &CommandSpec) -> Result<CapturedOutput> {
        self.commands.lock().unwrap().push(command.clone());
        let line = command.display_line();
        let stdout = self
            .stdout_rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CapturedOutput {
            outcome: self.exit_for(command),
            stdout,
            stderr: String::new(),
        })
    }
}

/// Records pauses and confirmation prompts; answers every prompt with `answer`.
pub struct ScriptedOperator {
    pub pauses: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
    answer: bool,
}

impl ScriptedOperator {
    pub fn answering(answer: bool) -> Self {
        Self {
            pauses: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            answer,
        }
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.lock().unwrap().len()
    }
}

impl Operator for ScriptedOperator {
    fn pause(&self, message: &str) -> Result<()> {
        self.pauses.lock().unwrap().push(message.to_string());
        Ok(())
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer)
    }
}

pub fn make_executable(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

pub fn write_config_files(project: &Path, names: &[&str]) {
    let dir = project.join("config");
    fs::create_dir_all(&dir).unwrap();
    for name in names {
        fs::write(dir.join(name), "[section]\nkey = value\n").unwrap();
    }
}
