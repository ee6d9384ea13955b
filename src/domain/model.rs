use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// One external command: program, arguments, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitOutcome {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ExitOutcome {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub outcome: ExitOutcome,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigCheck {
    pub name: String,
    pub path: PathBuf,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed { manifest: PathBuf },
    ManifestMissing { manifest: PathBuf },
    Failed { manifest: PathBuf, exit: ExitOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub project_dir: PathBuf,
    /// Interpreter found on the search path.
    pub interpreter: PathBuf,
    /// Interpreter the program runs under (the venv's when enabled).
    pub resolved_interpreter: PathBuf,
    pub venv_created: bool,
    pub install: InstallOutcome,
    pub config_checks: Vec<ConfigCheck>,
    pub warnings: Vec<String>,
}

impl BootstrapReport {
    pub fn missing_config_files(&self) -> impl Iterator<Item = &ConfigCheck> {
        self.config_checks.iter().filter(|check| !check.present)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchOutcome {
    pub log_path: PathBuf,
    pub exit: ExitOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPlan {
    pub root: PathBuf,
    pub keep: Vec<PathBuf>,
    pub remove: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub removed: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
    pub committed: bool,
    pub commit_message: Option<String>,
    pub pushed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub line_count: usize,
    pub description: String,
    pub is_empty: bool,
    pub unexpected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenUsage {
    pub path: PathBuf,
    pub needle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub root: PathBuf,
    pub files: Vec<FileInfo>,
    pub empty_files: Vec<PathBuf>,
    pub unexpected_files: Vec<PathBuf>,
    pub forbidden_dependencies: Vec<String>,
    pub forbidden_usages: Vec<ForbiddenUsage>,
    /// Python modules nothing imports. Listed for review, not counted as findings.
    #[serde(default)]
    pub unused_modules: Vec<PathBuf>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.empty_files.is_empty()
            && self.unexpected_files.is_empty()
            && self.forbidden_dependencies.is_empty()
            && self.forbidden_usages.is_empty()
    }
}
