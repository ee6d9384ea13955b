use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Python interpreter not found on PATH (tried: {})", .candidates.join(", "))]
    InterpreterNotFound { candidates: Vec<String> },

    #[error("Failed to create virtual environment at {path}: {reason}")]
    VenvCreation { path: PathBuf, reason: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{step}' failed with exit status {status}")]
    CommandFailed { step: String, status: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Operation aborted by operator: {message}")]
    Aborted { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Environment,
    Process,
    Io,
    Configuration,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LauncherError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InterpreterNotFound { .. } | Self::VenvCreation { .. } => {
                ErrorCategory::Environment
            }
            Self::Spawn { .. } | Self::CommandFailed { .. } => ErrorCategory::Process,
            Self::IoError(_) | Self::WalkError(_) | Self::SerializationError(_) => {
                ErrorCategory::Io
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::PatternError(_) => ErrorCategory::Configuration,
            Self::Aborted { .. } => ErrorCategory::Operator,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Aborted { .. } => ErrorSeverity::Low,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::PatternError(_) => ErrorSeverity::Medium,
            Self::InterpreterNotFound { .. }
            | Self::VenvCreation { .. }
            | Self::Spawn { .. }
            | Self::CommandFailed { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::WalkError(_) | Self::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Process exit status for this error. Never 0, and a missing interpreter is always 1.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InterpreterNotFound { .. } => {
                "Install Python 3 and make sure it is on PATH, or list its full path under [launcher].interpreters".to_string()
            }
            Self::VenvCreation { path, .. } => format!(
                "Delete '{}' and retry, or check that the 'venv' module is available for this interpreter",
                path.display()
            ),
            Self::Spawn { program, .. } => {
                format!("Check that '{}' exists and is executable", program)
            }
            Self::CommandFailed { step, .. } => {
                format!("Run the '{}' step by hand to see the full output", step)
            }
            Self::IoError(_) | Self::WalkError(_) => {
                "Check file permissions and free disk space".to_string()
            }
            Self::SerializationError(_) => "Retry without --json".to_string(),
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the launcher configuration file and retry".to_string()
            }
            Self::PatternError(_) => "Fix the glob pattern in the allow-list".to_string(),
            Self::Aborted { .. } => "Re-run and confirm, or pass --yes".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InterpreterNotFound { .. } => {
                "ERROR: Python is not installed or not on PATH".to_string()
            }
            Self::Aborted { .. } => "Cancelled, nothing was changed".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
