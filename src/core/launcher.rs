use crate::config::toml_config::LauncherSection;
use crate::domain::model::{CommandSpec, LaunchOutcome};
use crate::domain::ports::ProcessRunner;
use crate::utils::error::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// `<interpreter> <entry_script|-m entry_module> [args...] [extra...]`, run from the project dir.
pub fn launch_command(
    interpreter: &Path,
    project_dir: &Path,
    section: &LauncherSection,
    extra_args: &[String],
) -> CommandSpec {
    let command = CommandSpec::new(interpreter, project_dir);
    let command = match &section.entry_module {
        Some(module) => command.arg("-m").arg(module),
        None => command.arg(section.entry_script.as_os_str()),
    };
    command
        .args(section.args.iter().map(String::as_str))
        .args(extra_args.iter().map(String::as_str))
}

pub fn write_session_header(log_path: &Path, command: &CommandSpec) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut log = OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(
        log,
        "===== {} launching: {} =====",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        command.display_line()
    )?;
    Ok(())
}

/// Blocking foreground run. Output is appended to `log_path`; a failing
/// program is reported through the outcome, not as an error.
pub async fn launch<R: ProcessRunner + ?Sized>(
    runner: &R,
    command: &CommandSpec,
    log_path: &Path,
    session_header: bool,
) -> Result<LaunchOutcome> {
    if session_header {
        write_session_header(log_path, command)?;
    }

    tracing::info!("Starting {} (log: {})", command.display_line(), log_path.display());
    let exit = runner.run_logged(command, log_path).await?;

    if exit.success {
        tracing::info!("Program finished");
    } else {
        tracing::warn!(
            "Program exited with status {}, see {}",
            exit,
            log_path.display()
        );
    }

    Ok(LaunchOutcome {
        log_path: log_path.to_path_buf(),
        exit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CapturedOutput, ExitOutcome};
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn test_launch_command_with_script() {
        let mut section = LauncherSection::default();
        section.args = vec!["--once".to_string()];

        let command = launch_command(
            Path::new("/bot/venv/bin/python"),
            Path::new("/bot"),
            &section,
            &["--verbose".to_string()],
        );

        assert_eq!(command.program, PathBuf::from("/bot/venv/bin/python"));
        assert_eq!(command.cwd, PathBuf::from("/bot"));
        assert_eq!(
            command.args,
            vec![
                OsString::from("start.py"),
                OsString::from("--once"),
                OsString::from("--verbose"),
            ]
        );
    }

    #[test]
    fn test_launch_command_with_module() {
        let mut section = LauncherSection::default();
        section.entry_module = Some("mailbot_v26.start".to_string());

        let command = launch_command(Path::new("python"), Path::new("."), &section, &[]);
        assert_eq!(command.display_line(), "python -m mailbot_v26.start");
    }

    struct ExitWith(i32);

    #[async_trait::async_trait]
    impl ProcessRunner for ExitWith {
        async fn run(&self, _command: &CommandSpec) -> Result<ExitOutcome> {
            Ok(ExitOutcome::from_code(self.0))
        }

        async fn run_logged(&self, _command: &CommandSpec, _log: &Path) -> Result<ExitOutcome> {
            Ok(ExitOutcome::from_code(self.0))
        }

        async fn capture(&self, _command: &CommandSpec) -> Result<CapturedOutput> {
            unreachable!("launch never captures")
        }
    }

    #[test]
    fn test_launch_reports_exit_without_failing() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("bot.log");
        let command = CommandSpec::new("python", dir.path()).arg("start.py");

        let outcome = tokio_test::block_on(launch(&ExitWith(5), &command, &log, true)).unwrap();

        assert_eq!(outcome.exit, ExitOutcome::from_code(5));
        assert_eq!(outcome.log_path, log);
        assert!(fs::read_to_string(&log).unwrap().contains("launching: python start.py"));
    }

    #[test]
    fn test_session_header_appends() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("logs").join("mailbot.log");
        let command = CommandSpec::new("python", dir.path()).arg("start.py");

        write_session_header(&log, &command).unwrap();
        write_session_header(&log, &command).unwrap();

        let content = fs::read_to_string(&log).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().all(|l| l.contains("launching: python start.py")));
    }
}
