use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn launcher() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_mailbot-launcher"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn test_missing_interpreter_exits_with_status_one() {
    let project = TempDir::new().unwrap();
    let empty_path = TempDir::new().unwrap();
    fs::write(project.path().join("requirements.txt"), "requests\n").unwrap();

    let output = launcher()
        .args(["run", "--no-pause"])
        .current_dir(project.path())
        .env("PATH", empty_path.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Python is not installed or not on PATH"));
    assert!(!project.path().join("venv").exists());
    assert!(!project.path().join("logs").exists());
}

#[test]
fn test_invalid_launcher_config_exits_with_status_two() {
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join("mailbot-launcher.toml"),
        "[launcher]\ninterpreters = []\n",
    )
    .unwrap();

    let output = launcher()
        .arg("run")
        .current_dir(project.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_audit_exit_status_follows_findings() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("start.py"), "\"\"\"Entry.\"\"\"\n").unwrap();

    let clean = launcher()
        .args(["audit", "--root"])
        .arg(project.path())
        .output()
        .unwrap();
    assert_eq!(clean.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&clean.stdout).contains("RESULT: clean"));

    fs::write(project.path().join("requirements.txt"), "torch==2.1\n").unwrap();
    let dirty = launcher()
        .args(["audit", "--json", "--root"])
        .arg(project.path())
        .output()
        .unwrap();
    assert_eq!(dirty.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&dirty.stdout).unwrap();
    assert_eq!(report["forbidden_dependencies"][0], "torch");
    assert_eq!(report["unused_modules"][0], "start.py");
}

#[test]
fn test_publish_failure_logs_a_suggestion() {
    let not_a_repo = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mailbot-publish"))
        .env_remove("RUST_LOG")
        .arg("--dir")
        .arg(not_a_repo.path())
        .current_dir(not_a_repo.path())
        .output()
        .unwrap();

    assert_ne!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Suggestion:"), "stderr was: {}", stderr);
}

#[cfg(unix)]
fn shell_bot_project() -> TempDir {
    let project = TempDir::new().unwrap();
    let root = project.path();
    fs::write(
        root.join("mailbot-launcher.toml"),
        r#"
[launcher]
interpreters = ["/bin/sh"]
use_venv = false
entry_script = "bot.sh"
session_header = false
"#,
    )
    .unwrap();
    fs::write(root.join("bot.sh"), "echo started\nexit 4\n").unwrap();
    fs::create_dir(root.join("config")).unwrap();
    for name in ["config.ini", "accounts.ini", "keys.ini"] {
        fs::write(root.join("config").join(name), "").unwrap();
    }
    project
}

#[cfg(unix)]
#[test]
fn test_bot_exit_status_is_not_propagated_by_default() {
    let project = shell_bot_project();

    let output = launcher()
        .args(["run", "--no-pause"])
        .current_dir(project.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let log = fs::read_to_string(project.path().join("logs").join("mailbot.log")).unwrap();
    assert_eq!(log, "started\n");
}

#[cfg(unix)]
#[test]
fn test_propagate_exit_code_returns_bot_status() {
    let project = shell_bot_project();

    let output = launcher()
        .args(["run", "--no-pause", "--propagate-exit-code"])
        .current_dir(project.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
}

#[cfg(unix)]
#[test]
fn test_dry_run_checks_without_launching() {
    let project = shell_bot_project();

    let output = launcher()
        .args(["run", "--dry-run", "--propagate-exit-code"])
        .current_dir(project.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Interpreter: /bin/sh"));
    assert!(stdout.contains("No manifest at"));
    assert!(!project.path().join("logs").exists());
}
