use crate::config::toml_config::PublishSection;
use crate::domain::model::{CommandSpec, PublishReport, ResetPlan};
use crate::domain::ports::{Operator, ProcessRunner};
use crate::utils::error::{LauncherError, Result};
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Never deleted, whatever the allow-list says.
pub const ALWAYS_KEEP: &str = ".git";

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub assume_yes: bool,
    pub dry_run: bool,
}

/// Partitions the top-level entries of `root` by glob match on the entry name.
pub fn plan_reset(root: &Path, keep: &[String]) -> Result<ResetPlan> {
    let patterns = keep
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut entries = fs::read_dir(root)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    entries.sort();

    let mut plan = ResetPlan {
        root: root.to_path_buf(),
        keep: Vec::new(),
        remove: Vec::new(),
    };
    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == ALWAYS_KEEP || patterns.iter().any(|p| p.matches(&name)) {
            plan.keep.push(path);
        } else {
            plan.remove.push(path);
        }
    }
    Ok(plan)
}

/// Deletes everything in `plan.remove`. Entries that are already gone are skipped.
pub fn apply_reset(plan: &ResetPlan) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::with_capacity(plan.remove.len());
    for path in &plan.remove {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => {
                tracing::debug!("Removed {}", path.display());
                removed.push(path.clone());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removed)
}

pub fn render_commit_message(template: &str, now: DateTime<Utc>) -> String {
    template.replace("{timestamp}", &now.format("%Y-%m-%d %H:%M:%S").to_string())
}

async fn git<R: ProcessRunner + ?Sized>(
    runner: &R,
    root: &Path,
    step: &str,
    args: &[&str],
) -> Result<()> {
    let command = CommandSpec::new("git", root).args(args.iter().copied());
    let outcome = runner.run(&command).await?;
    if !outcome.success {
        return Err(LauncherError::CommandFailed {
            step: step.to_string(),
            status: outcome.to_string(),
        });
    }
    Ok(())
}

/// Reset `root` to the allow-list, then `git add -A`, commit and push.
pub async fn publish<R, O>(
    runner: &R,
    operator: &O,
    root: &Path,
    section: &PublishSection,
    options: &PublishOptions,
) -> Result<PublishReport>
where
    R: ProcessRunner + ?Sized,
    O: Operator + ?Sized,
{
    let probe = CommandSpec::new("git", root).args(["rev-parse", "--is-inside-work-tree"]);
    let inside = runner.capture(&probe).await?;
    if !inside.outcome.success || inside.stdout.trim() != "true" {
        return Err(LauncherError::config(format!(
            "{} is not inside a git work tree",
            root.display()
        )));
    }

    let plan = plan_reset(root, &section.keep)?;
    tracing::info!(
        "Reset plan for {}: keep {}, remove {}",
        root.display(),
        plan.keep.len(),
        plan.remove.len()
    );
    for path in &plan.remove {
        tracing::info!("  remove {}", path.display());
    }

    let commit_message = render_commit_message(&section.commit_message, Utc::now());

    if options.dry_run {
        return Ok(PublishReport {
            removed: plan.remove,
            kept: plan.keep,
            committed: false,
            commit_message: Some(commit_message),
            pushed: false,
        });
    }

    if !plan.remove.is_empty() && section.confirm && !options.assume_yes {
        let prompt = format!(
            "Permanently delete {} entries from {}?",
            plan.remove.len(),
            root.display()
        );
        if !operator.confirm(&prompt)? {
            return Err(LauncherError::Aborted {
                message: "deletion not confirmed".to_string(),
            });
        }
    }

    let removed = apply_reset(&plan)?;
    tracing::info!("Removed {} entries", removed.len());

    git(runner, root, "git add", &["add", "-A"]).await?;

    let status = runner
        .capture(&CommandSpec::new("git", root).args(["status", "--porcelain"]))
        .await?;
    if !status.outcome.success {
        return Err(LauncherError::CommandFailed {
            step: "git status".to_string(),
            status: status.outcome.to_string(),
        });
    }

    let committed = if status.stdout.trim().is_empty() {
        tracing::info!("Nothing to commit");
        false
    } else {
        git(runner, root, "git commit", &["commit", "-m", commit_message.as_str()]).await?;
        true
    };

    let mut push_args = vec!["push"];
    if let Some(remote) = &section.remote {
        push_args.push(remote.as_str());
        if let Some(branch) = &section.branch {
            push_args.push(branch.as_str());
        }
    }
    git(runner, root, "git push", &push_args).await?;

    Ok(PublishReport {
        removed,
        kept: plan.keep,
        committed,
        commit_message: committed.then_some(commit_message),
        pushed: true,
    })
}
