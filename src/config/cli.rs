use crate::config::toml_config::{LauncherConfig, PublishSection};
use crate::utils::logger::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Launcher configuration file (TOML). Defaults to ./mailbot-launcher.toml if present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing the bot. Overrides the configuration file
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Parser)]
#[command(name = "mailbot-launcher")]
#[command(about = "Prepare the MailBot Python environment and start the bot")]
pub struct LauncherCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<LauncherCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum LauncherCommand {
    /// Bootstrap the environment and launch the bot (the default)
    Run(RunArgs),
    /// Audit the bot's project tree for empty, unexpected or banned content
    Audit(AuditArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Warn about missing configuration files without waiting for Enter
    #[arg(long)]
    pub no_pause: bool,

    /// Stop after the environment and configuration checks
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with the bot's own exit code
    #[arg(long)]
    pub propagate_exit_code: bool,

    /// Extra arguments passed to the bot after `--`
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl RunArgs {
    pub fn apply_to(&self, config: &mut LauncherConfig) {
        if self.no_pause {
            config.config_files.pause_on_missing = false;
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct AuditArgs {
    /// Directory to audit. Defaults to [audit].root, then the project directory
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
#[command(name = "mailbot-publish")]
#[command(about = "Delete everything outside the allow-list, then commit and push")]
pub struct PublishCli {
    /// Repository directory to reset
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Launcher configuration file (TOML) holding the [publish] section
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Do not ask before deleting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would be deleted and committed, change nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Commit message. `{timestamp}` is replaced with the current UTC time
    #[arg(short, long)]
    pub message: Option<String>,

    #[arg(long)]
    pub remote: Option<String>,

    /// Branch to push. Needs a remote from --remote or [publish].remote
    #[arg(long)]
    pub branch: Option<String>,

    /// Extra allow-list patterns
    #[arg(long = "keep", value_delimiter = ',')]
    pub keep: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl PublishCli {
    pub fn apply_to(&self, section: &mut PublishSection) {
        if let Some(message) = &self.message {
            section.commit_message = message.clone();
        }
        if let Some(remote) = &self.remote {
            section.remote = Some(remote.clone());
        }
        if let Some(branch) = &self.branch {
            section.branch = Some(branch.clone());
        }
        section.keep.extend(self.keep.iter().cloned());
    }
}
