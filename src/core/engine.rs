use crate::config::toml_config::LauncherConfig;
use crate::core::bootstrap::Bootstrapper;
use crate::core::config_check::check_config_files;
use crate::core::launcher::{launch, launch_command};
use crate::domain::model::{BootstrapReport, LaunchOutcome};
use crate::domain::ports::{Operator, ProcessRunner};
use crate::utils::error::Result;
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub bootstrap: BootstrapReport,
    pub launch: LaunchOutcome,
}

pub struct LauncherEngine<R: ProcessRunner, O: Operator> {
    runner: R,
    operator: O,
    config: LauncherConfig,
    project_dir: PathBuf,
    search_path: Option<OsString>,
    extra_args: Vec<String>,
}

impl<R: ProcessRunner, O: Operator> LauncherEngine<R, O> {
    pub fn new(runner: R, operator: O, config: LauncherConfig, project_dir: PathBuf) -> Self {
        Self {
            runner,
            operator,
            config,
            project_dir,
            search_path: std::env::var_os("PATH"),
            extra_args: Vec::new(),
        }
    }

    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Everything up to, but not including, the launch.
    pub async fn check(&self) -> Result<BootstrapReport> {
        tracing::info!("Preparing MailBot in {}", self.project_dir.display());

        let prepared = Bootstrapper::new(&self.runner, &self.config, &self.project_dir)
            .with_search_path(self.search_path.clone())
            .prepare()
            .await?;

        let config_dir = self.project_dir.join(&self.config.config_files.dir);
        let config_checks = check_config_files(
            &config_dir,
            &self.config.config_files.files,
            &self.operator,
            self.config.config_files.pause_on_missing,
        )?;

        let mut warnings = prepared.warnings;
        warnings.extend(
            config_checks
                .iter()
                .filter(|check| !check.present)
                .map(|check| format!("Configuration file {} not found", check.path.display())),
        );

        Ok(BootstrapReport {
            project_dir: self.project_dir.clone(),
            interpreter: prepared.interpreter,
            resolved_interpreter: prepared.resolved_interpreter,
            venv_created: prepared.venv_created,
            install: prepared.install,
            config_checks,
            warnings,
        })
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let bootstrap = self.check().await?;

        let launcher = &self.config.launcher;
        if launcher.entry_module.is_none() {
            let script = self.project_dir.join(&launcher.entry_script);
            if !script.is_file() {
                tracing::warn!("Entry script {} not found", script.display());
            }
        }

        let command = launch_command(
            &bootstrap.resolved_interpreter,
            &self.project_dir,
            launcher,
            &self.extra_args,
        );
        let log_path = self.project_dir.join(&launcher.log_file);
        let launch = launch(&self.runner, &command, &log_path, launcher.session_header).await?;

        Ok(RunSummary { bootstrap, launch })
    }
}
