use crate::config::toml_config::LauncherConfig;
use crate::domain::model::{CommandSpec, InstallOutcome};
use crate::domain::ports::ProcessRunner;
use crate::utils::error::{LauncherError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// What the bootstrap steps produced, before the config files are looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEnvironment {
    pub interpreter: PathBuf,
    pub resolved_interpreter: PathBuf,
    pub venv_created: bool,
    pub install: InstallOutcome,
    pub warnings: Vec<String>,
}

/// Interpreter inside a virtualenv directory.
pub fn venv_python(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("python.exe")
    } else {
        venv_dir.join("bin").join("python")
    }
}

/// First candidate found. Names are looked up in each `search_path` entry;
/// candidates containing a separator are taken as paths relative to `base`.
pub fn find_interpreter(
    candidates: &[String],
    search_path: Option<&OsStr>,
    base: &Path,
) -> Option<PathBuf> {
    for candidate in candidates {
        let as_path = Path::new(candidate);
        if as_path.components().count() > 1 || as_path.is_absolute() {
            let full = base.join(as_path);
            if is_executable(&full) {
                return Some(full);
            }
            continue;
        }

        let Some(search_path) = search_path else {
            continue;
        };
        for dir in std::env::split_paths(search_path) {
            for name in executable_names(candidate) {
                let full = dir.join(&name);
                if is_executable(&full) {
                    return Some(full);
                }
            }
        }
    }
    None
}

#[cfg(windows)]
fn executable_names(name: &str) -> Vec<OsString> {
    if Path::new(name).extension().is_some() {
        return vec![OsString::from(name)];
    }
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut names: Vec<OsString> = pathext
        .split(';')
        .filter(|ext| !ext.is_empty())
        .map(|ext| OsString::from(format!("{}{}", name, ext.to_lowercase())))
        .collect();
    names.push(OsString::from(name));
    names
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> Vec<OsString> {
    vec![OsString::from(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub struct Bootstrapper<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    config: &'a LauncherConfig,
    project_dir: &'a Path,
    search_path: Option<OsString>,
}

impl<'a, R: ProcessRunner + ?Sized> Bootstrapper<'a, R> {
    pub fn new(runner: &'a R, config: &'a LauncherConfig, project_dir: &'a Path) -> Self {
        Self {
            runner,
            config,
            project_dir,
            search_path: std::env::var_os("PATH"),
        }
    }

    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn locate_interpreter(&self) -> Result<PathBuf> {
        let candidates = &self.config.launcher.interpreters;
        match find_interpreter(candidates, self.search_path.as_deref(), self.project_dir) {
            Some(path) => {
                tracing::info!("Using interpreter {}", path.display());
                Ok(path)
            }
            None => Err(LauncherError::InterpreterNotFound {
                candidates: candidates.clone(),
            }),
        }
    }

    /// Reuses the venv when its interpreter exists, otherwise creates it.
    pub async fn ensure_venv(&self, interpreter: &Path) -> Result<(PathBuf, bool)> {
        let venv_dir = self.project_dir.join(&self.config.launcher.venv_dir);
        let python = venv_python(&venv_dir);
        if python.is_file() {
            tracing::info!("Reusing virtual environment {}", venv_dir.display());
            return Ok((python, false));
        }

        tracing::info!("Creating virtual environment {}", venv_dir.display());
        let command = CommandSpec::new(interpreter, self.project_dir)
            .args(["-m", "venv"])
            .arg(venv_dir.as_os_str());
        let outcome = self.runner.run(&command).await?;
        if !outcome.success {
            return Err(LauncherError::VenvCreation {
                path: venv_dir,
                reason: format!("'python -m venv' exited with status {}", outcome),
            });
        }
        if !python.is_file() {
            return Err(LauncherError::VenvCreation {
                reason: format!("{} is missing after creation", python.display()),
                path: venv_dir,
            });
        }
        Ok((python, true))
    }

    pub async fn install_dependencies(
        &self,
        resolved: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<InstallOutcome> {
        let manifest = self.project_dir.join(&self.config.launcher.manifest);
        if !manifest.is_file() {
            let warning = format!(
                "Dependency manifest {} not found, skipping install",
                manifest.display()
            );
            tracing::warn!("{}", warning);
            warnings.push(warning);
            return Ok(InstallOutcome::ManifestMissing { manifest });
        }

        tracing::info!("Installing dependencies from {}", manifest.display());
        let command = CommandSpec::new(resolved, self.project_dir)
            .args(["-m", "pip", "install", "-r"])
            .arg(manifest.as_os_str());
        let exit = self.runner.run(&command).await?;
        if !exit.success {
            let warning = format!("Dependency install exited with status {}, continuing", exit);
            tracing::warn!("{}", warning);
            warnings.push(warning);
            return Ok(InstallOutcome::Failed { manifest, exit });
        }
        Ok(InstallOutcome::Installed { manifest })
    }

    pub async fn prepare(&self) -> Result<PreparedEnvironment> {
        // Must run first: a missing interpreter aborts before anything is touched.
        let interpreter = self.locate_interpreter()?;

        let (resolved_interpreter, venv_created) = if self.config.launcher.use_venv {
            self.ensure_venv(&interpreter).await?
        } else {
            (interpreter.clone(), false)
        };

        let mut warnings = Vec::new();
        let install = self
            .install_dependencies(&resolved_interpreter, &mut warnings)
            .await?;

        Ok(PreparedEnvironment {
            interpreter,
            resolved_interpreter,
            venv_created,
            install,
            warnings,
        })
    }
}
