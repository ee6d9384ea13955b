use crate::utils::error::{LauncherError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mailbot-launcher.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    pub launcher: LauncherSection,
    pub config_files: ConfigFilesSection,
    pub publish: PublishSection,
    pub audit: AuditSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherSection {
    /// Overrides the directory the bot lives in. Relative paths are resolved
    /// against the directory holding the launcher file.
    pub project_dir: Option<PathBuf>,
    /// Interpreter names or paths, tried in order.
    pub interpreters: Vec<String>,
    pub use_venv: bool,
    pub venv_dir: PathBuf,
    pub manifest: PathBuf,
    pub entry_script: PathBuf,
    /// Run `-m <module>` instead of `entry_script` when set.
    pub entry_module: Option<String>,
    pub args: Vec<String>,
    pub log_file: PathBuf,
    pub session_header: bool,
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            project_dir: None,
            interpreters: default_interpreters(),
            use_venv: true,
            venv_dir: PathBuf::from("venv"),
            manifest: PathBuf::from("requirements.txt"),
            entry_script: PathBuf::from("start.py"),
            entry_module: None,
            args: Vec::new(),
            log_file: PathBuf::from("logs").join("mailbot.log"),
            session_header: true,
        }
    }
}

#[cfg(windows)]
fn default_interpreters() -> Vec<String> {
    vec!["python".to_string(), "py".to_string()]
}

#[cfg(not(windows))]
fn default_interpreters() -> Vec<String> {
    vec!["python3".to_string(), "python".to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFilesSection {
    pub dir: PathBuf,
    pub files: Vec<String>,
    pub pause_on_missing: bool,
}

impl Default for ConfigFilesSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("config"),
            files: vec![
                "config.ini".to_string(),
                "accounts.ini".to_string(),
                "keys.ini".to_string(),
            ],
            pause_on_missing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSection {
    /// Glob patterns matched against top-level entry names. `.git` is always kept.
    pub keep: Vec<String>,
    /// `{timestamp}` is replaced with the current UTC time.
    pub commit_message: String,
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub confirm: bool,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            keep: vec![
                ".git".to_string(),
                ".gitignore".to_string(),
                "README.md".to_string(),
                "LICENSE".to_string(),
            ],
            commit_message: "MailBot update {timestamp}".to_string(),
            remote: None,
            branch: None,
            confirm: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    pub root: Option<PathBuf>,
    pub forbidden_dependencies: Vec<String>,
    pub forbidden_strings: Vec<String>,
    pub forbidden_imports: Vec<String>,
    pub allowed_suffixes: Vec<String>,
    pub ignored_dirs: Vec<String>,
    /// Python files excluded from the forbidden string/import scan.
    pub skip_files: Vec<String>,
}

impl Default for AuditSection {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            root: None,
            forbidden_dependencies: strings(&[
                "spacy",
                "stanza",
                "bert",
                "transformers",
                "torch",
                "tensorflow",
            ]),
            forbidden_strings: strings(&["pdftotext", "catdoc", "xlhtml"]),
            forbidden_imports: strings(&[
                r"\bimport\s+torch\b",
                r"\bfrom\s+torch\b",
                r"\bimport\s+tensorflow\b",
                r"\bimport\s+spacy\b",
                r"\bimport\s+stanza\b",
                r"\bimport\s+transformers\b",
            ]),
            allowed_suffixes: strings(&[
                "py", "txt", "ini", "md", "json", "yaml", "yml", "cfg", "conf", "lock", "req",
            ]),
            ignored_dirs: strings(&["__pycache__", ".git", ".venv", "venv", ".idea"]),
            skip_files: strings(&["audit_project.py", "consistency_audit.py"]),
        }
    }
}

impl LauncherConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            LauncherError::config(format!(
                "cannot read '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses first and substitutes `${VAR}` inside string values afterwards,
    /// so substituted text is never read as TOML syntax.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| LauncherError::config(format!("TOML parsing error: {}", e)))?;
        let mut document = toml::Value::Table(table);

        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| LauncherError::config(format!("env pattern: {}", e)))?;
        Self::substitute_env_vars(&mut document, &re);

        document
            .try_into()
            .map_err(|e| LauncherError::config(format!("TOML parsing error: {}", e)))
    }

    /// Loads the explicit file when given, else `mailbot-launcher.toml` in
    /// `cwd` if present, else built-in defaults. Returns the file actually read.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using launcher config {}", candidate.display());
            let config = Self::from_file(&candidate)?;
            return Ok((config, Some(candidate)));
        }

        tracing::debug!("No launcher config found, using defaults");
        Ok((Self::default(), None))
    }

    /// Replaces `${NAME}` in every string value. Unset variables are left as written.
    fn substitute_env_vars(value: &mut toml::Value, re: &Regex) {
        match value {
            toml::Value::String(text) => {
                if re.is_match(text) {
                    let replaced = re.replace_all(text, |caps: &regex::Captures| {
                        let var_name = &caps[1];
                        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
                    });
                    *text = replaced.into_owned();
                }
            }
            toml::Value::Array(items) => {
                for item in items {
                    Self::substitute_env_vars(item, re);
                }
            }
            toml::Value::Table(table) => {
                for (_, item) in table.iter_mut() {
                    Self::substitute_env_vars(item, re);
                }
            }
            _ => {}
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        let launcher = &self.launcher;
        validation::validate_non_empty_list("launcher.interpreters", &launcher.interpreters)?;
        validation::validate_path("launcher.venv_dir", &launcher.venv_dir.to_string_lossy())?;
        validation::validate_path("launcher.manifest", &launcher.manifest.to_string_lossy())?;
        validation::validate_path("launcher.log_file", &launcher.log_file.to_string_lossy())?;
        match &launcher.entry_module {
            Some(module) => validation::validate_non_empty_string("launcher.entry_module", module)?,
            None => validation::validate_path(
                "launcher.entry_script",
                &launcher.entry_script.to_string_lossy(),
            )?,
        }

        validation::validate_path("config_files.dir", &self.config_files.dir.to_string_lossy())?;
        validation::validate_non_empty_list("config_files.files", &self.config_files.files)?;
        validation::validate_unique("config_files.files", &self.config_files.files)?;
        for name in &self.config_files.files {
            validation::validate_file_name("config_files.files", name)?;
        }

        validation::validate_glob_patterns("publish.keep", &self.publish.keep)?;
        validation::validate_non_empty_string("publish.commit_message", &self.publish.commit_message)?;
        if self.publish.branch.is_some() && self.publish.remote.is_none() {
            return Err(LauncherError::InvalidConfigValueError {
                field: "publish.branch".to_string(),
                value: self.publish.branch.clone().unwrap_or_default(),
                reason: "A branch requires publish.remote to be set".to_string(),
            });
        }

        for pattern in &self.audit.forbidden_imports {
            if let Err(e) = Regex::new(pattern) {
                return Err(LauncherError::InvalidConfigValueError {
                    field: "audit.forbidden_imports".to_string(),
                    value: pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Directory the bot lives in. `cli` wins, then `launcher.project_dir`
    /// (relative to the config file), then the config file's directory, then `cwd`.
    pub fn resolve_project_dir(
        &self,
        cli: Option<&Path>,
        config_source: Option<&Path>,
        cwd: &Path,
    ) -> PathBuf {
        let config_dir = config_source
            .and_then(Path::parent)
            .map(|p| if p.as_os_str().is_empty() { cwd.to_path_buf() } else { cwd.join(p) });

        if let Some(dir) = cli {
            return cwd.join(dir);
        }
        if let Some(dir) = &self.launcher.project_dir {
            let base = config_dir.as_deref().unwrap_or(cwd);
            return base.join(dir);
        }
        config_dir.unwrap_or_else(|| cwd.to_path_buf())
    }
}

impl Validate for LauncherConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = LauncherConfig::from_toml_str("").unwrap();
        assert_eq!(config, LauncherConfig::default());
        assert_eq!(
            config.config_files.files,
            vec!["config.ini", "accounts.ini", "keys.ini"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml_content = r#"
[launcher]
interpreters = ["/opt/python/bin/python3"]
use_venv = false
entry_module = "mailbot_v26.start"
log_file = "bot.log"

[config_files]
dir = "mailbot_v26/config"
pause_on_missing = false

[publish]
keep = [".git", "*.md"]
remote = "origin"
branch = "main"
"#;

        let config = LauncherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.launcher.interpreters, vec!["/opt/python/bin/python3"]);
        assert!(!config.launcher.use_venv);
        assert_eq!(config.launcher.entry_module.as_deref(), Some("mailbot_v26.start"));
        assert_eq!(config.launcher.manifest, PathBuf::from("requirements.txt"));
        assert!(!config.config_files.pause_on_missing);
        assert_eq!(config.config_files.files.len(), 3);
        assert_eq!(config.publish.branch.as_deref(), Some("main"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = LauncherConfig::from_toml_str("[launcher]\npyhton = \"x\"\n").unwrap_err();
        assert!(matches!(err, LauncherError::ConfigError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MAILBOT_TEST_LOG_DIR", "/var/log/mailbot");

        let toml_content = r#"
[launcher]
log_file = "${MAILBOT_TEST_LOG_DIR}/bot.log"
manifest = "${MAILBOT_TEST_UNSET_VAR}"
"#;

        let config = LauncherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.launcher.log_file, PathBuf::from("/var/log/mailbot/bot.log"));
        assert_eq!(config.launcher.manifest, PathBuf::from("${MAILBOT_TEST_UNSET_VAR}"));

        std::env::remove_var("MAILBOT_TEST_LOG_DIR");
    }

    #[test]
    fn test_env_var_with_backslashes_is_taken_literally() {
        std::env::set_var("MAILBOT_TEST_WIN_HOME", r"C:\MailBot\bot");
        std::env::set_var("MAILBOT_TEST_QUOTED", r#"say "hi""#);

        let toml_content = r#"
[launcher]
project_dir = "${MAILBOT_TEST_WIN_HOME}"
args = ["--greeting", "${MAILBOT_TEST_QUOTED}"]
"#;

        let config = LauncherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.launcher.project_dir,
            Some(PathBuf::from(r"C:\MailBot\bot"))
        );
        assert_eq!(config.launcher.args, vec!["--greeting", r#"say "hi""#]);

        std::env::remove_var("MAILBOT_TEST_WIN_HOME");
        std::env::remove_var("MAILBOT_TEST_QUOTED");
    }

    #[test]
    fn test_config_validation() {
        let mut config = LauncherConfig::default();
        config.launcher.interpreters.clear();
        assert!(config.validate().is_err());

        let mut config = LauncherConfig::default();
        config.config_files.files.push("config.ini".to_string());
        assert!(config.validate().is_err());

        let mut config = LauncherConfig::default();
        config.publish.branch = Some("main".to_string());
        assert!(config.validate().is_err());

        let mut config = LauncherConfig::default();
        config.publish.keep.push("[".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file_and_discover() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[launcher]\nentry_script = \"bot.py\"\n")
            .unwrap();

        let config = LauncherConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.launcher.entry_script, PathBuf::from("bot.py"));

        let dir = tempfile::TempDir::new().unwrap();
        let (config, source) = LauncherConfig::discover(None, dir.path()).unwrap();
        assert!(source.is_none());
        assert_eq!(config, LauncherConfig::default());

        let missing = dir.path().join("missing.toml");
        assert!(LauncherConfig::discover(Some(missing.as_path()), dir.path()).is_err());
    }

    #[test]
    fn test_resolve_project_dir_precedence() {
        let cwd = Path::new("/work");
        let mut config = LauncherConfig::default();

        assert_eq!(config.resolve_project_dir(None, None, cwd), PathBuf::from("/work"));
        assert_eq!(
            config.resolve_project_dir(None, Some(Path::new("/srv/bot/mailbot-launcher.toml")), cwd),
            PathBuf::from("/srv/bot")
        );

        config.launcher.project_dir = Some(PathBuf::from("mailbot_v26"));
        assert_eq!(
            config.resolve_project_dir(None, Some(Path::new("/srv/bot/mailbot-launcher.toml")), cwd),
            PathBuf::from("/srv/bot/mailbot_v26")
        );
        assert_eq!(
            config.resolve_project_dir(Some(Path::new("/elsewhere")), None, cwd),
            PathBuf::from("/elsewhere")
        );
    }
}
