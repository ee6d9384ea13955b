pub mod cli;
pub mod toml_config;

pub use cli::{AuditArgs, GlobalArgs, LauncherCli, LauncherCommand, PublishCli, RunArgs};
pub use toml_config::{LauncherConfig, DEFAULT_CONFIG_FILE};
