pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{AutoOperator, ConsoleOperator, TokioProcessRunner};
pub use config::{LauncherCli, LauncherConfig, PublishCli};
pub use core::engine::{LauncherEngine, RunSummary};
pub use utils::error::{LauncherError, Result};
