pub mod audit;
pub mod bootstrap;
pub mod config_check;
pub mod engine;
pub mod launcher;
pub mod publish;

pub use crate::domain::model::{BootstrapReport, CommandSpec, ExitOutcome, LaunchOutcome};
pub use crate::domain::ports::{Operator, ProcessRunner};
pub use crate::utils::error::Result;
