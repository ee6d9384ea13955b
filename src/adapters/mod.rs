// Adapters layer: concrete implementations of the domain ports.

pub mod console;
pub mod process;

pub use console::{AutoOperator, ConsoleOperator};
pub use process::TokioProcessRunner;
