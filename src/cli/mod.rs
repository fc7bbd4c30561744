//! Line-oriented shell over the ledger container. Presentation only: every
//! state change goes through the container's operations.

pub mod commands;
pub mod output;
mod shell;

pub use commands::CliMode;
pub use shell::run_cli;
