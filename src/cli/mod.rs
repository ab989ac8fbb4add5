//! CLI module for distpi.
//!
//! `main.rs` only installs logging and calls [`run_cli`]; everything else
//! lives here so it can be tested.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, RunOptions};
pub use commands::{run_cli, run_coordinator, run_worker};
pub use output::{log_report, report_lines};

#[cfg(test)]
mod tests;
