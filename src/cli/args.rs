//! CLI argument parsing.
//!
//! `distpi` with no subcommand runs the coordinator. Required inputs (`N`,
//! `WORKERS`) and the interval (`A`, `B`) always come from the environment;
//! the flags here override the optional environment settings.

use clap::{Parser, Subcommand};

use crate::coordinator::CollectStrategy;
use crate::substrate::SubstrateKind;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "distpi",
    version,
    about = "Distributed Monte Carlo estimation of pi"
)]
pub struct Args {
    /// The command to execute (defaults to `run`).
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the coordinator (reads N, A, B, WORKERS from the environment)
    Run(RunOptions),
    /// Serve one work request over stdin/stdout (started by the coordinator)
    Worker {
        /// Seed for this worker's generator; defaults to the clock.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Coordinator overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, clap::Args)]
pub struct RunOptions {
    /// Where workers run: `local` or `process` (overrides SUBSTRATE).
    #[arg(long)]
    pub substrate: Option<SubstrateKind>,

    /// How replies are awaited: `sequential` or `concurrent` (overrides COLLECT).
    #[arg(long)]
    pub collect: Option<CollectStrategy>,

    /// Base seed for reproducible runs (overrides SEED).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Executable for process workers (overrides WORKER_IMAGE).
    #[arg(long)]
    pub worker_image: Option<String>,
}

impl Args {
    /// The command to run, defaulting to the coordinator.
    #[must_use]
    pub fn command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Run(RunOptions::default()))
    }
}
