//! CLI command handlers.
//!
//! Every failure is logged once here and mapped to an exit code:
//! `2` for configuration errors (nothing was started), `1` for everything
//! else.

use std::process::ExitCode;

use super::args::{Args, Command, RunOptions};
use super::output::log_report;
use crate::config::RunnerConfig;
use crate::coordinator::{AggregateResult, Coordinator};
use crate::error::{PiError, PiResult};
use crate::substrate::{LocalSubstrate, ProcessSubstrate, SubstrateKind};
use crate::worker::{serve_stdio, SeedSource};

/// Main CLI entry point.
pub async fn run_cli(args: Args) -> ExitCode {
    match args.command() {
        Command::Run(options) => run_coordinator(options).await,
        Command::Worker { seed } => run_worker(seed).await,
    }
}

/// Run the coordinator with configuration from the environment.
pub async fn run_coordinator(options: RunOptions) -> ExitCode {
    let outcome = match RunnerConfig::from_env() {
        Ok(config) => estimate(apply_overrides(config, options)).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(result) => {
            log_report(&result);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Serve one request over stdio as a worker process.
pub async fn run_worker(seed: Option<u64>) -> ExitCode {
    let source = seed.map_or(SeedSource::Clock, SeedSource::Fixed);
    match serve_stdio(source).await {
        Ok(()) => ExitCode::SUCCESS,
        // serve_stdio already logged the failure.
        Err(_) => ExitCode::from(1),
    }
}

/// Merge CLI flags over environment settings.
#[must_use]
pub fn apply_overrides(mut config: RunnerConfig, options: RunOptions) -> RunnerConfig {
    if let Some(substrate) = options.substrate {
        config.substrate = substrate;
    }
    if let Some(collect) = options.collect {
        config.collect = collect;
    }
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    if options.worker_image.is_some() {
        config.worker_image = options.worker_image;
    }
    config
}

/// Run one estimation on the configured substrate.
///
/// # Errors
///
/// Returns the coordinator's first failure.
pub async fn estimate(config: RunnerConfig) -> PiResult<AggregateResult> {
    match config.substrate {
        SubstrateKind::Local => {
            let mut substrate = config
                .seed
                .map_or_else(LocalSubstrate::new, LocalSubstrate::with_seed);
            Coordinator::new(config, "local").run(&mut substrate).await
        }
        SubstrateKind::Process => {
            let image = config.resolve_worker_image()?;
            let mut substrate = config
                .seed
                .map_or_else(ProcessSubstrate::new, ProcessSubstrate::with_seed);
            tracing::info!("starting process workers from {image}");
            Coordinator::new(config, image).run(&mut substrate).await
        }
    }
}

/// Log `err` and pick the exit code.
fn fail(err: &PiError) -> ExitCode {
    tracing::error!("{err}");
    if err.is_startup_error() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}
