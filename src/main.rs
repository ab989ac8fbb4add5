//! distpi CLI - distributed Monte Carlo estimation of pi
//!
//! Logs go to stderr so a worker's stdout carries protocol frames only.

use clap::Parser;
use distpi::cli::{run_cli, Args};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    run_cli(Args::parse()).await
}
