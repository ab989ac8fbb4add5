//! CLI module tests.

use super::args::{Args, Command, RunOptions};
use super::commands::{apply_overrides, estimate};
use super::output::report_lines;
use crate::config::RunnerConfig;
use crate::coordinator::{AggregateResult, CollectStrategy};
use crate::domains::precision::PreciseReal;
use crate::substrate::SubstrateKind;
use clap::Parser;

fn base_config() -> RunnerConfig {
    RunnerConfig::from_vars([("N", "20000"), ("WORKERS", "4")]).unwrap()
}

// ============================================================================
// Args parsing tests
// ============================================================================

#[test]
fn test_parse_no_args_defaults_to_run() {
    let args = Args::try_parse_from(["distpi"]).unwrap();
    assert_eq!(args.command(), Command::Run(RunOptions::default()));
}

#[test]
fn test_parse_run_flags() {
    let args = Args::try_parse_from([
        "distpi",
        "run",
        "--substrate",
        "process",
        "--collect",
        "concurrent",
        "--seed",
        "42",
        "--worker-image",
        "/opt/distpi",
    ])
    .unwrap();
    assert_eq!(
        args.command(),
        Command::Run(RunOptions {
            substrate: Some(SubstrateKind::Process),
            collect: Some(CollectStrategy::Concurrent),
            seed: Some(42),
            worker_image: Some("/opt/distpi".to_string()),
        })
    );
}

#[test]
fn test_parse_worker() {
    let args = Args::try_parse_from(["distpi", "worker", "--seed", "7"]).unwrap();
    assert_eq!(args.command(), Command::Worker { seed: Some(7) });

    let args = Args::try_parse_from(["distpi", "worker"]).unwrap();
    assert_eq!(args.command(), Command::Worker { seed: None });
}

#[test]
fn test_parse_rejects_unknown_substrate() {
    assert!(Args::try_parse_from(["distpi", "run", "--substrate", "k8s"]).is_err());
}

#[test]
fn test_parse_rejects_unknown_command() {
    assert!(Args::try_parse_from(["distpi", "estimate"]).is_err());
}

// ============================================================================
// Override tests
// ============================================================================

#[test]
fn test_overrides_replace_env_values() {
    let config = apply_overrides(
        base_config(),
        RunOptions {
            substrate: Some(SubstrateKind::Process),
            collect: Some(CollectStrategy::Concurrent),
            seed: Some(9),
            worker_image: Some("worker-bin".to_string()),
        },
    );
    assert_eq!(config.substrate, SubstrateKind::Process);
    assert_eq!(config.collect, CollectStrategy::Concurrent);
    assert_eq!(config.seed, Some(9));
    assert_eq!(config.worker_image.as_deref(), Some("worker-bin"));
}

#[test]
fn test_empty_overrides_keep_env_values() {
    let mut env = base_config();
    env.seed = Some(5);
    let config = apply_overrides(env.clone(), RunOptions::default());
    assert_eq!(config, env);
}

// ============================================================================
// Command tests
// ============================================================================

#[tokio::test]
async fn test_estimate_local_seeded() {
    let mut config = base_config();
    config.seed = Some(123);
    let result = estimate(config).await.unwrap();
    assert_eq!(result.denominator, 20_000);
    assert_eq!(result.worker_elapsed.len(), 4);
    let pi = result.pi_estimate.to_f64().unwrap();
    assert!((pi - std::f64::consts::PI).abs() < 0.05, "pi estimate {pi}");
}

// ============================================================================
// Output tests
// ============================================================================

#[test]
fn test_report_lines() {
    let result = AggregateResult {
        pi_estimate: PreciseReal::parse("3.14159").unwrap(),
        integral_estimate: PreciseReal::parse("0.7853975").unwrap(),
        total_sum: PreciseReal::parse("785397.5").unwrap(),
        denominator: 1_000_000,
        worker_elapsed: vec![0.5, 1.25, 0.75],
        total_elapsed_seconds: 2.0,
    };
    let lines = report_lines(&result);
    assert_eq!(lines[0], "Samples used: 1000000");
    assert!(lines.contains(&"Pi estimation: 3.14159".to_string()));
    assert!(lines.contains(&"Slowest worker compute time: 1.250000s".to_string()));
    assert_eq!(lines.last().unwrap(), "Total execution time: 2.000000s");
}

#[test]
fn test_report_lines_without_workers() {
    let result = AggregateResult {
        pi_estimate: PreciseReal::zero(),
        integral_estimate: PreciseReal::zero(),
        total_sum: PreciseReal::zero(),
        denominator: 0,
        worker_elapsed: Vec::new(),
        total_elapsed_seconds: 0.0,
    };
    let lines = report_lines(&result);
    assert!(!lines.iter().any(|l| l.starts_with("Slowest")));
}
