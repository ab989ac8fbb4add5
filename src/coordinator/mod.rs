//! Coordinator side of the protocol.
//!
//! One run is strictly: partition, dispatch every worker in order, collect
//! every reply, aggregate. There is no timeout: a stalled worker stalls the
//! run. Any error aborts the run and no estimate is produced.

pub mod aggregate;
pub mod dispatch;
pub mod partition;

pub use aggregate::{aggregate, collect, AggregateResult, CollectStrategy};
pub use dispatch::dispatch;
pub use partition::Partition;

use crate::config::RunnerConfig;
use crate::engine::clock::Stopwatch;
use crate::error::PiResult;
use crate::substrate::TaskSubstrate;

/// Runs one estimation over a task substrate.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: RunnerConfig,
    image: String,
}

impl Coordinator {
    /// Create a coordinator that starts workers from `image`.
    #[must_use]
    pub fn new(config: RunnerConfig, image: impl Into<String>) -> Self {
        Self {
            config,
            image: image.into(),
        }
    }

    /// Partition, dispatch, collect, and aggregate.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, start, communication, or parse
    /// failure.
    pub async fn run<S: TaskSubstrate>(&self, substrate: &mut S) -> PiResult<AggregateResult> {
        let watch = Stopwatch::start();
        let cfg = &self.config;

        tracing::info!(
            "received n={}, a={}, b={}, workers={}",
            cfg.total_samples,
            cfg.interval_low,
            cfg.interval_high,
            cfg.workers
        );

        let partition = Partition::new(cfg.total_samples, cfg.workers)?;
        tracing::info!("samples per worker={}", partition.per_worker());
        if partition.dropped() > 0 {
            tracing::info!(
                "{} samples dropped by integer division; denominator is {}",
                partition.dropped(),
                partition.dispatched()
            );
        }

        tracing::info!("sending tasks to {} workers", partition.workers());
        let handles = dispatch(
            substrate,
            &self.image,
            &partition,
            cfg.interval_low,
            cfg.interval_high,
        )
        .await?;

        let results = collect(handles, cfg.collect).await?;

        tracing::info!("calculating final result");
        let mut outcome = aggregate(&results, &partition, cfg.interval_low, cfg.interval_high)?;
        outcome.total_elapsed_seconds = watch.elapsed_secs();
        Ok(outcome)
    }
}
