//! Collecting partial results and combining them into the estimate.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::partition::Partition;
use crate::domains::monte_carlo::{estimate_integral, pi_from_integral};
use crate::domains::precision::PreciseReal;
use crate::error::{PiError, PiResult};
use crate::protocol::PartialResult;
use crate::substrate::WorkerHandle;

/// Order in which the coordinator waits on workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectStrategy {
    /// Block on worker 0, then worker 1, and so on.
    #[default]
    Sequential,
    /// Wait on all workers at once; the first failure aborts the run.
    /// Results are still combined in dispatch order.
    Concurrent,
}

impl fmt::Display for CollectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
        })
    }
}

impl FromStr for CollectStrategy {
    type Err = PiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(PiError::config(format!(
                "unknown collect strategy '{other}' (expected 'sequential' or 'concurrent')"
            ))),
        }
    }
}

/// Combined outcome of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    /// `4 * integral_estimate`.
    pub pi_estimate: PreciseReal,
    /// `(high - low) * total_sum / denominator`.
    pub integral_estimate: PreciseReal,
    /// Exact sum of all partial sums.
    pub total_sum: PreciseReal,
    /// Samples actually dispatched.
    pub denominator: u64,
    /// Per-worker sampling time, in dispatch order.
    pub worker_elapsed: Vec<f64>,
    /// Coordinator wall time for the whole run.
    pub total_elapsed_seconds: f64,
}

/// Receive one reply from every handle, returned in dispatch order.
///
/// Each handle is released once its reply is in.
///
/// # Errors
///
/// Returns the first communication, parse, or worker-exit failure. No
/// partial set of results is ever returned.
pub async fn collect<H: WorkerHandle>(
    handles: Vec<H>,
    strategy: CollectStrategy,
) -> PiResult<Vec<PartialResult>> {
    match strategy {
        CollectStrategy::Sequential => {
            let mut results = Vec::with_capacity(handles.len());
            for (index, handle) in handles.into_iter().enumerate() {
                results.push(collect_one(index, handle).await?);
            }
            Ok(results)
        }
        CollectStrategy::Concurrent => {
            try_join_all(
                handles
                    .into_iter()
                    .enumerate()
                    .map(|(index, handle)| collect_one(index, handle)),
            )
            .await
        }
    }
}

async fn collect_one<H: WorkerHandle>(index: usize, mut handle: H) -> PiResult<PartialResult> {
    let result = PartialResult::recv(&mut handle).await?;
    tracing::info!(
        "worker {index} result: {} time taken: {:.6}s",
        result.sum,
        result.elapsed_seconds
    );
    handle.finish().await?;
    Ok(result)
}

/// Combine partial results into the integral and π estimates.
///
/// Sums at full precision, divides by the dispatched sample count, scales by
/// the interval width, then by 4.
///
/// # Errors
///
/// Returns an error if the number of results does not match the partition,
/// or if no samples were dispatched.
pub fn aggregate(
    results: &[PartialResult],
    partition: &Partition,
    interval_low: f64,
    interval_high: f64,
) -> PiResult<AggregateResult> {
    if results.len() != partition.workers() {
        return Err(PiError::MonteCarlo(format!(
            "expected {} partial results, got {}",
            partition.workers(),
            results.len()
        )));
    }

    let total_sum: PreciseReal = results.iter().map(|r| &r.sum).sum();
    let denominator = partition.dispatched();
    let integral_estimate = estimate_integral(&total_sum, denominator, interval_low, interval_high)?;
    let pi_estimate = pi_from_integral(&integral_estimate);

    Ok(AggregateResult {
        pi_estimate,
        integral_estimate,
        total_sum,
        denominator,
        worker_elapsed: results.iter().map(|r| r.elapsed_seconds).collect(),
        total_elapsed_seconds: 0.0,
    })
}
