//! Worker side of the protocol.
//!
//! A worker walks a fixed state machine:
//!
//! ```text
//! AwaitingSampleCount -> AwaitingLow -> AwaitingHigh -> Computing -> AwaitingSend -> Done
//! ```
//!
//! Each `Awaiting*` state consumes exactly one value from the channel. Any
//! missing or malformed value aborts the worker in the state where it
//! happened; nothing is retried.

use std::fmt;

use crate::domains::monte_carlo::QuarterCircleSampler;
use crate::engine::rng::{SampleRng, SampleSource};
use crate::error::{PiError, PiResult};
use crate::protocol::codec::FramedChannel;
use crate::protocol::{recv_field, Channel, Field, PartialResult, WorkRequest};

/// Where a worker's random stream comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedSource {
    /// Wall-clock nanoseconds at the moment computing starts.
    #[default]
    Clock,
    /// A fixed seed, for reproducible runs.
    Fixed(u64),
}

impl SeedSource {
    /// Build the generator for this source.
    #[must_use]
    pub fn rng(self) -> SampleRng {
        match self {
            Self::Clock => SampleRng::from_clock(),
            Self::Fixed(seed) => SampleRng::new(seed),
        }
    }
}

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for the sample count.
    AwaitingSampleCount,
    /// Waiting for the interval low bound.
    AwaitingLow,
    /// Waiting for the interval high bound.
    AwaitingHigh,
    /// Running the sampling loop.
    Computing,
    /// Sending the partial result.
    AwaitingSend,
    /// Result delivered.
    Done,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingSampleCount => "awaiting sample count",
            Self::AwaitingLow => "awaiting interval low",
            Self::AwaitingHigh => "awaiting interval high",
            Self::Computing => "computing",
            Self::AwaitingSend => "awaiting send",
            Self::Done => "done",
        })
    }
}

/// One worker: receives a [`WorkRequest`], samples, replies once.
#[derive(Debug)]
pub struct Worker {
    seed: SeedSource,
    state: WorkerState,
}

impl Worker {
    /// Create a worker that will seed its generator from `seed`.
    #[must_use]
    pub const fn new(seed: SeedSource) -> Self {
        Self {
            seed,
            state: WorkerState::AwaitingSampleCount,
        }
    }

    /// Current state. After a failure this is the state that failed.
    #[must_use]
    pub const fn state(&self) -> WorkerState {
        self.state
    }

    /// Run the whole exchange with a PCG generator built from the seed source.
    ///
    /// # Errors
    ///
    /// Returns the first receive, sampling, or send failure.
    pub async fn serve<C: Channel>(&mut self, channel: &mut C) -> PiResult<PartialResult> {
        let seed = self.seed;
        self.serve_with(channel, move || seed.rng()).await
    }

    /// Run the whole exchange with a caller-supplied sample source.
    ///
    /// `make_source` is called once, after the request is received and
    /// before sampling starts.
    ///
    /// # Errors
    ///
    /// Returns the first receive, sampling, or send failure.
    pub async fn serve_with<C, S, F>(&mut self, channel: &mut C, make_source: F) -> PiResult<PartialResult>
    where
        C: Channel,
        S: SampleSource + Send + 'static,
        F: FnOnce() -> S + Send,
    {
        let request = self.receive_request(channel).await?;

        self.state = WorkerState::Computing;
        tracing::info!(
            "received n={}, a={}, b={}; calculating",
            request.sample_count,
            request.interval_low,
            request.interval_high
        );
        let sampler = QuarterCircleSampler::new(
            request.sample_count,
            request.interval_low,
            request.interval_high,
        );
        let mut source = make_source();
        let outcome = tokio::task::spawn_blocking(move || sampler.run(&mut source))
            .await
            .map_err(|e| PiError::communication("joining sampling task", e))??;

        self.state = WorkerState::AwaitingSend;
        tracing::info!("sending result after {:.6}s of sampling", outcome.elapsed_seconds);
        let result = PartialResult {
            sum: outcome.sum,
            elapsed_seconds: outcome.elapsed_seconds,
        };
        result.send(channel).await?;

        self.state = WorkerState::Done;
        Ok(result)
    }

    /// Receive the three request fields in wire order.
    async fn receive_request<C: Channel>(&mut self, channel: &mut C) -> PiResult<WorkRequest> {
        self.state = WorkerState::AwaitingSampleCount;
        tracing::debug!("receiving n");
        let sample_count: u64 = recv_field(channel, Field::SampleCount).await?;

        self.state = WorkerState::AwaitingLow;
        tracing::debug!("receiving a");
        let interval_low: f64 = recv_field(channel, Field::IntervalLow).await?;

        self.state = WorkerState::AwaitingHigh;
        tracing::debug!("receiving b");
        let interval_high: f64 = recv_field(channel, Field::IntervalHigh).await?;

        Ok(WorkRequest {
            sample_count,
            interval_low,
            interval_high,
        })
    }
}

/// Serve one request over this process's stdin/stdout.
///
/// Used by child processes started by the process substrate. Logging must go
/// to stderr; stdout carries frames only.
///
/// # Errors
///
/// Returns the worker's failure, after logging it.
pub async fn serve_stdio(seed: SeedSource) -> PiResult<()> {
    let mut channel = FramedChannel::new(tokio::io::stdin(), tokio::io::stdout());
    let mut worker = Worker::new(seed);
    match worker.serve(&mut channel).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("worker aborted while {}: {e}", worker.state());
            Err(e)
        }
    }
}
