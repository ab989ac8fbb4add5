//! Splitting the requested sample count across workers.
//!
//! Every worker receives `floor(N / W)` samples. The remainder `N mod W` is
//! dropped, not redistributed, and the estimator's denominator is the number
//! of samples actually dispatched.

use crate::error::{PiError, PiResult};
use crate::protocol::WorkRequest;

/// Equal split of `requested` samples over `workers` workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    requested: u64,
    workers: usize,
    per_worker: u64,
}

impl Partition {
    /// Split `requested` samples over `workers` workers.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `workers` is zero.
    pub fn new(requested: u64, workers: usize) -> PiResult<Self> {
        if workers == 0 {
            return Err(PiError::config("worker count must be positive"));
        }
        Ok(Self {
            requested,
            workers,
            per_worker: requested / workers as u64,
        })
    }

    /// Samples originally requested.
    #[must_use]
    pub const fn requested(&self) -> u64 {
        self.requested
    }

    /// Number of workers.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Samples each worker draws.
    #[must_use]
    pub const fn per_worker(&self) -> u64 {
        self.per_worker
    }

    /// Samples actually dispatched, `per_worker * workers`. This is the
    /// aggregation denominator.
    #[must_use]
    pub const fn dispatched(&self) -> u64 {
        self.per_worker * self.workers as u64
    }

    /// Samples dropped by integer division, `requested mod workers`.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.requested - self.dispatched()
    }

    /// The request every worker receives.
    #[must_use]
    pub const fn work_request(&self, interval_low: f64, interval_high: f64) -> WorkRequest {
        WorkRequest {
            sample_count: self.per_worker,
            interval_low,
            interval_high,
        }
    }
}
