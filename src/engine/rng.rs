//! Random sample sources for the worker's sampling loop.
//!
//! Workers draw from a PCG (Permuted Congruential Generator). By default each
//! worker seeds from the wall clock at the moment it starts computing, so
//! workers started at distinct moments draw independent streams. Tests and
//! reproducible runs inject a seed instead, or replace the generator entirely
//! with a [`FixedSequence`].

use rand::prelude::*;
use rand_pcg::Pcg64;
use std::time::{SystemTime, UNIX_EPOCH};

/// Golden-ratio increment used to spread partitioned stream seeds.
const STREAM_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Source of sample points for Monte Carlo integration.
pub trait SampleSource {
    /// Next sample point for the interval `[low, high)`.
    ///
    /// Random sources draw uniformly from the interval. Replay sources may
    /// ignore it.
    fn sample_in(&mut self, low: f64, high: f64) -> f64;
}

/// Seedable PCG generator with partitioned independent streams.
#[derive(Debug, Clone)]
pub struct SampleRng {
    /// Seed this generator was built from.
    master_seed: u64,
    /// Current stream index for partitioning.
    stream: u64,
    /// Internal PCG state.
    rng: Pcg64,
}

impl SampleRng {
    /// Create a new RNG with the given master seed.
    #[must_use]
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            stream: 0,
            rng: Pcg64::seed_from_u64(master_seed),
        }
    }

    /// Create an RNG seeded from the current wall-clock time in nanoseconds.
    #[must_use]
    pub fn from_clock() -> Self {
        Self::new(clock_seed())
    }

    /// Get the master seed.
    #[must_use]
    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Get current stream index.
    #[must_use]
    pub const fn stream(&self) -> u64 {
        self.stream
    }

    /// Derive `n` seeds for independent streams, one per worker.
    ///
    /// The same master seed always yields the same seeds in the same order.
    ///
    /// ```rust
    /// use distpi::engine::rng::SampleRng;
    ///
    /// let mut rng = SampleRng::new(42);
    /// let seeds = rng.partition_seeds(4);
    /// assert_eq!(seeds.len(), 4);
    /// assert_ne!(seeds[0], seeds[1]);
    /// ```
    #[must_use]
    pub fn partition_seeds(&mut self, n: usize) -> Vec<u64> {
        let seeds = (0..n as u64)
            .map(|i| {
                let stream = self.stream + i;
                self.master_seed
                    .wrapping_add(stream.wrapping_mul(STREAM_SPREAD))
            })
            .collect();
        self.stream += n as u64;
        seeds
    }

    /// Seed for the next worker: the next partitioned stream.
    pub fn next_worker_seed(&mut self) -> u64 {
        let seed = self
            .master_seed
            .wrapping_add(self.stream.wrapping_mul(STREAM_SPREAD));
        self.stream += 1;
        seed
    }

    /// Generate a random f64 in [0, 1).
    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen()
    }
}

impl SampleSource for SampleRng {
    fn sample_in(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.gen_f64()
    }
}

/// Replays a fixed sequence of sample points, cycling when exhausted.
///
/// The interval passed to [`SampleSource::sample_in`] is ignored: the stored
/// values are returned as the sample points themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    /// Create a source cycling through `values`. An empty slice yields `0.0`.
    #[must_use]
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Source that returns the same point forever.
    #[must_use]
    pub fn constant(x: f64) -> Self {
        Self::new(vec![x])
    }
}

impl SampleSource for FixedSequence {
    fn sample_in(&mut self, _low: f64, _high: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value
    }
}

/// Nanoseconds since the Unix epoch, truncated to 64 bits.
#[must_use]
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
