//! Sampling engine primitives.
//!
//! - Seedable sample sources (PCG with partitioned seeds, fixed sequences)
//! - Wall-clock stopwatch for compute and run timings

pub mod clock;
pub mod rng;

pub use clock::Stopwatch;
pub use rng::{FixedSequence, SampleRng, SampleSource};
