//! # distpi
//!
//! Distributed Monte Carlo estimation of π.
//!
//! A coordinator splits `N` samples evenly over `W` workers, sends each its
//! share as three ordered values (sample count, interval low, interval high),
//! and combines the workers' partial sums of √(1−x²) without losing
//! precision:
//! - Partial sums are exact decimals and travel as decimal strings
//! - The denominator is the number of samples actually dispatched
//! - Any failure aborts the run; no estimate is built from a partial set
//!
//! ## Example
//!
//! ```rust,no_run
//! use distpi::prelude::*;
//!
//! # async fn demo() -> PiResult<()> {
//! let config = RunnerConfig::from_vars([("N", "1000000"), ("WORKERS", "4")])?;
//! let mut substrate = LocalSubstrate::with_seed(42);
//! let result = Coordinator::new(config, "local").run(&mut substrate).await?;
//! println!("pi ~ {}", result.pi_estimate);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_const_for_fn,
    clippy::future_not_send,  // Coordinator futures run on the caller's task
)]

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domains;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod substrate;
pub mod worker;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::RunnerConfig;
    pub use crate::coordinator::{AggregateResult, CollectStrategy, Coordinator, Partition};
    pub use crate::domains::{PreciseReal, QuarterCircleSampler};
    pub use crate::engine::rng::{FixedSequence, SampleRng, SampleSource};
    pub use crate::error::{PiError, PiResult};
    pub use crate::protocol::{Channel, PartialResult, WorkRequest};
    pub use crate::substrate::{
        LocalSubstrate, ProcessSubstrate, SubstrateKind, TaskSubstrate, WorkerHandle,
    };
    pub use crate::worker::{SeedSource, Worker};
}

/// Re-export for public API
pub use error::{PiError, PiResult};
