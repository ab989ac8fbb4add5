//! Task substrates: how workers are started and reached.
//!
//! The coordinator depends only on [`TaskSubstrate::start`] and the
//! [`WorkerHandle`] it returns. Substrates never retry, reschedule, or
//! rebalance.

pub mod local;
pub mod process;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::engine::rng::SampleRng;
use crate::error::{PiError, PiResult};
use crate::protocol::Channel;
use crate::worker::SeedSource;

pub use local::{LocalSubstrate, MemoryChannel};
pub use process::ProcessSubstrate;

/// A running worker, owned by the coordinator for one run.
pub trait WorkerHandle: Channel {
    /// Release the worker after its result has been received.
    ///
    /// Waits for the worker to exit and reports an abnormal exit.
    fn finish(self) -> impl Future<Output = PiResult<()>> + Send;
}

/// Starts workers.
pub trait TaskSubstrate {
    /// Handle type for started workers.
    type Handle: WorkerHandle;

    /// Start one worker from `image`.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::TaskStart`] if the worker cannot be started.
    fn start(&mut self, image: &str) -> impl Future<Output = PiResult<Self::Handle>> + Send;
}

/// Seed for the next started worker.
///
/// With a base generator, worker `i` gets its `i`-th partitioned stream;
/// without one, the worker seeds from its clock.
pub(crate) fn next_seed(seeds: Option<&mut SampleRng>) -> SeedSource {
    seeds.map_or(SeedSource::Clock, |rng| {
        SeedSource::Fixed(rng.next_worker_seed())
    })
}

/// Which substrate the coordinator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstrateKind {
    /// In-process tokio tasks.
    #[default]
    Local,
    /// Child processes over stdin/stdout.
    Process,
}

impl fmt::Display for SubstrateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Process => "process",
        })
    }
}

impl FromStr for SubstrateKind {
    type Err = PiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "process" => Ok(Self::Process),
            other => Err(PiError::config(format!(
                "unknown substrate '{other}' (expected 'local' or 'process')"
            ))),
        }
    }
}
