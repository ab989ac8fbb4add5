//! In-process substrate: each worker is a tokio task.
//!
//! Coordinator and worker talk over a pair of unbounded in-memory queues
//! carrying JSON values, so the exchange goes through the same encoding as
//! the process substrate. The sampling loop itself runs on tokio's blocking
//! pool.

use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{next_seed, TaskSubstrate, WorkerHandle};
use crate::engine::rng::SampleRng;
use crate::error::{PiError, PiResult};
use crate::protocol::{Channel, ChannelError};
use crate::worker::Worker;

/// One end of an in-memory duplex value channel.
#[derive(Debug)]
pub struct MemoryChannel {
    tx: UnboundedSender<Value>,
    rx: UnboundedReceiver<Value>,
}

impl MemoryChannel {
    /// Create two connected ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = unbounded_channel();
        let (b_tx, a_rx) = unbounded_channel();
        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }
}

impl Channel for MemoryChannel {
    async fn send(&mut self, value: Value) -> Result<(), ChannelError> {
        self.tx.send(value).map_err(|_| ChannelError::Closed)
    }

    async fn recv(&mut self) -> Result<Value, ChannelError> {
        self.rx.recv().await.ok_or(ChannelError::Closed)
    }
}

/// Handle to a worker task.
#[derive(Debug)]
pub struct LocalWorker {
    index: usize,
    channel: MemoryChannel,
    task: JoinHandle<PiResult<()>>,
}

impl LocalWorker {
    /// Index of this worker in start order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl Channel for LocalWorker {
    async fn send(&mut self, value: Value) -> Result<(), ChannelError> {
        self.channel.send(value).await
    }

    async fn recv(&mut self) -> Result<Value, ChannelError> {
        self.channel.recv().await
    }
}

impl WorkerHandle for LocalWorker {
    async fn finish(self) -> PiResult<()> {
        drop(self.channel);
        self.task
            .await
            .map_err(|e| PiError::communication(format!("joining worker {}", self.index), e))?
    }
}

/// Starts workers as tokio tasks on the current runtime.
///
/// Without a seed every worker seeds from the clock when it starts
/// computing. With a seed, worker `i` gets the `i`-th partitioned stream of
/// that seed, so whole runs reproduce.
#[derive(Debug, Default)]
pub struct LocalSubstrate {
    seeds: Option<SampleRng>,
    started: usize,
}

impl LocalSubstrate {
    /// Substrate whose workers seed from the clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Substrate whose workers draw partitioned streams of `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seeds: Some(SampleRng::new(seed)),
            started: 0,
        }
    }

    /// Number of workers started so far.
    #[must_use]
    pub const fn started(&self) -> usize {
        self.started
    }
}

impl TaskSubstrate for LocalSubstrate {
    type Handle = LocalWorker;

    async fn start(&mut self, image: &str) -> PiResult<LocalWorker> {
        let index = self.started;
        let seed = next_seed(self.seeds.as_mut());
        let (coordinator_end, mut worker_end) = MemoryChannel::pair();

        tracing::debug!("starting local worker {index} (image '{image}', seed {seed:?})");
        let task = tokio::spawn(async move {
            let mut worker = Worker::new(seed);
            match worker.serve(&mut worker_end).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    tracing::error!("worker {index} aborted while {}: {e}", worker.state());
                    Err(e)
                }
            }
        });

        self.started += 1;
        Ok(LocalWorker {
            index,
            channel: coordinator_end,
            task,
        })
    }
}
