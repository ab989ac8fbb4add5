//! Child-process substrate.
//!
//! The worker image is an executable path. Each worker is started as
//! `<image> worker [--seed <n>]` with piped stdin/stdout carrying
//! length-prefixed JSON frames; the child's stderr is inherited so its logs
//! interleave with the coordinator's.

use serde_json::Value;
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::{next_seed, TaskSubstrate, WorkerHandle};
use crate::engine::rng::SampleRng;
use crate::error::{PiError, PiResult};
use crate::protocol::codec::FramedChannel;
use crate::protocol::{Channel, ChannelError};
use crate::worker::SeedSource;

/// Handle to a worker child process.
#[derive(Debug)]
pub struct ProcessWorker {
    index: usize,
    channel: FramedChannel<ChildStdout, ChildStdin>,
    child: Child,
}

impl ProcessWorker {
    /// Index of this worker in start order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl Channel for ProcessWorker {
    async fn send(&mut self, value: Value) -> Result<(), ChannelError> {
        self.channel.send(value).await
    }

    async fn recv(&mut self) -> Result<Value, ChannelError> {
        self.channel.recv().await
    }
}

impl WorkerHandle for ProcessWorker {
    async fn finish(self) -> PiResult<()> {
        let Self {
            index,
            channel,
            mut child,
        } = self;
        // Closing stdin lets a well-behaved worker exit.
        drop(channel);
        let status = child.wait().await?;
        if status.success() {
            tracing::debug!("worker {index} exited cleanly");
            Ok(())
        } else {
            Err(PiError::communication(
                format!("waiting for worker {index}"),
                format!("process exited with {status}"),
            ))
        }
    }
}

/// Starts workers as child processes.
#[derive(Debug, Default)]
pub struct ProcessSubstrate {
    seeds: Option<SampleRng>,
    started: usize,
}

impl ProcessSubstrate {
    /// Substrate whose workers seed from their own clocks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Substrate passing the `i`-th partitioned stream of `seed` to worker `i`.
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

impl TaskSubstrate for ProcessSubstrate {
    type Handle = ProcessWorker;

    async fn start(&mut self, image: &str) -> PiResult<ProcessWorker> {
        let index = self.started;

        let mut command = Command::new(image);
        command
            .arg("worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let SeedSource::Fixed(seed) = next_seed(self.seeds.as_mut()) {
            command.arg("--seed").arg(seed.to_string());
        }

        let mut child = command
            .spawn()
            .map_err(|e| PiError::task_start(index, image, e))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PiError::task_start(index, image, "stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PiError::task_start(index, image, "stdout not captured"))?;

        tracing::debug!("started worker {index} as pid {:?}", child.id());
        self.started += 1;
        Ok(ProcessWorker {
            index,
            channel: FramedChannel::new(stdout, stdin),
            child,
        })
    }
}
