//! Coordinator/worker wire protocol.
//!
//! A worker handle is an ordered, reliable [`Channel`] of JSON values. The
//! exchange for one worker is:
//!
//! ```text
//! coordinator -> worker : sampleCount   (integer)
//! coordinator -> worker : intervalLow   (real)
//! coordinator -> worker : intervalHigh  (real)
//! worker -> coordinator : {"sum": "<decimal>", "elapsedSeconds": <real>}
//! ```
//!
//! The three request fields travel as three separate values in that order.
//! The partial sum travels as a decimal string so no precision is lost.

pub mod codec;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::domains::precision::PreciseReal;
use crate::error::{PiError, PiResult};

/// Failure on a single channel operation.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer went away before the exchange completed.
    #[error("channel closed")]
    Closed,
    /// A frame header announced more than the allowed payload.
    #[error("frame too large: {size} bytes (max {max})", max = codec::MAX_FRAME_SIZE)]
    TooLarge {
        /// Announced payload size.
        size: u32,
    },
    /// Underlying stream I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Payload was not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered, reliable, bidirectional value channel to one peer.
///
/// Each call is one value in one direction. Implementations must deliver
/// values in send order.
pub trait Channel: Send {
    /// Send one value to the peer.
    fn send(&mut self, value: Value) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Block until the next value from the peer arrives.
    fn recv(&mut self) -> impl Future<Output = Result<Value, ChannelError>> + Send;
}

/// Protocol fields, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Number of samples the worker draws.
    SampleCount,
    /// Lower interval bound.
    IntervalLow,
    /// Upper interval bound.
    IntervalHigh,
    /// The worker's reply.
    PartialResult,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SampleCount => "sample count",
            Self::IntervalLow => "interval low",
            Self::IntervalHigh => "interval high",
            Self::PartialResult => "partial result",
        })
    }
}

/// Serialize `value` and send it as `field`.
///
/// # Errors
///
/// Returns [`PiError::Communication`] if the channel fails.
pub async fn send_field<C, T>(channel: &mut C, field: Field, value: &T) -> PiResult<()>
where
    C: Channel,
    T: Serialize + Sync,
{
    let json = serde_json::to_value(value)?;
    channel
        .send(json)
        .await
        .map_err(|e| PiError::communication(format!("sending {field}"), e))
}

/// Receive the next value and decode it as `field`.
///
/// # Errors
///
/// Returns [`PiError::Communication`] if the channel fails or the value has
/// the wrong shape.
pub async fn recv_field<C, T>(channel: &mut C, field: Field) -> PiResult<T>
where
    C: Channel,
    T: DeserializeOwned,
{
    let json = channel
        .recv()
        .await
        .map_err(|e| PiError::communication(format!("receiving {field}"), e))?;
    serde_json::from_value(json).map_err(|e| PiError::communication(format!("decoding {field}"), e))
}

/// One worker's share of the run. Immutable once sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequest {
    /// Samples to draw.
    pub sample_count: u64,
    /// Lower bound of the sampling interval.
    pub interval_low: f64,
    /// Upper bound of the sampling interval.
    pub interval_high: f64,
}

impl WorkRequest {
    /// Send the three fields as three sequential values, in wire order.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::Communication`] on the first failed send.
    pub async fn send<C: Channel>(&self, channel: &mut C) -> PiResult<()> {
        send_field(channel, Field::SampleCount, &self.sample_count).await?;
        send_field(channel, Field::IntervalLow, &self.interval_low).await?;
        send_field(channel, Field::IntervalHigh, &self.interval_high).await
    }
}

/// A worker's reply: exact partial sum plus compute time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResult {
    /// Exact sum of sampled integrand values.
    pub sum: PreciseReal,
    /// Seconds spent in the sampling loop.
    pub elapsed_seconds: f64,
}

/// Shape of the reply on the wire, before the sum is parsed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePartialResult {
    sum: String,
    elapsed_seconds: f64,
}

impl PartialResult {
    /// Encode as `{"sum": "<decimal>", "elapsedSeconds": <real>}`.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::Serialization`] if encoding fails.
    pub fn encode(&self) -> PiResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a reply value.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::ResultParse`] if `sum` is not a decimal numeral and
    /// [`PiError::Communication`] if the object is malformed or the elapsed
    /// time is negative or non-finite.
    pub fn decode(value: Value) -> PiResult<Self> {
        let wire: WirePartialResult = serde_json::from_value(value)
            .map_err(|e| PiError::communication(format!("decoding {}", Field::PartialResult), e))?;
        if !wire.elapsed_seconds.is_finite() || wire.elapsed_seconds < 0.0 {
            return Err(PiError::communication(
                format!("decoding {}", Field::PartialResult),
                format!("invalid elapsed time {}", wire.elapsed_seconds),
            ));
        }
        Ok(Self {
            sum: PreciseReal::parse(&wire.sum)?,
            elapsed_seconds: wire.elapsed_seconds,
        })
    }

    /// Send this reply on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`PiError::Communication`] if the channel fails.
    pub async fn send<C: Channel>(&self, channel: &mut C) -> PiResult<()> {
        let value = self.encode()?;
        channel
            .send(value)
            .await
            .map_err(|e| PiError::communication(format!("sending {}", Field::PartialResult), e))
    }

    /// Receive and decode a reply from `channel`.
    ///
    /// # Errors
    ///
    /// See [`PartialResult::decode`]; channel failures are
    /// [`PiError::Communication`].
    pub async fn recv<C: Channel>(channel: &mut C) -> PiResult<Self> {
        let value = channel
            .recv()
            .await
            .map_err(|e| PiError::communication(format!("receiving {}", Field::PartialResult), e))?;
        Self::decode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::local::MemoryChannel;
    use serde_json::json;

    #[test]
    fn test_partial_result_wire_shape() {
        let result = PartialResult {
            sum: PreciseReal::parse("196349.54081632653061224489795918367").unwrap(),
            elapsed_seconds: 1.5,
        };
        let value = result.encode().unwrap();
        assert_eq!(
            value,
            json!({"sum": "196349.54081632653061224489795918367", "elapsedSeconds": 1.5})
        );
        assert_eq!(PartialResult::decode(value).unwrap(), result);
    }

    #[test]
    fn test_decode_rejects_non_numeric_sum() {
        let err = PartialResult::decode(json!({"sum": "abc", "elapsedSeconds": 0.1})).unwrap_err();
        assert!(matches!(err, PiError::ResultParse { ref value, .. } if value == "abc"));
    }

    #[test]
    fn test_decode_rejects_float_sum() {
        // A bare number instead of a decimal string is a shape error.
        let err = PartialResult::decode(json!({"sum": 1.5, "elapsedSeconds": 0.1})).unwrap_err();
        assert!(matches!(err, PiError::Communication { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let err = PartialResult::decode(json!({"sum": "1.0"})).unwrap_err();
        assert!(matches!(err, PiError::Communication { .. }));
    }

    #[test]
    fn test_decode_rejects_negative_elapsed() {
        let err = PartialResult::decode(json!({"sum": "1.0", "elapsedSeconds": -2.0})).unwrap_err();
        assert!(err.to_string().contains("invalid elapsed time"));
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::SampleCount.to_string(), "sample count");
        assert_eq!(Field::IntervalHigh.to_string(), "interval high");
    }

    #[tokio::test]
    async fn test_work_request_sent_as_three_values() {
        let (mut coordinator, mut worker) = MemoryChannel::pair();
        let request = WorkRequest {
            sample_count: 250_000,
            interval_low: 0.0,
            interval_high: 1.0,
        };
        request.send(&mut coordinator).await.unwrap();

        assert_eq!(worker.recv().await.unwrap(), json!(250_000));
        assert_eq!(worker.recv().await.unwrap(), json!(0.0));
        assert_eq!(worker.recv().await.unwrap(), json!(1.0));
    }

    #[tokio::test]
    async fn test_recv_field_wrong_type() {
        let (mut coordinator, mut worker) = MemoryChannel::pair();
        coordinator.send(json!("not a number")).await.unwrap();
        let err = recv_field::<_, u64>(&mut worker, Field::SampleCount).await.unwrap_err();
        assert!(err.to_string().contains("decoding sample count"));
    }

    #[tokio::test]
    async fn test_recv_field_closed() {
        let (coordinator, mut worker) = MemoryChannel::pair();
        drop(coordinator);
        let err = recv_field::<_, f64>(&mut worker, Field::IntervalHigh).await.unwrap_err();
        assert!(err.to_string().contains("receiving interval high"));
        assert!(err.to_string().contains("channel closed"));
    }

    #[tokio::test]
    async fn test_partial_result_over_channel() {
        let (mut coordinator, mut worker) = MemoryChannel::pair();
        let result = PartialResult {
            sum: PreciseReal::parse("0.1000000000000000055511151231257827021181583404541015625")
                .unwrap(),
            elapsed_seconds: 0.002,
        };
        result.send(&mut worker).await.unwrap();
        assert_eq!(PartialResult::recv(&mut coordinator).await.unwrap(), result);
    }
}
