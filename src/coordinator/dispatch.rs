//! Starting workers and sending each its share of the work.

use super::partition::Partition;
use crate::error::PiResult;
use crate::substrate::TaskSubstrate;

/// Start `partition.workers()` workers from `image`, in order, sending each
/// the same request right after it starts.
///
/// Returns the handles in dispatch order.
///
/// # Errors
///
/// The first start or send failure aborts dispatch; workers already started
/// are dropped with the error.
pub async fn dispatch<S: TaskSubstrate>(
    substrate: &mut S,
    image: &str,
    partition: &Partition,
    interval_low: f64,
    interval_high: f64,
) -> PiResult<Vec<S::Handle>> {
    let request = partition.work_request(interval_low, interval_high);
    let mut handles = Vec::with_capacity(partition.workers());

    for index in 0..partition.workers() {
        let mut handle = substrate.start(image).await?;
        request.send(&mut handle).await?;
        tracing::debug!("dispatched {} samples to worker {index}", request.sample_count);
        handles.push(handle);
    }

    Ok(handles)
}
