use std::sync::Arc;
use std::time::Duration;

use petrel_indexer::indexer::RecordIndexer;
use petrel_indexer::types::{PendingWrite, TrafficClass};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::buffer::OutputBuffer;
use crate::config::BatchSizeConfig;

/// Batched front door to the record indexer.
///
/// Writes accumulate in an [`OutputBuffer`]; a full batch is indexed inline
/// on the producer's call, so backend slowness propagates back to the
/// producer as backpressure instead of piling up in a queue.
pub struct BatchedOutput {
    buffer: OutputBuffer,
    indexer: Arc<RecordIndexer>,
}

impl BatchedOutput {
    pub fn new(threshold: BatchSizeConfig, indexer: Arc<RecordIndexer>) -> Self {
        Self {
            buffer: OutputBuffer::new(threshold),
            indexer,
        }
    }

    /// Appends one write, indexing the accumulated batch when it is due.
    pub async fn write(&self, write: PendingWrite) {
        self.buffer
            .append_and_flush(write, |batch| self.index_batch(batch))
            .await;
    }

    /// Indexes whatever is currently buffered.
    pub async fn flush(&self) {
        self.buffer.flush(|batch| self.index_batch(batch)).await;
    }

    pub async fn should_flush(&self, max_age: Duration) -> bool {
        self.buffer.should_flush(max_age).await
    }

    async fn index_batch(&self, batch: Vec<PendingWrite>) {
        // forced flushes may deliver an empty batch
        if batch.is_empty() {
            return;
        }

        let count = batch.len();
        let started_at = tokio::time::Instant::now();
        let results = self.indexer.bulk_index(batch, TrafficClass::Output).await;

        if !results.failures.is_empty() {
            warn!(
                failed = results.failures.len(),
                total = count,
                "batch finished with terminal failures"
            );
        }
        debug!(count, elapsed = ?started_at.elapsed(), "wrote batch");
    }
}

/// Periodically flushes `output` once its buffered records grow older than
/// `max_age`, so a slow trickle of records still gets written. Runs until
/// the token is cancelled.
pub async fn run_flush_scheduler(
    output: Arc<BatchedOutput>,
    poll_interval: Duration,
    max_age: Duration,
    ct: CancellationToken,
) {
    let mut timer = tokio::time::interval(poll_interval);
    // an inline flush can outlast the interval; don't burst afterwards
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ct.cancelled() => break,
            _ = timer.tick() => {
                if output.should_flush(max_age).await {
                    output.flush().await;
                }
            }
        }
    }
}
