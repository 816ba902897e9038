use std::future::Future;
use std::time::Duration;

use petrel_indexer::types::PendingWrite;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::BatchSizeConfig;

/// Accumulates pending writes for one destination until a batch is due.
///
/// The buffer performs no I/O of its own: when the configured threshold is
/// reached the accumulated batch is swapped out under the lock and handed
/// to the caller's flush function outside of it, so the lock is only ever
/// held across the swap. Time-based flushing is the caller's concern; the
/// buffer only answers [`OutputBuffer::should_flush`].
///
/// One buffer instance per destination, passed explicitly to its producer.
pub struct OutputBuffer {
    threshold: BatchSizeConfig,
    state: Mutex<BufferState>,
}

struct BufferState {
    writes: Vec<PendingWrite>,
    buffered_bytes: u64,
    last_flush: Option<Instant>,
}

impl BufferState {
    fn swap(&mut self) -> Vec<PendingWrite> {
        self.buffered_bytes = 0;
        self.last_flush = Some(Instant::now());
        std::mem::take(&mut self.writes)
    }
}

impl OutputBuffer {
    pub fn new(threshold: BatchSizeConfig) -> Self {
        Self {
            threshold,
            state: Mutex::new(BufferState {
                writes: Vec::new(),
                buffered_bytes: 0,
                last_flush: None,
            }),
        }
    }

    /// Appends one write; hands the accumulated batch to `flush_fn` when
    /// the threshold is reached.
    pub async fn append_and_flush<F, Fut>(&self, write: PendingWrite, flush_fn: F)
    where
        F: FnOnce(Vec<PendingWrite>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let batch = {
            let mut state = self.state.lock().await;
            state.buffered_bytes += write.record.size();
            state.writes.push(write);

            if self
                .threshold
                .threshold_reached(state.writes.len(), state.buffered_bytes)
            {
                Some(state.swap())
            } else {
                None
            }
        };

        if let Some(batch) = batch {
            flush_fn(batch).await;
        }
    }

    /// Hands whatever is currently accumulated to `flush_fn`, which may be
    /// an empty batch.
    pub async fn flush<F, Fut>(&self, flush_fn: F)
    where
        F: FnOnce(Vec<PendingWrite>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let batch = {
            let mut state = self.state.lock().await;
            state.swap()
        };

        flush_fn(batch).await;
    }

    /// Whether the time elapsed since the last flush exceeds `max_age`.
    /// False until the first flush has happened.
    pub async fn should_flush(&self, max_age: Duration) -> bool {
        let state = self.state.lock().await;
        match state.last_flush {
            Some(last_flush) => last_flush.elapsed() > max_age,
            None => false,
        }
    }
}
