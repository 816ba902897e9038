use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

const DEFAULT_CAPACITY: usize = 1000;

/// Bounded hand-off of failure documents to the dead-letter consumer.
///
/// Publishing never blocks the indexing path: when the consumer falls
/// behind, the batch is dropped with a warning.
#[derive(Debug, Clone)]
pub struct IndexFailureQueue {
    tx: mpsc::Sender<Vec<Value>>,
}

impl IndexFailureQueue {
    /// Creates a queue holding up to `capacity` failure batches, returning
    /// the receiving end for the consumer.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Vec<Value>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn with_default_capacity() -> (Self, mpsc::Receiver<Vec<Value>>) {
        Self::bounded(DEFAULT_CAPACITY)
    }

    /// Offers a batch of failure documents to the consumer.
    pub fn publish(&self, failures: Vec<Value>) {
        if failures.is_empty() {
            return;
        }

        match self.tx.try_send(failures) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(batch)) => {
                warn!(
                    count = batch.len(),
                    "index failure queue is full, dropping failure batch"
                );
            }
            Err(mpsc::error::TrySendError::Closed(batch)) => {
                warn!(
                    count = batch.len(),
                    "index failure queue consumer is gone, dropping failure batch"
                );
            }
        }
    }
}
