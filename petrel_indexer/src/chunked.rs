use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::adapter::{BulkWriteAdapter, ChunkWriter};
use crate::error::{IndexerError, Result};
use crate::partitioner::DynamicBatchPartitioner;
use crate::types::{PendingWrite, WriteResultSet};

/// Wait between attempts once the chunk size cannot shrink any further.
const MIN_CHUNK_RETRY_WAIT: Duration = Duration::from_secs(1);

/// Drives a batch through a [`ChunkWriter`] in adaptively sized chunks.
///
/// The first attempt submits the whole batch in one chunk. A circuit-breaker
/// rejection halves the chunk size (minimum 1) and resubmits the same
/// records; once shrunk, the size stays shrunk for the remainder of the
/// call. Rejections are retried without bound; callers that need a
/// deadline impose their own cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkedBulkIndexer;

impl ChunkedBulkIndexer {
    /// Writes all of `requests` and returns the accumulated per-record
    /// outcomes. Transport errors abort the call and are left to the retry
    /// engine.
    pub async fn index(
        &self,
        requests: &[PendingWrite],
        writer: &dyn ChunkWriter,
    ) -> Result<WriteResultSet> {
        let mut results = WriteResultSet::default();
        if requests.is_empty() {
            return Ok(results);
        }

        let mut partitioner = DynamicBatchPartitioner::new(requests);
        let mut chunk_size = requests.len();

        while partitioner.has_next() {
            let chunk = partitioner.peek(chunk_size)?;

            match writer.write_chunk(chunk).await {
                Ok(chunk_results) => {
                    results.extend(chunk_results);
                    partitioner.next_partition(chunk_size)?;
                }
                Err(IndexerError::CircuitBreaker { size }) => {
                    warn!(
                        payload = %size,
                        chunk_size,
                        "bulk request rejected by the backend circuit breaker"
                    );
                    if chunk_size == requests.len() {
                        warn!("the configured output batch size may be too large for the backend");
                    }

                    if chunk_size > 1 {
                        chunk_size /= 2;
                    } else {
                        tokio::time::sleep(MIN_CHUNK_RETRY_WAIT).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Ok(results)
    }
}

/// Exposes a [`ChunkWriter`] as a [`BulkWriteAdapter`] by running every
/// bulk write through the chunked indexer. This is how a backend adapter
/// plugs its raw bulk endpoint into the retry engine.
pub struct ChunkedBulkWriteAdapter {
    writer: Arc<dyn ChunkWriter>,
    indexer: ChunkedBulkIndexer,
}

impl ChunkedBulkWriteAdapter {
    pub fn new(writer: Arc<dyn ChunkWriter>) -> Self {
        Self {
            writer,
            indexer: ChunkedBulkIndexer,
        }
    }
}

#[async_trait]
impl BulkWriteAdapter for ChunkedBulkWriteAdapter {
    async fn bulk_index(&self, writes: &[PendingWrite]) -> Result<WriteResultSet> {
        self.indexer.index(writes, self.writer.as_ref()).await
    }
}
