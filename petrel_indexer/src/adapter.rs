use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PendingWrite, WriteResultSet};

/// Bulk submission of a single chunk to the storage backend.
///
/// Implementations return the per-record outcomes, or fail with
/// [`IndexerError::CircuitBreaker`](crate::error::IndexerError) when the
/// backend rejected the whole chunk and with
/// [`IndexerError::Transport`](crate::error::IndexerError) when the call
/// itself failed.
#[async_trait]
pub trait ChunkWriter: Send + Sync {
    async fn write_chunk(&self, chunk: &[PendingWrite]) -> Result<WriteResultSet>;
}

/// Structured bulk write with per-record results.
///
/// A successful call covers every submitted write in exactly one of the
/// result set's successes and failures. An `Err` means the call failed as a
/// whole and nothing can be said per record.
#[async_trait]
pub trait BulkWriteAdapter: Send + Sync {
    async fn bulk_index(&self, writes: &[PendingWrite]) -> Result<WriteResultSet>;
}
