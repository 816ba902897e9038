pub mod adapter;
pub mod backoff;
pub mod chunked;
pub mod error;
pub mod failures;
pub mod indexer;
pub mod partitioner;
pub mod status;
pub mod traffic;
pub mod types;

pub use adapter::{BulkWriteAdapter, ChunkWriter};
pub use chunked::{ChunkedBulkIndexer, ChunkedBulkWriteAdapter};
pub use error::{IndexerError, Result};
pub use indexer::{IndexingListener, RecordIndexer};
pub use types::{PendingWrite, Record, TrafficClass, WriteResultSet};
