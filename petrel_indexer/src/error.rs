use bytesize::ByteSize;
use snafu::Snafu;

/// Pipeline error types.
///
/// Per-record indexing failures are not errors: they travel in
/// [`WriteResultSet::failures`](crate::types::WriteResultSet) so that a
/// partially failed batch still returns normally and callers inspect the
/// result set.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum IndexerError {
    /// A partition was requested with a size of zero.
    #[snafu(display("partition size must be greater than zero"))]
    InvalidPartitionSize,
    /// The backend rejected an entire bulk request as too expensive to
    /// process right now.
    #[snafu(display("bulk request rejected by the backend circuit breaker (payload of {size})"))]
    CircuitBreaker { size: ByteSize },
    /// The bulk call itself failed before the backend produced any
    /// per-record result.
    #[snafu(display("transport error during bulk request: {message}"))]
    Transport { message: String },
}

pub type Result<T, E = IndexerError> = std::result::Result<T, E>;
