//! This module contains the types moved through the pipeline.
//!
//! ## Data flow
//!
//! **Output buffer**: [`PendingWrite`] sequence -> batch.
//!
//! **Chunked bulk indexer**: batch -> chunks -> [`WriteResultSet`].
//!
//! **Retry engine**: [`WriteResultSet`] -> [`WriteResultSet`] with a
//! terminal outcome for every record.
use std::fmt;
use std::time::SystemTime;

use bytesize::ByteSize;
use serde_json::{json, Value};

/// Identifier of a single record, unique within its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

/// Name of a destination index on the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexName(String);

/// A single event record.
///
/// Immutable once created: the pipeline consumes it exactly once and
/// discards it after a terminal outcome.
#[derive(Clone)]
pub struct Record {
    id: RecordId,
    document: Value,
    size: u64,
    receive_time: SystemTime,
}

/// A record together with the index it should be written to.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    /// The destination index.
    pub destination: IndexName,
    /// The record.
    pub record: Record,
}

/// Classification of a per-record indexing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The document shape is permanently incompatible with the destination
    /// schema. Never retried.
    MappingError,
    /// The destination currently rejects writes (e.g. read-only due to a
    /// protective block). Retried until the classification changes.
    Blocked,
    /// Anything else. Not retried.
    Unknown,
}

/// A record that was written.
#[derive(Debug, Clone)]
pub struct WriteSuccess {
    /// The record.
    pub record: Record,
    /// The index the record was written to.
    pub index: IndexName,
}

/// A record that was not written.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    /// The record.
    pub record: Record,
    /// The destination the write was addressed to.
    pub destination: IndexName,
    /// The failure classification.
    pub kind: FailureKind,
    /// The backend's reason, forwarded for diagnostics.
    pub reason: String,
}

/// Accumulated per-record outcomes of a bulk write.
///
/// Every submitted record appears in exactly one of `successes` and
/// `failures`.
#[derive(Debug, Clone, Default)]
pub struct WriteResultSet {
    /// The records that were written.
    pub successes: Vec<WriteSuccess>,
    /// The records that terminally failed.
    pub failures: Vec<WriteFailure>,
}

/// Whether a batch counts as user-submitted output traffic or
/// system-internal traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficClass {
    /// User-submitted records.
    Output,
    /// Records generated by the system itself.
    System,
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl IndexName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Record {
    /// Creates a record with the given byte-size estimate.
    ///
    /// The receive time defaults to now; sources that know better use
    /// [`Record::with_receive_time`].
    pub fn new(id: RecordId, document: Value, size: u64) -> Self {
        Self {
            id,
            document,
            size,
            receive_time: SystemTime::now(),
        }
    }

    pub fn with_receive_time(mut self, receive_time: SystemTime) -> Self {
        self.receive_time = receive_time;
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Byte-size estimate of the record, fixed at creation.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn receive_time(&self) -> SystemTime {
        self.receive_time
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("size", &format!("<{}>", ByteSize(self.size)))
            .finish()
    }
}

impl PendingWrite {
    pub fn new(destination: IndexName, record: Record) -> Self {
        Self {
            destination,
            record,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            FailureKind::MappingError => "mapping_error",
            FailureKind::Blocked => "index_blocked",
            FailureKind::Unknown => "unknown",
        };
        f.write_str(kind)
    }
}

impl WriteFailure {
    /// Rebuilds the pending write this failure came from, for resubmission.
    pub fn to_pending_write(&self) -> PendingWrite {
        PendingWrite {
            destination: self.destination.clone(),
            record: self.record.clone(),
        }
    }

    /// The document queued for the dead-letter consumer.
    pub fn to_failure_document(&self) -> Value {
        let timestamp = self
            .record
            .receive_time()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        json!({
            "letter_id": self.record.id().as_str(),
            "index": self.destination.as_str(),
            "type": self.kind.to_string(),
            "message": self.reason,
            "timestamp": timestamp,
        })
    }
}

impl WriteResultSet {
    pub fn push_success(&mut self, success: WriteSuccess) {
        self.successes.push(success);
    }

    pub fn push_failure(&mut self, failure: WriteFailure) {
        self.failures.push(failure);
    }

    /// Merges another result set into this one.
    pub fn extend(&mut self, other: WriteResultSet) {
        self.successes.extend(other.successes);
        self.failures.extend(other.failures);
    }

    /// Total number of records covered by this result set.
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}
