#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytesize::ByteSize;
use petrel_indexer::adapter::{BulkWriteAdapter, ChunkWriter};
use petrel_indexer::error::{CircuitBreakerSnafu, Result, TransportSnafu};
use petrel_indexer::types::{
    FailureKind, IndexName, PendingWrite, Record, RecordId, WriteFailure, WriteResultSet,
    WriteSuccess,
};
use serde_json::json;

pub fn record(id: &str, size: u64) -> Record {
    Record::new(RecordId::new(id), json!({ "message": id }), size)
}

pub fn pending_write(id: &str) -> PendingWrite {
    pending_write_sized(id, 64)
}

pub fn pending_write_sized(id: &str, size: u64) -> PendingWrite {
    PendingWrite::new(IndexName::new("events_0"), record(id, size))
}

pub fn ids(writes: &[PendingWrite]) -> Vec<String> {
    writes.iter().map(|w| w.record.id().to_string()).collect()
}

pub fn success_ids(results: &WriteResultSet) -> Vec<String> {
    results
        .successes
        .iter()
        .map(|s| s.record.id().to_string())
        .collect()
}

pub fn failure_ids(results: &WriteResultSet) -> Vec<String> {
    results
        .failures
        .iter()
        .map(|f| f.record.id().to_string())
        .collect()
}

/// Result set accepting every write.
pub fn accept_all(writes: &[PendingWrite]) -> WriteResultSet {
    accept_except(writes, &[])
}

/// Result set failing the listed ids with the given kind and accepting the
/// rest.
pub fn accept_except(writes: &[PendingWrite], failing: &[(&str, FailureKind)]) -> WriteResultSet {
    let mut results = WriteResultSet::default();
    for write in writes {
        match failing
            .iter()
            .find(|(id, _)| write.record.id().as_str() == *id)
        {
            Some((_, kind)) => results.push_failure(WriteFailure {
                record: write.record.clone(),
                destination: write.destination.clone(),
                kind: *kind,
                reason: format!("injected {kind} failure"),
            }),
            None => results.push_success(WriteSuccess {
                record: write.record.clone(),
                index: write.destination.clone(),
            }),
        }
    }
    results
}

type BulkStep = Box<dyn Fn(&[PendingWrite]) -> Result<WriteResultSet> + Send + Sync>;

/// Bulk-write adapter driven by a scripted sequence of responses. Panics
/// when called more often than the script allows.
#[derive(Default)]
pub struct ScriptedAdapter {
    steps: Mutex<VecDeque<BulkStep>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push<F>(&self, step: F)
    where
        F: Fn(&[PendingWrite]) -> Result<WriteResultSet> + Send + Sync + 'static,
    {
        self.steps.lock().unwrap().push_back(Box::new(step));
    }

    pub fn push_accept_all(&self) {
        self.push(|writes| Ok(accept_all(writes)));
    }

    pub fn push_transport_error(&self, message: &'static str) {
        self.push(move |_| TransportSnafu { message }.fail());
    }

    /// The ids submitted on each call, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkWriteAdapter for ScriptedAdapter {
    async fn bulk_index(&self, writes: &[PendingWrite]) -> Result<WriteResultSet> {
        self.calls.lock().unwrap().push(ids(writes));
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("bulk_index called more often than the test script allows");
        step(writes)
    }
}

/// Chunk writer rejecting any chunk larger than `max_chunk_len` with a
/// circuit-breaker failure.
pub struct SizeLimitedChunkWriter {
    max_chunk_len: usize,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl SizeLimitedChunkWriter {
    pub fn new(max_chunk_len: usize) -> Arc<Self> {
        Arc::new(Self {
            max_chunk_len,
            chunk_sizes: Mutex::new(Vec::new()),
        })
    }

    /// The length of each submitted chunk, in call order.
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChunkWriter for SizeLimitedChunkWriter {
    async fn write_chunk(&self, chunk: &[PendingWrite]) -> Result<WriteResultSet> {
        self.chunk_sizes.lock().unwrap().push(chunk.len());

        if chunk.len() > self.max_chunk_len {
            let payload: u64 = chunk.iter().map(|w| w.record.size()).sum();
            return CircuitBreakerSnafu {
                size: ByteSize(payload),
            }
            .fail();
        }

        Ok(accept_all(chunk))
    }
}

/// Chunk writer driven by a scripted sequence of responses.
#[derive(Default)]
pub struct ScriptedChunkWriter {
    steps: Mutex<VecDeque<BulkStep>>,
    chunk_sizes: Mutex<Vec<usize>>,
}

impl ScriptedChunkWriter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push<F>(&self, step: F)
    where
        F: Fn(&[PendingWrite]) -> Result<WriteResultSet> + Send + Sync + 'static,
    {
        self.steps.lock().unwrap().push_back(Box::new(step));
    }

    pub fn push_circuit_breaker(&self) {
        self.push(|chunk| {
            let payload: u64 = chunk.iter().map(|w| w.record.size()).sum();
            CircuitBreakerSnafu {
                size: ByteSize(payload),
            }
            .fail()
        });
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChunkWriter for ScriptedChunkWriter {
    async fn write_chunk(&self, chunk: &[PendingWrite]) -> Result<WriteResultSet> {
        self.chunk_sizes.lock().unwrap().push(chunk.len());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("write_chunk called more often than the test script allows");
        step(chunk)
    }
}
