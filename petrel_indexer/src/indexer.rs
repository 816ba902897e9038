use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::adapter::BulkWriteAdapter;
use crate::backoff::ExponentialBackoff;
use crate::failures::IndexFailureQueue;
use crate::status::ProcessingStatusTracker;
use crate::traffic::TrafficAccounting;
use crate::types::{FailureKind, PendingWrite, TrafficClass, WriteFailure, WriteResultSet};

/// Callbacks observing the transport-level retry loop.
pub trait IndexingListener: Send + Sync {
    fn on_retry(&self, attempt: u32);

    fn on_success(&self, delay_since_first_attempt: Duration);
}

/// Drives every submitted record to a terminal outcome.
///
/// Two retry levels sit on top of the bulk-write adapter. Transport
/// failures resubmit the unchanged input without bound, since a network
/// blip must not become a permanent failure. Per-record failures are
/// classified: blocked destinations are retried in isolation with
/// exponential backoff, while mapping errors and unclassified failures are
/// terminal and surface in the returned result set. A blocked record that
/// fails again with a different classification is terminal immediately;
/// only a repeated blocked classification keeps it in the loop.
pub struct RecordIndexer {
    adapter: Arc<dyn BulkWriteAdapter>,
    traffic: Arc<dyn TrafficAccounting>,
    status: Arc<dyn ProcessingStatusTracker>,
    failure_queue: IndexFailureQueue,
    transport_backoff: ExponentialBackoff,
    block_backoff: ExponentialBackoff,
    listener: Option<Arc<dyn IndexingListener>>,
}

impl RecordIndexer {
    pub fn new(
        adapter: Arc<dyn BulkWriteAdapter>,
        traffic: Arc<dyn TrafficAccounting>,
        status: Arc<dyn ProcessingStatusTracker>,
        failure_queue: IndexFailureQueue,
    ) -> Self {
        Self {
            adapter,
            traffic,
            status,
            failure_queue,
            transport_backoff: ExponentialBackoff::milliseconds(),
            block_backoff: ExponentialBackoff::seconds(),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn IndexingListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_transport_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.transport_backoff = backoff;
        self
    }

    pub fn with_block_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.block_backoff = backoff;
        self
    }

    /// Writes `writes` and returns a result set with a terminal outcome for
    /// every record. Does not return until one is reached.
    pub async fn bulk_index(
        &self,
        writes: Vec<PendingWrite>,
        traffic_class: TrafficClass,
    ) -> WriteResultSet {
        if writes.is_empty() {
            return WriteResultSet::default();
        }

        let first_pass = self.run_bulk_request(&writes).await;
        let results = self.retry_blocked_writes(first_pass).await;

        self.account_record_sizes(&results, traffic_class);
        self.record_post_indexing_times(&results);
        self.publish_failures(&results);

        results
    }

    /// Submits `writes` until the adapter produces a structured result,
    /// retrying transport failures indefinitely.
    async fn run_bulk_request(&self, writes: &[PendingWrite]) -> WriteResultSet {
        let first_attempt_at = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            match self.adapter.bulk_index(writes).await {
                Ok(results) => {
                    if attempt > 0 {
                        info!(attempt = attempt + 1, "bulk write finally successful");
                        if let Some(listener) = &self.listener {
                            listener.on_success(first_attempt_at.elapsed());
                        }
                    }
                    return results;
                }
                Err(err) => {
                    attempt += 1;
                    error!(
                        %err,
                        attempt,
                        count = writes.len(),
                        "bulk write failed, retrying"
                    );
                    if let Some(listener) = &self.listener {
                        listener.on_retry(attempt);
                    }
                    sleep(self.transport_backoff.wait_for(attempt)).await;
                }
            }
        }
    }

    /// Resubmits blocked records until each reaches a terminal outcome.
    async fn retry_blocked_writes(&self, first_pass: WriteResultSet) -> WriteResultSet {
        let WriteResultSet {
            mut successes,
            failures,
        } = first_pass;
        let (mut blocked, mut terminal) = split_blocked(failures);

        if !blocked.is_empty() {
            warn!(
                count = blocked.len(),
                "retrying records because their destination indices are blocked for writes"
            );
        }

        let mut attempt: u32 = 1;
        while !blocked.is_empty() {
            sleep(self.block_backoff.wait_for(attempt)).await;
            attempt += 1;

            let retry_writes: Vec<PendingWrite> =
                blocked.iter().map(WriteFailure::to_pending_write).collect();
            let retry_results = self.run_bulk_request(&retry_writes).await;

            successes.extend(retry_results.successes);
            let (still_blocked, newly_terminal) = split_blocked(retry_results.failures);
            terminal.extend(newly_terminal);
            blocked = still_blocked;

            if blocked.is_empty() {
                info!(
                    attempts = attempt,
                    "blocked records were indexed after retrying, ingestion continues"
                );
            }
        }

        WriteResultSet {
            successes,
            failures: terminal,
        }
    }

    fn account_record_sizes(&self, results: &WriteResultSet, traffic_class: TrafficClass) {
        if results.successes.is_empty() {
            return;
        }

        let total: u64 = results.successes.iter().map(|s| s.record.size()).sum();
        match traffic_class {
            TrafficClass::Output => self.traffic.add_output_traffic(total),
            TrafficClass::System => self.traffic.add_system_traffic(total),
        }
    }

    fn record_post_indexing_times(&self, results: &WriteResultSet) {
        for success in &results.successes {
            self.status
                .update_post_indexing_receive_time(success.record.receive_time());
        }
    }

    fn publish_failures(&self, results: &WriteResultSet) {
        if results.failures.is_empty() {
            return;
        }

        let documents = results
            .failures
            .iter()
            .map(WriteFailure::to_failure_document)
            .collect();
        self.failure_queue.publish(documents);
    }
}

fn split_blocked(failures: Vec<WriteFailure>) -> (Vec<WriteFailure>, Vec<WriteFailure>) {
    failures
        .into_iter()
        .partition(|failure| failure.kind == FailureKind::Blocked)
}
