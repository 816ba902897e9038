use std::time::SystemTime;

/// Receives the receive time of every successfully indexed record, so the
/// processing-status subsystem can report how far indexing has caught up.
pub trait ProcessingStatusTracker: Send + Sync {
    fn update_post_indexing_receive_time(&self, receive_time: SystemTime);
}

/// Tracker that ignores updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProcessingStatusTracker;

impl ProcessingStatusTracker for NoopProcessingStatusTracker {
    fn update_post_indexing_receive_time(&self, _receive_time: SystemTime) {}
}
