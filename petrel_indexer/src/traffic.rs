use std::sync::atomic::{AtomicU64, Ordering};

/// Byte accounting for indexed records.
///
/// Output traffic and system traffic are accounted separately so operators
/// can tell user-submitted load apart from load the system generates for
/// itself. Calls are fire-and-forget.
pub trait TrafficAccounting: Send + Sync {
    fn add_output_traffic(&self, bytes: u64);

    fn add_system_traffic(&self, bytes: u64);
}

/// Traffic accounting backed by in-memory counters.
#[derive(Debug, Default)]
pub struct InMemoryTrafficAccounting {
    output: AtomicU64,
    system: AtomicU64,
}

impl InMemoryTrafficAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_traffic(&self) -> u64 {
        self.output.load(Ordering::Relaxed)
    }

    pub fn system_traffic(&self) -> u64 {
        self.system.load(Ordering::Relaxed)
    }
}

impl TrafficAccounting for InMemoryTrafficAccounting {
    fn add_output_traffic(&self, bytes: u64) {
        self.output.fetch_add(bytes, Ordering::Relaxed);
    }

    fn add_system_traffic(&self, bytes: u64) {
        self.system.fetch_add(bytes, Ordering::Relaxed);
    }
}
