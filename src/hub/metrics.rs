use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the broadcast hub
#[derive(Default)]
pub(crate) struct HubMetrics {
    joined_total: AtomicU64,
    events_published: AtomicU64,
    deliveries: AtomicU64,
    evictions: AtomicU64,
}

impl HubMetrics {
    pub fn record_join(&self) {
        self.joined_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one published event and how many observers it reached
    pub fn record_publish(&self, delivered: usize) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, observers: usize) -> HubStats {
        HubStats {
            observers,
            joined_total: self.joined_total.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time hub statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubStats {
    /// Currently registered observers
    pub observers: usize,
    /// Observers registered since startup
    pub joined_total: u64,
    pub events_published: u64,
    /// Sum over events of observers reached
    pub deliveries: u64,
    /// Observers removed because delivery failed
    pub evictions: u64,
}
