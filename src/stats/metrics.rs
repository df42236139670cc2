//! Statistics for the decode worker

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the decode worker
///
/// Shared between the worker thread and the owning source.
#[derive(Debug, Default)]
pub struct WorkerStats {
    frames_decoded: AtomicU64,
    frames_dispatched: AtomicU64,
    deliveries: AtomicU64,
    skipped_kind: AtomicU64,
    skipped_no_pts: AtomicU64,
    skipped_negative_pts: AtomicU64,
    pruned_subscribers: AtomicU64,
}

impl WorkerStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_decoded(&self) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatch(&self, deliveries: u64) {
        self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(deliveries, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_kind(&self) {
        self.skipped_kind.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_no_pts(&self) {
        self.skipped_no_pts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_negative_pts(&self) {
        self.skipped_negative_pts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pruned(&self) {
        self.pruned_subscribers.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            frames_dispatched: self.frames_dispatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            skipped_kind: self.skipped_kind.load(Ordering::Relaxed),
            skipped_no_pts: self.skipped_no_pts.load(Ordering::Relaxed),
            skipped_negative_pts: self.skipped_negative_pts.load(Ordering::Relaxed),
            pruned_subscribers: self.pruned_subscribers.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time worker statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    /// Frames returned by the container, of any kind
    pub frames_decoded: u64,
    /// Frames that passed normalization and were offered to subscribers
    pub frames_dispatched: u64,
    /// Total frame copies enqueued across all subscribers
    pub deliveries: u64,
    /// Frames discarded for not being the handled media kind
    pub skipped_kind: u64,
    /// Frames discarded for having no timestamp
    pub skipped_no_pts: u64,
    /// Frames discarded for preceding the timestamp offset
    pub skipped_negative_pts: u64,
    /// Subscribers removed because their track was dropped
    pub pruned_subscribers: u64,
}

impl WorkerStatsSnapshot {
    /// Total frames discarded before dispatch
    pub fn skipped(&self) -> u64 {
        self.skipped_kind + self.skipped_no_pts + self.skipped_negative_pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = WorkerStats::new();
        assert_eq!(stats.snapshot(), WorkerStatsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let stats = WorkerStats::new();

        stats.record_decoded();
        stats.record_decoded();
        stats.record_decoded();
        stats.record_dispatch(2);
        stats.record_skipped_no_pts();
        stats.record_skipped_kind();
        stats.record_pruned();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_decoded, 3);
        assert_eq!(snapshot.frames_dispatched, 1);
        assert_eq!(snapshot.deliveries, 2);
        assert_eq!(snapshot.skipped(), 2);
        assert_eq!(snapshot.pruned_subscribers, 1);
    }
}
