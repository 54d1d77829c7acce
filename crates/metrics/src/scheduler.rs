//! Scheduler-side metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics published by the scheduler loop and adapter service.
///
/// Counters accumulate over the process lifetime; `desired_drains` and
/// `adapter_count` are gauges refreshed by the scheduler.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    /// Completed reconcile ticks
    pub ticks: AtomicU64,
    /// Ticks skipped because the registry fetch failed
    pub fetch_failures: AtomicU64,
    /// Ticks skipped because every adapter failed to list
    pub list_failures: AtomicU64,
    /// CreateBinding calls issued
    pub creates_issued: AtomicU64,
    /// DeleteBinding calls issued
    pub deletes_issued: AtomicU64,
    /// Drain triples in the last filtered desired set
    pub desired_drains: AtomicU64,
    /// Size of the adapter pool
    pub adapter_count: AtomicU64,
}

impl SchedulerMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            list_failures: AtomicU64::new(0),
            creates_issued: AtomicU64::new(0),
            deletes_issued: AtomicU64::new(0),
            desired_drains: AtomicU64::new(0),
            adapter_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_list_failure(&self) {
        self.list_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_create_issued(&self) {
        self.creates_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete_issued(&self) {
        self.deletes_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_desired_drains(&self, count: u64) {
        self.desired_drains.store(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_adapter_count(&self, count: u64) {
        self.adapter_count.store(count, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            list_failures: self.list_failures.load(Ordering::Relaxed),
            creates_issued: self.creates_issued.load(Ordering::Relaxed),
            deletes_issued: self.deletes_issued.load(Ordering::Relaxed),
            desired_drains: self.desired_drains.load(Ordering::Relaxed),
            adapter_count: self.adapter_count.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of scheduler metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SchedulerMetricsSnapshot {
    pub ticks: u64,
    pub fetch_failures: u64,
    pub list_failures: u64,
    pub creates_issued: u64,
    pub deletes_issued: u64,
    pub desired_drains: u64,
    pub adapter_count: u64,
}

/// Trait for the scheduler to expose its counters to reporting code.
pub trait SchedulerMetricsProvider: Send + Sync {
    /// Get a snapshot of current metrics
    fn snapshot(&self) -> SchedulerMetricsSnapshot;
}

impl SchedulerMetricsProvider for SchedulerMetrics {
    fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetrics::snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = SchedulerMetrics::new();

        metrics.record_tick();
        metrics.record_create_issued();
        metrics.record_create_issued();
        metrics.record_delete_issued();
        metrics.set_desired_drains(7);
        metrics.set_adapter_count(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.creates_issued, 2);
        assert_eq!(snapshot.deletes_issued, 1);
        assert_eq!(snapshot.desired_drains, 7);
        assert_eq!(snapshot.adapter_count, 3);
    }

    #[test]
    fn test_gauges_overwrite() {
        let metrics = SchedulerMetrics::new();

        metrics.set_desired_drains(7);
        metrics.set_desired_drains(2);

        assert_eq!(metrics.snapshot().desired_drains, 2);
    }
}
