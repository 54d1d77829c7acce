//! Adapter-side binding metrics.

use std::sync::atomic::{AtomicI64, Ordering};

/// Metrics published by the adapter's binding manager.
///
/// `drain_bindings` is a gauge: at every quiescent point its value equals
/// the cardinality of the active binding set.
#[derive(Debug, Default)]
pub struct BindingMetrics {
    /// Number of currently active drain bindings
    pub drain_bindings: AtomicI64,
}

impl BindingMetrics {
    /// Create new metrics with the gauge at zero
    pub const fn new() -> Self {
        Self {
            drain_bindings: AtomicI64::new(0),
        }
    }

    /// Record a binding accepted by the manager
    #[inline]
    pub fn incr_drain_bindings(&self) {
        self.drain_bindings.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a binding removed from the manager
    #[inline]
    pub fn decr_drain_bindings(&self) {
        self.drain_bindings.fetch_sub(1, Ordering::Relaxed);
    }

    /// Current gauge value
    #[inline]
    pub fn drain_bindings(&self) -> i64 {
        self.drain_bindings.load(Ordering::Relaxed)
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> BindingMetricsSnapshot {
        BindingMetricsSnapshot {
            drain_bindings: self.drain_bindings.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of binding metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct BindingMetricsSnapshot {
    pub drain_bindings: i64,
}

/// Trait for the binding manager to expose its gauge to reporting code.
pub trait BindingMetricsProvider: Send + Sync {
    /// Get a snapshot of current metrics
    fn snapshot(&self) -> BindingMetricsSnapshot;
}

impl BindingMetricsProvider for BindingMetrics {
    fn snapshot(&self) -> BindingMetricsSnapshot {
        BindingMetrics::snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_tracks_incr_and_decr() {
        let metrics = BindingMetrics::new();

        metrics.incr_drain_bindings();
        metrics.incr_drain_bindings();
        assert_eq!(metrics.drain_bindings(), 2);

        metrics.decr_drain_bindings();
        assert_eq!(metrics.drain_bindings(), 1);
        assert_eq!(metrics.snapshot().drain_bindings, 1);
    }
}
