//! Drainline metrics
//!
//! Metric structs for the two control-plane cores. Both cores take their
//! metrics as an explicit `Arc` dependency; there is no global registry.
//!
//! # Design
//!
//! - All fields are atomics, so updates are lock-free
//! - `snapshot()` returns a plain serializable copy for health endpoints
//! - Provider traits let reporting code collect without concrete types

mod binding;
mod scheduler;

pub use binding::{BindingMetrics, BindingMetricsProvider, BindingMetricsSnapshot};
pub use scheduler::{SchedulerMetrics, SchedulerMetricsProvider, SchedulerMetricsSnapshot};
