//! Binding manager
//!
//! The adapter's source of truth for which bindings it serves. Each accepted
//! binding owns one running subscription; the manager holds only the stop
//! handle the subscriber returned, so the subscriber never references the
//! manager back.
//!
//! All three operations are safe under concurrent invocation; mutations
//! serialize on one async mutex and the `drain_bindings` gauge always equals
//! the set cardinality at quiescence.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use drain_metrics::BindingMetrics;
use drain_protocol::Binding;

/// Stop handle for one running subscription.
///
/// `stop` cancels the subscription's task and returns only after it has
/// released its ingress slot and closed its egress socket.
pub struct Subscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { token, task }
    }

    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}

/// Capability that turns an accepted binding into a running subscription.
pub trait Subscriber: Send + Sync {
    fn start(&self, binding: &Binding) -> Subscription;
}

/// The set of active bindings, each paired with its subscription.
pub struct BindingManager {
    subscriber: Arc<dyn Subscriber>,
    metrics: Arc<BindingMetrics>,
    subscriptions: Mutex<HashMap<Binding, Subscription>>,
}

impl BindingManager {
    pub fn new(subscriber: Arc<dyn Subscriber>, metrics: Arc<BindingMetrics>) -> Self {
        Self {
            subscriber,
            metrics,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Accept a binding. A structural duplicate is a no-op; a new binding
    /// starts its subscription and bumps the gauge.
    pub async fn add(&self, binding: Binding) {
        let mut subscriptions = self.subscriptions.lock().await;
        if subscriptions.contains_key(&binding) {
            debug!(app_id = %binding.app_id, drain = %binding.drain, "binding already active");
            return;
        }

        info!(app_id = %binding.app_id, drain = %binding.drain, "binding added");
        let subscription = self.subscriber.start(&binding);
        subscriptions.insert(binding, subscription);
        self.metrics.incr_drain_bindings();
    }

    /// Remove a binding, stopping its subscription. Absent bindings are a
    /// no-op and never touch the gauge.
    pub async fn delete(&self, binding: &Binding) {
        let mut subscriptions = self.subscriptions.lock().await;
        let Some(subscription) = subscriptions.remove(binding) else {
            return;
        };

        subscription.stop().await;
        self.metrics.decr_drain_bindings();
        info!(app_id = %binding.app_id, drain = %binding.drain, "binding removed");
    }

    /// Snapshot of the active bindings.
    pub async fn list(&self) -> Vec<Binding> {
        self.subscriptions.lock().await.keys().cloned().collect()
    }

    /// Tear down every subscription. Used on process shutdown.
    pub async fn shutdown(&self) {
        let mut subscriptions = self.subscriptions.lock().await;
        for (binding, subscription) in subscriptions.drain() {
            subscription.stop().await;
            self.metrics.decr_drain_bindings();
            debug!(app_id = %binding.app_id, drain = %binding.drain, "subscription stopped");
        }
    }
}

#[cfg(test)]
#[path = "binding_manager_test.rs"]
mod binding_manager_test;
