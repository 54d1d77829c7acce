//! Adapter service: placement and reconciliation
//!
//! Computes and applies the create/delete deltas between the desired view
//! from the binding provider and the actual view reported by the fleet.
//!
//! Placement is deterministic: for each drain binding the service walks the
//! pool in order and issues creates to the first adapters that do not
//! already hold it, until [`REPLICA_COUNT`] adapters do. With fewer adapters
//! than the replication factor, every adapter gets the binding.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use drain_metrics::SchedulerMetrics;
use drain_protocol::{desired_contains, AppBindings, Binding, BindingList};

use crate::pool::AdapterPool;

/// Target number of adapters holding each binding.
pub const REPLICA_COUNT: usize = 2;

/// Errors from the adapter service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Every adapter in the pool failed to report its bindings. Acting on an
    /// all-empty view would re-create every binding, so the caller skips.
    #[error("all {0} adapters failed to list bindings")]
    AllAdaptersFailed(usize),
}

/// Aggregates the adapter pool behind list/create/delete delta operations.
pub struct AdapterService {
    pool: AdapterPool,
    metrics: Arc<SchedulerMetrics>,
}

impl AdapterService {
    pub fn new(pool: AdapterPool, metrics: Arc<SchedulerMetrics>) -> Self {
        Self { pool, metrics }
    }

    /// Size of the pool.
    pub fn count(&self) -> usize {
        self.pool.len()
    }

    /// Query every adapter in parallel and collect results in pool order.
    /// A failing adapter yields an empty slot so its silence can only
    /// trigger creates, never deletes.
    pub async fn list(&self) -> Result<BindingList, ServiceError> {
        let mut handles = Vec::with_capacity(self.pool.len());
        for client in &self.pool {
            let client = Arc::clone(client);
            handles.push(tokio::spawn(
                async move { client.list_bindings().await },
            ));
        }

        let mut actual = BindingList::with_capacity(self.pool.len());
        let mut failures = 0;
        for (client, handle) in self.pool.iter().zip(handles) {
            match handle.await {
                Ok(Ok(bindings)) => actual.push(bindings),
                Ok(Err(e)) => {
                    warn!(adapter = client.addr(), error = %e, "list bindings failed");
                    failures += 1;
                    actual.push(Vec::new());
                }
                Err(e) => {
                    warn!(adapter = client.addr(), error = %e, "list task failed");
                    failures += 1;
                    actual.push(Vec::new());
                }
            }
        }

        if !self.pool.is_empty() && failures == self.pool.len() {
            return Err(ServiceError::AllAdaptersFailed(failures));
        }

        Ok(actual)
    }

    /// Issue creates for every desired drain binding held by fewer than
    /// [`REPLICA_COUNT`] adapters. Idempotent in steady state: a binding
    /// with enough holders issues no calls.
    pub async fn create(&self, actual: &BindingList, desired: &AppBindings) {
        let target = REPLICA_COUNT.min(self.pool.len());

        for (app_id, app) in desired {
            for drain in &app.drains {
                let binding = Binding::new(app_id.clone(), app.hostname.clone(), drain.clone());

                let mut holders = actual
                    .iter()
                    .filter(|slot| slot.contains(&binding))
                    .count();

                for (index, client) in self.pool.iter().enumerate() {
                    if holders >= target {
                        break;
                    }
                    if actual.get(index).is_some_and(|slot| slot.contains(&binding)) {
                        continue;
                    }

                    debug!(
                        adapter = client.addr(),
                        app_id = %binding.app_id,
                        drain = %binding.drain,
                        "creating binding"
                    );
                    if let Err(e) = client.create_binding(&binding).await {
                        warn!(adapter = client.addr(), error = %e, "create binding failed");
                    }
                    self.metrics.record_create_issued();
                    holders += 1;
                }
            }
        }
    }

    /// Issue deletes for every reported binding no longer desired, on every
    /// adapter whose slot holds it.
    pub async fn delete(&self, actual: &BindingList, desired: &AppBindings) {
        for (index, slot) in actual.iter().enumerate() {
            let Some(client) = self.pool.get(index) else {
                continue;
            };

            for binding in slot {
                if desired_contains(desired, binding) {
                    continue;
                }

                debug!(
                    adapter = client.addr(),
                    app_id = %binding.app_id,
                    drain = %binding.drain,
                    "deleting binding"
                );
                if let Err(e) = client.delete_binding(binding).await {
                    warn!(adapter = client.addr(), error = %e, "delete binding failed");
                }
                self.metrics.record_delete_issued();
            }
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod service_test;
