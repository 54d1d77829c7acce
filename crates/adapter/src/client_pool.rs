//! Ingress client pool
//!
//! Maintains N concurrent logs-provider connections and hands them out
//! round-robin. A background task keeps the pool fresh:
//!
//! - every rotation interval, one client is replaced (open the new
//!   connection first, then close the old one)
//! - every validity sweep, clients whose connection went bad are replaced
//!   immediately with the same open-then-close discipline
//! - failed connects leave the pool below N; a refill pass retries after
//!   the retry wait instead of blocking
//!
//! The live-client count never exceeds N; during a swap one extra socket may
//! be open briefly while the old client drains. Callers arriving before the
//! first successful connect get a [`DisconnectedClient`] placeholder that
//! errors on use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ingress::{DisconnectedClient, LogsConnector, LogsProviderClient};

/// Pool sizing and cadence.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of connections to maintain
    pub connection_count: usize,

    /// How often to roll one connection
    pub rotation_interval: Duration,

    /// How often to sweep for invalid connections
    pub validity_interval: Duration,

    /// Wait before retrying a failed connect
    pub retry_wait: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connection_count: 5,
            rotation_interval: Duration::from_secs(600),
            validity_interval: Duration::from_secs(30),
            retry_wait: Duration::from_secs(15),
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_retry_wait(mut self, retry_wait: Duration) -> Self {
        self.retry_wait = retry_wait;
        self
    }
}

/// The rolling pool of logs-provider clients.
pub struct ClientPool {
    inner: Arc<PoolInner>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

struct PoolInner {
    connector: Arc<dyn LogsConnector>,
    config: PoolConfig,
    slots: Mutex<Vec<Arc<dyn LogsProviderClient>>>,
    next_cursor: AtomicUsize,
    roll_cursor: AtomicUsize,
    shutdown: CancellationToken,
}

impl ClientPool {
    /// Spawn the maintenance task and begin filling the pool. Returns
    /// immediately; `next` serves placeholders until the first connect
    /// lands.
    pub fn start(connector: Arc<dyn LogsConnector>, config: PoolConfig) -> Self {
        let inner = Arc::new(PoolInner {
            connector,
            config,
            slots: Mutex::new(Vec::new()),
            next_cursor: AtomicUsize::new(0),
            roll_cursor: AtomicUsize::new(0),
            shutdown: CancellationToken::new(),
        });

        let task = tokio::spawn(maintain(Arc::clone(&inner)));

        Self {
            inner,
            task: tokio::sync::Mutex::new(Some(task)),
        }
    }

    /// The next client in round-robin order. Never returns an empty handle:
    /// while the pool has no live client this yields a placeholder whose
    /// operations fail with a transient error.
    pub fn next(&self) -> Arc<dyn LogsProviderClient> {
        let slots = self.inner.slots.lock().unwrap();
        if slots.is_empty() {
            return Arc::new(DisconnectedClient);
        }

        let index = self.inner.next_cursor.fetch_add(1, Ordering::Relaxed) % slots.len();
        Arc::clone(&slots[index])
    }

    /// Number of live clients. At most the configured connection count.
    pub fn live_count(&self) -> usize {
        self.inner.slots.lock().unwrap().len()
    }

    /// Stop rotation, then close every client.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
    }
}

async fn maintain(inner: Arc<PoolInner>) {
    info!(
        connections = inner.config.connection_count,
        rotation_secs = inner.config.rotation_interval.as_secs_f64(),
        "ingress client pool starting"
    );

    // Fill eagerly once; the tickers take over from there. interval_at
    // suppresses the immediate first tick a plain interval would fire.
    inner.refill().await;

    let start = Instant::now();
    let mut roll = interval_at(
        start + inner.config.rotation_interval,
        inner.config.rotation_interval,
    );
    roll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sweep = interval_at(
        start + inner.config.validity_interval,
        inner.config.validity_interval,
    );
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refill = interval_at(start + inner.config.retry_wait, inner.config.retry_wait);
    refill.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            _ = roll.tick() => inner.rotate().await,
            _ = sweep.tick() => inner.sweep_validity().await,
            _ = refill.tick() => inner.refill().await,
        }
    }

    inner.close_all().await;
    info!("ingress client pool stopped");
}

impl PoolInner {
    /// Top the pool back up to the configured count. Stops at the first
    /// failed connect; the next refill tick retries.
    async fn refill(&self) {
        loop {
            if self.slots.lock().unwrap().len() >= self.config.connection_count {
                return;
            }

            match self.connector.connect().await {
                Ok(client) => self.slots.lock().unwrap().push(client),
                Err(e) => {
                    warn!(error = %e, "logs provider connect failed, pool degraded until retry");
                    return;
                }
            }
        }
    }

    /// Replace one client, round-robin. The replacement is opened before the
    /// old client closes, so a full pool briefly has one extra socket.
    async fn rotate(&self) {
        let replacement = self.connector.connect().await;

        let victim = {
            let mut slots = self.slots.lock().unwrap();
            let victim = if slots.is_empty() {
                None
            } else {
                let index = self.roll_cursor.fetch_add(1, Ordering::Relaxed) % slots.len();
                Some(slots.remove(index))
            };

            match replacement {
                Ok(client) => slots.push(client),
                Err(ref e) => {
                    warn!(error = %e, "replacement connect failed, pool degraded until retry");
                }
            }

            victim
        };

        if let Some(old) = victim {
            debug!("rolled one logs provider connection");
            old.close().await;
        }
    }

    /// Replace every client whose connection went bad.
    async fn sweep_validity(&self) {
        let stale: Vec<Arc<dyn LogsProviderClient>> = {
            let slots = self.slots.lock().unwrap();
            slots.iter().filter(|c| !c.valid()).cloned().collect()
        };

        for old in stale {
            let replacement = self.connector.connect().await;

            let removed = {
                let mut slots = self.slots.lock().unwrap();
                let position = slots.iter().position(|c| Arc::ptr_eq(c, &old));
                let removed = position.map(|i| slots.remove(i));

                match replacement {
                    Ok(client) => slots.push(client),
                    Err(ref e) => {
                        warn!(error = %e, "replacement connect failed, pool degraded until retry");
                    }
                }

                removed
            };

            if let Some(old) = removed {
                debug!("replaced an invalid logs provider connection");
                old.close().await;
            }
        }
    }

    async fn close_all(&self) {
        let drained: Vec<Arc<dyn LogsProviderClient>> =
            self.slots.lock().unwrap().drain(..).collect();
        for client in drained {
            client.close().await;
        }
    }
}

#[cfg(test)]
#[path = "client_pool_test.rs"]
mod client_pool_test;
