//! Scheduler loop
//!
//! One long-lived task driving fetch → filter → list → delete → create.
//! Ticks are serial: a slow tick delays the next one rather than running
//! concurrently with it. A failed fetch or a fleet-wide list failure skips
//! the tick; desired state is re-derived from scratch on the next one, so
//! nothing is lost.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use drain_metrics::SchedulerMetrics;
use drain_protocol::{AppBindings, IpRanges};

use crate::fetcher::BindingFetcher;
use crate::service::AdapterService;

/// The reconcile loop. Owns the fetcher, the adapter service, and the
/// blacklist; everything else is re-derived per tick.
pub struct Scheduler {
    interval: Duration,
    fetcher: BindingFetcher,
    service: AdapterService,
    blacklist: IpRanges,
    metrics: Arc<SchedulerMetrics>,
}

impl Scheduler {
    pub fn new(
        interval: Duration,
        fetcher: BindingFetcher,
        service: AdapterService,
        blacklist: IpRanges,
        metrics: Arc<SchedulerMetrics>,
    ) -> Self {
        Self {
            interval,
            fetcher,
            service,
            blacklist,
            metrics,
        }
    }

    /// Run until `shutdown` is cancelled. In-flight adapter calls complete
    /// under their own deadlines.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            adapters = self.service.count(),
            blacklist_ranges = self.blacklist.len(),
            "scheduler starting"
        );
        self.metrics.set_adapter_count(self.service.count() as u64);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            ticks = snapshot.ticks,
            creates_issued = snapshot.creates_issued,
            deletes_issued = snapshot.deletes_issued,
            "scheduler shutting down"
        );
    }

    /// One reconcile pass. Deletes precede creates so a drain URL edit
    /// converges within a single tick.
    pub(crate) async fn tick(&self) {
        let desired = match self.fetcher.fetch().await {
            Ok(desired) => desired,
            Err(e) => {
                warn!(error = %e, "fetching bindings failed, skipping tick");
                self.metrics.record_fetch_failure();
                return;
            }
        };

        let desired = self.filter_desired(desired);
        let drain_count: u64 = desired.values().map(|app| app.drains.len() as u64).sum();
        self.metrics.set_desired_drains(drain_count);

        let actual = match self.service.list().await {
            Ok(actual) => actual,
            Err(e) => {
                warn!(error = %e, "listing bindings failed, skipping tick");
                self.metrics.record_list_failure();
                return;
            }
        };

        self.service.delete(&actual, &desired).await;
        self.service.create(&actual, &desired).await;
        self.metrics.record_tick();
    }

    /// Drop desired drains the fleet must not serve: hosts inside the
    /// blacklist, and URLs with no parsable host. Apps left with no drains
    /// drop out entirely, so their stale bindings get deleted.
    fn filter_desired(&self, mut desired: AppBindings) -> AppBindings {
        for (app_id, app) in desired.iter_mut() {
            app.drains.retain(|drain| match Url::parse(drain) {
                Ok(url) => match url.host_str() {
                    Some(host) if self.blacklist.contains(host) => {
                        debug!(app_id = %app_id, drain = %drain, "drain host blacklisted, dropping");
                        false
                    }
                    Some(_) => true,
                    None => {
                        warn!(app_id = %app_id, drain = %drain, "drain URL has no host, dropping");
                        false
                    }
                },
                Err(e) => {
                    warn!(app_id = %app_id, drain = %drain, error = %e, "unparsable drain URL, dropping");
                    false
                }
            });
        }

        desired.retain(|_, app| !app.drains.is_empty());
        desired
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
