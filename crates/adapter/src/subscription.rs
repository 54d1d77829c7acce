//! Subscription runner
//!
//! One background task per binding: take a client from the ingress pool,
//! open a receiver stream for the binding's app, and forward envelopes to
//! the drain. Any failure tears the pair down and rebuilds it after a short
//! wait, picking up the next pooled client. Cancellation closes the egress
//! socket before the task exits.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use drain_protocol::{Binding, ReceiverRequest};

use crate::binding_manager::{Subscriber, Subscription};
use crate::client_pool::ClientPool;
use crate::egress::DrainWriter;

/// Timeouts for one subscription's egress and rebuild cadence.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Deadline for dialing the drain
    pub dial_timeout: Duration,

    /// Deadline for each write to the drain
    pub io_timeout: Duration,

    /// Wait between rebuild attempts after a failure
    pub retry_wait: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            dial_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(60),
            retry_wait: Duration::from_secs(1),
        }
    }
}

/// Starts one forwarding subscription per accepted binding, backed by the
/// shared ingress pool.
pub struct DrainSubscriber {
    pool: Arc<ClientPool>,
    config: SubscriberConfig,
}

impl DrainSubscriber {
    pub fn new(pool: Arc<ClientPool>, config: SubscriberConfig) -> Self {
        Self { pool, config }
    }
}

impl Subscriber for DrainSubscriber {
    fn start(&self, binding: &Binding) -> Subscription {
        let token = CancellationToken::new();
        let task = tokio::spawn(run(
            binding.clone(),
            Arc::clone(&self.pool),
            self.config.clone(),
            token.clone(),
        ));

        Subscription::new(token, task)
    }
}

async fn run(
    binding: Binding,
    pool: Arc<ClientPool>,
    config: SubscriberConfig,
    token: CancellationToken,
) {
    loop {
        if token.is_cancelled() {
            return;
        }

        let client = pool.next();
        let mut stream = match client
            .receiver(ReceiverRequest {
                app_id: binding.app_id.clone(),
            })
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                debug!(app_id = %binding.app_id, error = %e, "receiver unavailable, retrying");
                if wait(&token, config.retry_wait).await {
                    return;
                }
                continue;
            }
        };

        let mut writer = match DrainWriter::connect(
            &binding.drain,
            config.dial_timeout,
            config.io_timeout,
        )
        .await
        {
            Ok(writer) => writer,
            Err(e) => {
                warn!(drain = %binding.drain, error = %e, "drain unavailable, retrying");
                if wait(&token, config.retry_wait).await {
                    return;
                }
                continue;
            }
        };

        // Forward until the stream or the drain gives out.
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    writer.shutdown().await;
                    return;
                }
                envelope = stream.recv() => {
                    let envelope = match envelope {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            debug!(app_id = %binding.app_id, error = %e, "receiver stream ended");
                            writer.shutdown().await;
                            break;
                        }
                    };
                    if let Err(e) = writer.write(&envelope, &binding.hostname).await {
                        warn!(drain = %binding.drain, error = %e, "drain write failed");
                        break;
                    }
                }
            }
        }

        if wait(&token, config.retry_wait).await {
            return;
        }
    }
}

/// Sleep unless cancelled first. Returns true on cancellation.
async fn wait(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
#[path = "subscription_test.rs"]
mod subscription_test;
