//! Scheduler binary
//!
//! ```bash
//! drain-scheduler \
//!     --api-url https://cups.example.com/internal/v4/syslog_drain_urls \
//!     --api-ca /certs/api-ca.crt --api-cert /certs/api.crt --api-key /certs/api.key \
//!     --api-cn cups \
//!     --ca /certs/ca.crt --cert /certs/scheduler.crt --key /certs/scheduler.key \
//!     --adapter-cn adapter --adapter-port 4443 \
//!     --adapter-ips 10.0.1.1,10.0.1.2,10.0.1.3 \
//!     --blacklist-ranges 10.0.0.0-10.0.0.255
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drain_config::SchedulerConfig;
use drain_metrics::SchedulerMetrics;
use drain_scheduler::{
    debug_router, health_router, mtls_client, serve, AdapterClient, AdapterPool, AdapterService,
    BindingFetcher, HttpAdapterClient, HttpGetter, Scheduler,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let config = SchedulerConfig::parse();
    config.validate()?;
    let blacklist = config.blacklist()?;
    let adapter_addrs = config.adapter_addrs()?;

    init_logging()?;
    info!(
        api_url = %config.api_url,
        api_cn = %config.api_common_name,
        adapter_cn = %config.adapter_common_name,
        adapters = adapter_addrs.len(),
        "scheduler configured"
    );

    let api_client = mtls_client(
        &config.api_tls(),
        config.api_skip_cert_verify,
        REQUEST_TIMEOUT,
    )?;
    let adapter_client = mtls_client(&config.adapter_tls(), false, REQUEST_TIMEOUT)?;

    let metrics = Arc::new(SchedulerMetrics::new());
    let fetcher = BindingFetcher::new(Arc::new(HttpGetter::new(
        api_client,
        config.api_url.clone(),
    )));
    let pool: AdapterPool = adapter_addrs
        .iter()
        .map(|addr| {
            Arc::new(HttpAdapterClient::new(adapter_client.clone(), addr))
                as Arc<dyn AdapterClient>
        })
        .collect();
    let service = AdapterService::new(pool, Arc::clone(&metrics));

    let scheduler = Scheduler::new(
        Duration::from_secs(config.interval_secs),
        fetcher,
        service,
        blacklist,
        Arc::clone(&metrics),
    );

    let health_addr = config.health_hostport.clone();
    let health_metrics = Arc::clone(&metrics);
    tokio::spawn(async move {
        if let Err(e) = serve(&health_addr, health_router(health_metrics)).await {
            error!(error = %e, "health listener failed");
        }
    });

    let debug_addr = config.pprof_hostport.clone();
    let debug_metrics = Arc::clone(&metrics);
    tokio::spawn(async move {
        if let Err(e) = serve(&debug_addr, debug_router(debug_metrics)).await {
            error!(error = %e, "diagnostics listener failed");
        }
    });

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    scheduler.run(shutdown).await;

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    Ok(())
}
