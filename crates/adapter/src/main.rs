//! Adapter binary
//!
//! ```bash
//! drain-adapter --logs-api-addr logs.example.com:8082 --addr :4443
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drain_adapter::{
    control_router, debug_router, health_router, serve, BindingManager, ClientPool,
    DrainSubscriber, PoolConfig, SubscriberConfig, TcpLogsConnector,
};
use drain_config::AdapterConfig;
use drain_metrics::BindingMetrics;

const LOGS_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let config = AdapterConfig::parse();
    config.validate()?;

    init_logging()?;
    info!(
        logs_api_addr = %config.logs_api_addr,
        connections = config.logs_api_conn_count,
        "adapter configured"
    );

    let connector = Arc::new(TcpLogsConnector::new(
        config.logs_api_addr.clone(),
        LOGS_DIAL_TIMEOUT,
    ));
    let pool = Arc::new(ClientPool::start(
        connector,
        PoolConfig {
            connection_count: config.logs_api_conn_count,
            rotation_interval: config.conn_ttl(),
            validity_interval: config.check_interval(),
            retry_wait: config.retry_wait(),
        },
    ));

    let metrics = Arc::new(BindingMetrics::new());
    let subscriber = Arc::new(DrainSubscriber::new(
        Arc::clone(&pool),
        SubscriberConfig {
            dial_timeout: config.syslog_dial_timeout(),
            io_timeout: config.syslog_io_timeout(),
            ..SubscriberConfig::default()
        },
    ));
    let manager = Arc::new(BindingManager::new(subscriber, Arc::clone(&metrics)));

    let control_addr = config.adapter_hostport.clone();
    let control_manager = Arc::clone(&manager);
    tokio::spawn(async move {
        if let Err(e) = serve(&control_addr, control_router(control_manager)).await {
            error!(error = %e, "control-plane listener failed");
        }
    });

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

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    manager.shutdown().await;
    pool.shutdown().await;

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
