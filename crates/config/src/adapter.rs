//! Adapter flags.

use std::time::Duration;

use clap::Parser;

use crate::error::{ConfigError, Result};

/// Startup flags for the adapter.
///
/// TLS termination for both planes sits in front of the adapter; these flags
/// cover only what the core consumes directly.
#[derive(Debug, Clone, Parser)]
#[command(name = "drain-adapter", version, about = "Syslog drain adapter")]
pub struct AdapterConfig {
    /// The hostport to listen on for health requests
    #[arg(long = "health", default_value = ":8080")]
    pub health_hostport: String,

    /// The hostport to listen on for runtime diagnostics
    #[arg(long = "pprof", default_value = ":6060")]
    pub pprof_hostport: String,

    /// The hostport to serve the control-plane API on
    #[arg(long = "addr", default_value = ":4443")]
    pub adapter_hostport: String,

    /// The hostport of the logs provider
    #[arg(long = "logs-api-addr", default_value = "")]
    pub logs_api_addr: String,

    /// Number of concurrent logs-provider connections to maintain
    #[arg(long = "logs-api-conn-count", default_value_t = 5)]
    pub logs_api_conn_count: usize,

    /// Seconds between rolling one logs-provider connection
    #[arg(long = "logs-api-conn-ttl-secs", default_value_t = 600)]
    pub logs_api_conn_ttl_secs: u64,

    /// Seconds between validity sweeps over the connection pool
    #[arg(long = "logs-api-check-secs", default_value_t = 30)]
    pub logs_api_check_secs: u64,

    /// Seconds to wait before retrying a failed logs-provider connect
    #[arg(long = "logs-api-retry-secs", default_value_t = 15)]
    pub logs_api_retry_secs: u64,

    /// Seconds allowed for dialing a syslog drain
    #[arg(long = "syslog-dial-timeout-secs", default_value_t = 5)]
    pub syslog_dial_timeout_secs: u64,

    /// Seconds allowed for each write to a syslog drain
    #[arg(long = "syslog-io-timeout-secs", default_value_t = 60)]
    pub syslog_io_timeout_secs: u64,
}

impl AdapterConfig {
    /// Check that every required flag was provided.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.logs_api_addr.is_empty() {
            missing.push("logs-api-addr".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFlags(missing))
        }
    }

    pub fn conn_ttl(&self) -> Duration {
        Duration::from_secs(self.logs_api_conn_ttl_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.logs_api_check_secs)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.logs_api_retry_secs)
    }

    pub fn syslog_dial_timeout(&self) -> Duration {
        Duration::from_secs(self.syslog_dial_timeout_secs)
    }

    pub fn syslog_io_timeout(&self) -> Duration {
        Duration::from_secs(self.syslog_io_timeout_secs)
    }
}
