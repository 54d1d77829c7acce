//! Scheduler flags.

use std::net::Ipv4Addr;

use clap::Parser;
use drain_protocol::IpRanges;

use crate::error::{ConfigError, Result};

/// Mutual-TLS material for one client plane.
///
/// The expected common name is the identity the peer's TLS layer is expected
/// to present; certificate and key paths feed the HTTP client identity.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    pub ca_file: String,
    pub cert_file: String,
    pub key_file: String,
    pub common_name: String,
}

/// Startup flags for the scheduler.
#[derive(Debug, Clone, Parser)]
#[command(name = "drain-scheduler", version, about = "Syslog drain scheduler")]
pub struct SchedulerConfig {
    /// The hostport to listen on for health requests
    #[arg(long = "health", default_value = ":8080")]
    pub health_hostport: String,

    /// The hostport to listen on for runtime diagnostics
    #[arg(long = "pprof", default_value = ":6060")]
    pub pprof_hostport: String,

    /// The URL of the binding provider
    #[arg(long = "api-url", default_value = "")]
    pub api_url: String,

    /// The file path for the binding provider CA cert
    #[arg(long = "api-ca", default_value = "")]
    pub api_ca_file: String,

    /// The file path for the binding provider client cert
    #[arg(long = "api-cert", default_value = "")]
    pub api_cert_file: String,

    /// The file path for the binding provider client key
    #[arg(long = "api-key", default_value = "")]
    pub api_key_file: String,

    /// The common name expected from the binding provider
    #[arg(long = "api-cn", default_value = "")]
    pub api_common_name: String,

    /// Allow insecure connections to the binding provider
    #[arg(long = "api-skip-cert-verify")]
    pub api_skip_cert_verify: bool,

    /// The file path for the adapter CA cert
    #[arg(long = "ca", default_value = "")]
    pub ca_file: String,

    /// The file path for the adapter client cert
    #[arg(long = "cert", default_value = "")]
    pub cert_file: String,

    /// The file path for the adapter client key
    #[arg(long = "key", default_value = "")]
    pub key_file: String,

    /// The common name expected from adapters
    #[arg(long = "adapter-cn", default_value = "")]
    pub adapter_common_name: String,

    /// The port of the adapter control-plane API
    #[arg(long = "adapter-port", default_value = "")]
    pub adapter_port: String,

    /// Comma-separated list of adapter IP addresses
    #[arg(long = "adapter-ips", default_value = "")]
    pub adapter_ips: String,

    /// Comma-separated list of blacklisted IP ranges, as start-end pairs
    #[arg(long = "blacklist-ranges", default_value = "")]
    pub blacklist_ranges: String,

    /// Seconds between reconcile ticks
    #[arg(long = "interval-secs", default_value_t = 15)]
    pub interval_secs: u64,
}

impl SchedulerConfig {
    /// Check that every required flag was provided. Collects all missing
    /// flags into one error rather than reporting them one at a time.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("health", &self.health_hostport),
            ("pprof", &self.pprof_hostport),
            ("api-url", &self.api_url),
            ("api-ca", &self.api_ca_file),
            ("api-cert", &self.api_cert_file),
            ("api-key", &self.api_key_file),
            ("api-cn", &self.api_common_name),
            ("ca", &self.ca_file),
            ("cert", &self.cert_file),
            ("key", &self.key_file),
            ("adapter-cn", &self.adapter_common_name),
            ("adapter-port", &self.adapter_port),
            ("adapter-ips", &self.adapter_ips),
        ];

        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFlags(missing))
        }
    }

    /// Assemble `ip:port` hostports from the adapter IP list.
    pub fn adapter_addrs(&self) -> Result<Vec<String>> {
        if self.adapter_ips.is_empty() {
            return Err(ConfigError::NoAdapterAddrs);
        }

        self.adapter_ips
            .split(',')
            .map(|ip| {
                ip.parse::<Ipv4Addr>()
                    .map(|_| format!("{}:{}", ip, self.adapter_port))
                    .map_err(|_| ConfigError::InvalidAdapterIp { ip: ip.to_string() })
            })
            .collect()
    }

    /// Parse the blacklist flag into validated ranges.
    pub fn blacklist(&self) -> Result<IpRanges> {
        Ok(IpRanges::parse(&self.blacklist_ranges)?)
    }

    /// TLS material for the binding provider plane.
    pub fn api_tls(&self) -> TlsMaterial {
        TlsMaterial {
            ca_file: self.api_ca_file.clone(),
            cert_file: self.api_cert_file.clone(),
            key_file: self.api_key_file.clone(),
            common_name: self.api_common_name.clone(),
        }
    }

    /// TLS material for the adapter plane.
    pub fn adapter_tls(&self) -> TlsMaterial {
        TlsMaterial {
            ca_file: self.ca_file.clone(),
            cert_file: self.cert_file.clone(),
            key_file: self.key_file.clone(),
            common_name: self.adapter_common_name.clone(),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
