//! Drain writer
//!
//! TCP egress to one syslog drain. Lines are RFC 5424 shaped and
//! newline-delimited; each write carries an IO deadline and a failed write
//! surfaces to the subscription runner, which reconnects.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use drain_protocol::LogEnvelope;

const DEFAULT_SYSLOG_PORT: u16 = 514;

/// Facility user, severity informational.
const PRIORITY: u8 = 14;

/// Errors from dialing or writing a drain.
#[derive(Debug, Error)]
pub enum EgressError {
    #[error("invalid drain URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("drain URL '{0}' has no host")]
    NoHost(String),

    #[error("unsupported drain scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("dial to {0} timed out")]
    DialTimeout(String),

    #[error("write to drain timed out")]
    WriteTimeout,

    #[error("drain io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve a `syslog://host:port` drain URL to a dial address.
fn drain_addr(drain: &str) -> Result<String, EgressError> {
    let url = Url::parse(drain).map_err(|source| EgressError::InvalidUrl {
        url: drain.to_string(),
        source,
    })?;

    if url.scheme() != "syslog" {
        return Err(EgressError::UnsupportedScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .ok_or_else(|| EgressError::NoHost(drain.to_string()))?;
    let port = url.port().unwrap_or(DEFAULT_SYSLOG_PORT);

    Ok(format!("{host}:{port}"))
}

/// One open egress socket to a drain.
pub struct DrainWriter {
    stream: TcpStream,
    io_timeout: Duration,
}

impl DrainWriter {
    /// Dial the drain with a deadline.
    pub async fn connect(
        drain: &str,
        dial_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self, EgressError> {
        let addr = drain_addr(drain)?;

        let stream = timeout(dial_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| EgressError::DialTimeout(addr.clone()))?
            .map_err(EgressError::Io)?;

        debug!(addr = %addr, "connected to drain");
        Ok(Self { stream, io_timeout })
    }

    /// Write one envelope as a syslog line.
    pub async fn write(
        &mut self,
        envelope: &LogEnvelope,
        hostname: &str,
    ) -> Result<(), EgressError> {
        let line = format_line(envelope, hostname);

        timeout(self.io_timeout, async {
            self.stream.write_all(&line).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| EgressError::WriteTimeout)??;

        Ok(())
    }

    /// Close the egress socket.
    pub async fn shutdown(mut self) {
        let _ = self.stream.shutdown().await;
    }
}

fn format_line(envelope: &LogEnvelope, hostname: &str) -> Vec<u8> {
    let timestamp = DateTime::from_timestamp_nanos(envelope.timestamp)
        .to_rfc3339_opts(SecondsFormat::Micros, true);
    let proc_id = if envelope.instance.is_empty() {
        "-".to_string()
    } else {
        format!("[{}]", envelope.instance)
    };

    let mut line = format!(
        "<{PRIORITY}>1 {timestamp} {hostname} {} {proc_id} - - ",
        envelope.source_id,
    )
    .into_bytes();
    line.extend_from_slice(&envelope.message);
    line.push(b'\n');
    line
}

#[cfg(test)]
#[path = "egress_test.rs"]
mod egress_test;
