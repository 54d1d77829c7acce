//! Logs-provider clients
//!
//! The capability seams the ingress pool and subscription runners consume,
//! plus the TCP implementation used in production. The wire protocol is a
//! JSON [`ReceiverRequest`] handshake followed by length-prefixed JSON
//! envelopes:
//!
//! ```text
//! [4 bytes: length (big-endian)][N bytes: JSON frame]
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use drain_protocol::{LogEnvelope, ReceiverRequest};

/// Envelopes larger than this are treated as protocol corruption.
const MAX_ENVELOPE_BYTES: usize = 1024 * 1024;

/// Errors from the logs-provider plane.
#[derive(Debug, Error)]
pub enum IngressError {
    /// The pool has no live connection yet; callers treat this as transient
    #[error("no connection to logs provider")]
    NotConnected,

    /// Dialing the provider exceeded the deadline
    #[error("connect to logs provider timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("logs provider io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("envelope of {0} bytes exceeds frame limit")]
    Oversized(usize),
}

/// One open receiver stream delivering envelopes for a single app.
#[async_trait]
pub trait EnvelopeStream: Send + std::fmt::Debug {
    async fn recv(&mut self) -> Result<LogEnvelope, IngressError>;
}

/// A live connection to the logs provider.
///
/// `valid` turns false once the connection is known dead; the pool replaces
/// invalid clients on its next sweep.
#[async_trait]
pub trait LogsProviderClient: Send + Sync {
    async fn receiver(
        &self,
        request: ReceiverRequest,
    ) -> Result<Box<dyn EnvelopeStream>, IngressError>;

    fn valid(&self) -> bool;

    async fn close(&self);
}

/// Capability that opens new logs-provider connections for the pool.
#[async_trait]
pub trait LogsConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn LogsProviderClient>, IngressError>;
}

/// Placeholder handed out while the pool has no live client. Every operation
/// fails with [`IngressError::NotConnected`]; subscription runners back off
/// and retry.
pub struct DisconnectedClient;

#[async_trait]
impl LogsProviderClient for DisconnectedClient {
    async fn receiver(
        &self,
        _request: ReceiverRequest,
    ) -> Result<Box<dyn EnvelopeStream>, IngressError> {
        Err(IngressError::NotConnected)
    }

    fn valid(&self) -> bool {
        false
    }

    async fn close(&self) {}
}

/// [`LogsConnector`] dialing the provider over TCP.
pub struct TcpLogsConnector {
    addr: String,
    dial_timeout: Duration,
}

impl TcpLogsConnector {
    pub fn new(addr: impl Into<String>, dial_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            dial_timeout,
        }
    }

    async fn dial(&self) -> Result<TcpStream, IngressError> {
        timeout(self.dial_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| IngressError::ConnectTimeout(self.dial_timeout))?
            .map_err(IngressError::Io)
    }
}

#[async_trait]
impl LogsConnector for TcpLogsConnector {
    async fn connect(&self) -> Result<Arc<dyn LogsProviderClient>, IngressError> {
        // The probe connection proves reachability and anchors the client's
        // validity; receiver streams each get their own connection.
        let probe = self.dial().await?;
        debug!(addr = %self.addr, "connected to logs provider");

        Ok(Arc::new(TcpLogsClient {
            addr: self.addr.clone(),
            dial_timeout: self.dial_timeout,
            valid: Arc::new(AtomicBool::new(true)),
            probe: tokio::sync::Mutex::new(Some(probe)),
        }))
    }
}

/// One pooled provider connection.
pub struct TcpLogsClient {
    addr: String,
    dial_timeout: Duration,
    valid: Arc<AtomicBool>,
    probe: tokio::sync::Mutex<Option<TcpStream>>,
}

#[async_trait]
impl LogsProviderClient for TcpLogsClient {
    async fn receiver(
        &self,
        request: ReceiverRequest,
    ) -> Result<Box<dyn EnvelopeStream>, IngressError> {
        if !self.valid() {
            return Err(IngressError::NotConnected);
        }

        let mut stream = timeout(self.dial_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| IngressError::ConnectTimeout(self.dial_timeout))?
            .map_err(IngressError::Io)?;

        let handshake = serde_json::to_vec(&request)
            .map_err(|e| IngressError::Malformed(e.to_string()))?;
        stream.write_all(&(handshake.len() as u32).to_be_bytes()).await?;
        stream.write_all(&handshake).await?;
        stream.flush().await?;

        Ok(Box::new(TcpEnvelopeStream {
            stream,
            valid: Arc::clone(&self.valid),
        }))
    }

    fn valid(&self) -> bool {
        self.valid.load(Ordering::Relaxed)
    }

    async fn close(&self) {
        self.valid.store(false, Ordering::Relaxed);
        if let Some(mut probe) = self.probe.lock().await.take() {
            let _ = probe.shutdown().await;
        }
    }
}

#[derive(Debug)]
struct TcpEnvelopeStream {
    stream: TcpStream,
    valid: Arc<AtomicBool>,
}

impl TcpEnvelopeStream {
    fn invalidate(&self) {
        self.valid.store(false, Ordering::Relaxed);
    }
}

#[async_trait]
impl EnvelopeStream for TcpEnvelopeStream {
    async fn recv(&mut self) -> Result<LogEnvelope, IngressError> {
        // The owning client shares this flag; once the pool rotates or
        // closes it, every stream it handed out stops delivering so the
        // subscription rebuilds on a fresh client.
        if !self.valid.load(Ordering::Relaxed) {
            return Err(IngressError::NotConnected);
        }

        let mut len_buf = [0u8; 4];
        if let Err(e) = self.stream.read_exact(&mut len_buf).await {
            self.invalidate();
            return Err(IngressError::Io(e));
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_ENVELOPE_BYTES {
            self.invalidate();
            return Err(IngressError::Oversized(len));
        }

        let mut frame = vec![0u8; len];
        if let Err(e) = self.stream.read_exact(&mut frame).await {
            self.invalidate();
            return Err(IngressError::Io(e));
        }

        serde_json::from_slice(&frame).map_err(|e| IngressError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "ingress_test.rs"]
mod ingress_test;
