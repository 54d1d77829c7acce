//! Adapter clients
//!
//! One [`AdapterClient`] per adapter, wrapping the three control-plane
//! operations. Failures are reported per call and never remove an adapter
//! from the pool; the next tick's delta recomputation is the retry.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use drain_protocol::{
    Binding, CreateBindingRequest, DeleteBindingRequest, ListBindingsResponse,
};

/// Errors from one adapter call.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The request never produced a response
    #[error("adapter request failed: {0}")]
    Transport(String),

    /// The adapter answered outside the 2xx range
    #[error("adapter returned status {0}")]
    Status(u16),

    /// The response body did not parse
    #[error("malformed adapter response: {0}")]
    Malformed(String),
}

/// Capability contract for one adapter. All operations carry the deadline
/// configured on the underlying client.
#[async_trait]
pub trait AdapterClient: Send + Sync {
    async fn create_binding(&self, binding: &Binding) -> Result<(), AdapterError>;
    async fn delete_binding(&self, binding: &Binding) -> Result<(), AdapterError>;
    async fn list_bindings(&self) -> Result<Vec<Binding>, AdapterError>;

    /// The adapter's address, for logs.
    fn addr(&self) -> &str;
}

/// A fixed, ordered set of adapter clients. Insertion order determines
/// placement order; the pool is immutable after construction.
pub type AdapterPool = Vec<Arc<dyn AdapterClient>>;

/// [`AdapterClient`] over the adapter's HTTP control plane.
pub struct HttpAdapterClient {
    client: reqwest::Client,
    addr: String,
    bindings_url: String,
}

impl HttpAdapterClient {
    /// `client` carries the TLS identity and request deadline; `addr` is the
    /// adapter's `ip:port`.
    pub fn new(client: reqwest::Client, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        Self {
            bindings_url: format!("http://{addr}/v1/bindings"),
            client,
            addr,
        }
    }

    fn ok_status(status: reqwest::StatusCode) -> Result<(), AdapterError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(AdapterError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl AdapterClient for HttpAdapterClient {
    async fn create_binding(&self, binding: &Binding) -> Result<(), AdapterError> {
        let response = self
            .client
            .post(&self.bindings_url)
            .json(&CreateBindingRequest {
                binding: binding.clone(),
            })
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        Self::ok_status(response.status())
    }

    async fn delete_binding(&self, binding: &Binding) -> Result<(), AdapterError> {
        let response = self
            .client
            .delete(&self.bindings_url)
            .json(&DeleteBindingRequest {
                binding: binding.clone(),
            })
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        Self::ok_status(response.status())
    }

    async fn list_bindings(&self) -> Result<Vec<Binding>, AdapterError> {
        let response = self
            .client
            .get(&self.bindings_url)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        Self::ok_status(response.status())?;

        let body: ListBindingsResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;

        Ok(body.bindings)
    }

    fn addr(&self) -> &str {
        &self.addr
    }
}
