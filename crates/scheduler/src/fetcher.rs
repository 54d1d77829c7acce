//! Binding fetcher
//!
//! Pulls the desired binding set from the binding provider and parses it
//! into [`AppBindings`]. The provider surface is a single GET returning
//!
//! ```text
//! {"results": {"<appId>": {"drains": ["<url>", ...], "hostname": "<host>"}}}
//! ```
//!
//! Any 2xx is accepted, unknown fields are ignored, and duplicate drain URLs
//! within one app are dropped. Everything else is an error; the scheduler
//! skips the tick and retries on the next one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use drain_protocol::{AppBinding, AppBindings};

/// Errors from fetching or parsing the desired binding set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response
    #[error("binding provider request failed: {0}")]
    Transport(String),

    /// The provider answered outside the 2xx range
    #[error("binding provider returned status {0}")]
    Status(u16),

    /// The body did not parse as the expected shape
    #[error("malformed binding provider response: {0}")]
    Malformed(String),
}

/// A provider response reduced to what the fetcher needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Capability consumed by the fetcher: one GET against the provider.
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self) -> Result<HttpResponse, FetchError>;
}

/// [`Getter`] over a reqwest client. The client carries the mutual-TLS
/// identity and the request deadline.
pub struct HttpGetter {
    client: reqwest::Client,
    url: String,
}

impl HttpGetter {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Getter for HttpGetter {
    async fn get(&self) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    results: HashMap<String, ResultsEntry>,
}

#[derive(Debug, Deserialize)]
struct ResultsEntry {
    drains: Vec<String>,
    hostname: String,
}

/// Fetches and parses the desired binding set once per scheduler tick.
pub struct BindingFetcher {
    getter: Arc<dyn Getter>,
}

impl BindingFetcher {
    pub fn new(getter: Arc<dyn Getter>) -> Self {
        Self { getter }
    }

    /// Fetch the desired view. Errors leave the previous delta state
    /// untouched; the caller skips the tick.
    pub async fn fetch(&self) -> Result<AppBindings, FetchError> {
        let response = self.getter.get().await?;

        if !(200..300).contains(&response.status) {
            return Err(FetchError::Status(response.status));
        }

        let body: ResultsBody = serde_json::from_slice(&response.body)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let mut bindings = AppBindings::new();
        for (app_id, entry) in body.results {
            let mut drains: Vec<String> = Vec::with_capacity(entry.drains.len());
            for drain in entry.drains {
                if !drains.contains(&drain) {
                    drains.push(drain);
                }
            }
            bindings.insert(
                app_id,
                AppBinding {
                    hostname: entry.hostname,
                    drains,
                },
            );
        }

        Ok(bindings)
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod fetcher_test;
