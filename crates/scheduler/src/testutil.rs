//! Spy implementations of the scheduler's capability seams.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use drain_protocol::Binding;

use crate::fetcher::{FetchError, Getter, HttpResponse};
use crate::pool::{AdapterClient, AdapterError};

/// Spy [`AdapterClient`] recording every call, with scriptable list results.
pub(crate) struct SpyClient {
    addr: String,
    created: Mutex<Vec<Binding>>,
    deleted: Mutex<Vec<Binding>>,
    ops: Mutex<Vec<String>>,
    list_response: Mutex<Vec<Binding>>,
    list_fails: Mutex<bool>,
}

impl SpyClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            ops: Mutex::new(Vec::new()),
            list_response: Mutex::new(Vec::new()),
            list_fails: Mutex::new(false),
        }
    }

    pub fn set_list_response(&self, bindings: Vec<Binding>) {
        *self.list_response.lock().unwrap() = bindings;
    }

    pub fn fail_list(&self) {
        *self.list_fails.lock().unwrap() = true;
    }

    pub fn created(&self) -> Vec<Binding> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<Binding> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.deleted.lock().unwrap().len()
    }

    /// Calls in issue order, as `create:<drain>` / `delete:<drain>`.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdapterClient for SpyClient {
    async fn create_binding(&self, binding: &Binding) -> Result<(), AdapterError> {
        self.ops.lock().unwrap().push(format!("create:{}", binding.drain));
        self.created.lock().unwrap().push(binding.clone());
        Ok(())
    }

    async fn delete_binding(&self, binding: &Binding) -> Result<(), AdapterError> {
        self.ops.lock().unwrap().push(format!("delete:{}", binding.drain));
        self.deleted.lock().unwrap().push(binding.clone());
        Ok(())
    }

    async fn list_bindings(&self) -> Result<Vec<Binding>, AdapterError> {
        if *self.list_fails.lock().unwrap() {
            return Err(AdapterError::Transport("list failed".to_string()));
        }
        Ok(self.list_response.lock().unwrap().clone())
    }

    fn addr(&self) -> &str {
        &self.addr
    }
}

/// Spy [`Getter`] serving queued responses.
pub(crate) struct SpyGetter {
    responses: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
}

impl SpyGetter {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, response: Result<HttpResponse, FetchError>) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl Getter for SpyGetter {
    async fn get(&self) -> Result<HttpResponse, FetchError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("no scripted response".to_string())))
    }
}
