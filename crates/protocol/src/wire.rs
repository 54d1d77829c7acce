//! Request and response shapes for the adapter control plane and the logs
//! provider receiver handshake.

use serde::{Deserialize, Serialize};

use crate::Binding;

/// `POST /v1/bindings` body. Idempotent on structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBindingRequest {
    pub binding: Binding,
}

/// `DELETE /v1/bindings` body. Deleting an absent binding is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBindingRequest {
    pub binding: Binding,
}

/// `GET /v1/bindings` response: an unordered snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBindingsResponse {
    pub bindings: Vec<Binding>,
}

/// Opening handshake for a logs-provider receiver stream: which app's
/// envelopes to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverRequest {
    pub app_id: String,
}
