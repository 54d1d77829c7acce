//! Drain binding data model
//!
//! A [`Binding`] is the unit the whole control plane converges on: one
//! application forwarding its logs to one drain URL. The scheduler compares
//! the desired view ([`AppBindings`], keyed by app) against the actual view
//! ([`BindingList`], indexed by adapter) to compute its deltas.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One forwarding rule: app, syslog hostname, drain URL.
///
/// Equality is structural across all three fields; two bindings that differ
/// only in drain URL are distinct bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub app_id: String,
    pub hostname: String,
    pub drain: String,
}

impl Binding {
    pub fn new(
        app_id: impl Into<String>,
        hostname: impl Into<String>,
        drain: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            hostname: hostname.into(),
            drain: drain.into(),
        }
    }
}

/// Desired drains for a single app, as reported by the binding registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBinding {
    pub hostname: String,
    pub drains: Vec<String>,
}

/// Desired view: app id to its hostname and drain set. Produced once per
/// scheduler tick by the fetcher.
pub type AppBindings = HashMap<String, AppBinding>;

/// Actual view: one entry per adapter, in pool order. An adapter that failed
/// to report has an empty entry at its index.
pub type BindingList = Vec<Vec<Binding>>;

/// Whether the desired view contains this exact binding.
pub fn desired_contains(desired: &AppBindings, binding: &Binding) -> bool {
    desired.get(&binding.app_id).is_some_and(|app| {
        app.hostname == binding.hostname && app.drains.iter().any(|d| d == &binding.drain)
    })
}

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;
