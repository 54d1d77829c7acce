//! Drainline scheduler
//!
//! The singleton control loop of the drain platform. Each tick it pulls the
//! desired binding set from the binding provider, drops drains whose host is
//! blacklisted, observes what the adapter fleet currently serves, and issues
//! the create/delete calls that converge the fleet on the desired state with
//! a replication factor of [`REPLICA_COUNT`].
//!
//! The seams ([`Getter`] for the provider, [`AdapterClient`] for each
//! adapter) are capability traits so the loop can be driven entirely by
//! spies in tests.

mod fetcher;
mod ops;
mod pool;
mod scheduler;
mod service;
mod tls;

#[cfg(test)]
pub(crate) mod testutil;

pub use fetcher::{BindingFetcher, FetchError, Getter, HttpGetter, HttpResponse};
pub use ops::{debug_router, health_router, serve};
pub use pool::{AdapterClient, AdapterError, AdapterPool, HttpAdapterClient};
pub use scheduler::Scheduler;
pub use service::{AdapterService, ServiceError, REPLICA_COUNT};
pub use tls::{mtls_client, TlsError};
