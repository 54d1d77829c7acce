//! Drainline adapter
//!
//! The worker side of the drain platform. The adapter accepts
//! create/delete/list commands from the scheduler over its control-plane
//! API, keeps exactly one forwarding subscription per accepted binding, and
//! multiplexes its consumption of the upstream log stream over a rolling
//! pool of logs-provider connections.

mod binding_manager;
mod client_pool;
mod egress;
mod ingress;
mod server;
mod subscription;

pub use binding_manager::{BindingManager, Subscriber, Subscription};
pub use client_pool::{ClientPool, PoolConfig};
pub use egress::{DrainWriter, EgressError};
pub use ingress::{
    DisconnectedClient, EnvelopeStream, IngressError, LogsConnector, LogsProviderClient,
    TcpLogsConnector,
};
pub use server::{control_router, debug_router, health_router, serve};
pub use subscription::{DrainSubscriber, SubscriberConfig};
