//! Drainline wire types
//!
//! Shared data model for the scheduler and adapter: drain bindings, the
//! adapter control-plane request/response shapes, log envelopes pulled from
//! the upstream provider, and the IPv4 blacklist ranges.
//!
//! Everything here is plain data with structural equality. Behavior lives in
//! the crates that own it.

mod binding;
mod envelope;
mod ip_range;
mod wire;

pub use binding::{desired_contains, AppBinding, AppBindings, Binding, BindingList};
pub use envelope::LogEnvelope;
pub use ip_range::{IpRange, IpRanges, RangeError};
pub use wire::{
    CreateBindingRequest, DeleteBindingRequest, ListBindingsResponse, ReceiverRequest,
};
