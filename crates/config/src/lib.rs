//! Drainline configuration
//!
//! Flag-based configuration for both binaries, parsed with clap. Every flag
//! except the blacklist and skip-verify toggles is required; validation
//! aggregates all missing flags into a single diagnostic so an operator sees
//! the whole problem at once, and the binaries exit before any network
//! activity.

mod adapter;
mod error;
mod scheduler;

pub use adapter::AdapterConfig;
pub use error::{ConfigError, Result};
pub use scheduler::{SchedulerConfig, TlsMaterial};
