//! Service-mesh sidecar library: service discovery in, HAProxy configuration out.

pub mod config;
pub mod discovery;
pub mod certs;
pub mod state;
pub mod dataplane;
pub mod sync;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod admin;

pub use config::SidecarConfig;
pub use state::GlobalState;
pub use sync::{SyncHandle, Syncer};
