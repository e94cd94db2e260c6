//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! topology file (TOML)
//!     → loader.rs (parse & validate)
//!     → Topology (ordered upstream descriptors)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new topology
//!     → sent down an mpsc channel to the sync loop
//! ```
//!
//! # Design Decisions
//! - The feed never reconciles anything itself, it only publishes topologies
//! - An invalid topology is dropped; the last good one stays in effect
//! - Nodes are a set keyed by `host:port`; input order carries no meaning

pub mod loader;
pub mod types;
pub mod watcher;

pub use loader::{load_topology, TopologyError};
pub use types::{Protocol, TlsConfig, Topology, Upstream, UpstreamNode};
pub use watcher::TopologyWatcher;
