//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging/metrics → Fetch running config
//!     → Start topology watcher → Start sync loop → Start admin API
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → sync loop and admin API stop → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast on configuration errors, wait for an unreachable load balancer
//! - The sync loop finishes its current pass before exiting

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
