//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Apply of a pass fails:
//!     → backoff.rs (delay before the next attempt)
//!     → after max attempts: pass abandoned, retried on the resync ticker
//! ```
//!
//! # Design Decisions
//! - Every Data Plane API call has a client-side timeout
//! - Retries live in the sync loop only, never inside the core
//! - Jittered backoff avoids synchronized retries across sidecars

pub mod backoff;
