//! Desired load-balancer state.
//!
//! # Data Flow
//! ```text
//! Topology + previous GlobalState (read-only)
//!     → generate.rs (one pass over all upstreams)
//!         → stats.rs (stats frontend)
//!         → upstream.rs (frontend + backend per upstream)
//!             → servers.rs (server slot reconciliation)
//!                 → index.rs (identity lookups)
//!     → new GlobalState (owned by the pass, then published)
//! ```
//!
//! # Design Decisions
//! - Snapshots are never mutated once published; every pass builds a new one
//! - Slot names derive from position only; slots are disabled, never removed
//! - One upstream failing does not abort the pass

pub mod generate;
pub mod index;
pub mod servers;
pub mod slot;
pub mod stats;
pub mod upstream;

pub use generate::{generate_state, Pass, SynthesisFailure};
pub use servers::reconcile_servers;
pub use slot::{Slot, SlotTarget};
pub use upstream::{synthesize_upstream, SynthesisError};

use serde::Serialize;

use crate::dataplane::models;

/// Process-wide options applied to every synthesized upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Enables HTTP logging and, together with `log_socket`, log targets.
    pub log_requests: bool,
    /// Syslog address receiving request logs.
    pub log_socket: Option<String>,
    /// Marker header set on every HTTP response.
    pub response_header_name: Option<String>,
    /// Port of the stats frontend; `None` disables it.
    pub stats_port: Option<u16>,
}

impl Options {
    /// Log target shared by frontends and backends, when logging is fully configured.
    pub(crate) fn log_target(&self) -> Option<models::LogTarget> {
        match (&self.log_socket, self.log_requests) {
            (Some(socket), true) if !socket.is_empty() => Some(models::LogTarget {
                index: 0,
                address: socket.clone(),
                facility: models::LogFacility::Local0,
                format: models::LogFormat::Rfc5424,
            }),
            _ => None,
        }
    }
}

/// A frontend together with the child resources created under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frontend {
    pub frontend: models::Frontend,
    pub bind: models::Bind,
    pub filter_compression: Option<models::Filter>,
    pub log_target: Option<models::LogTarget>,
    pub http_request_rules: Vec<models::HttpRequestRule>,
    pub http_response_rules: Vec<models::HttpResponseRule>,
}

impl Frontend {
    pub fn name(&self) -> &str {
        &self.frontend.name
    }
}

/// A backend together with its log target and positional server slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Backend {
    pub backend: models::Backend,
    pub log_target: Option<models::LogTarget>,
    pub servers: Vec<Slot>,
}

impl Backend {
    pub fn name(&self) -> &str {
        &self.backend.name
    }
}

/// Every frontend and backend known at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalState {
    pub frontends: Vec<Frontend>,
    pub backends: Vec<Backend>,
}

impl GlobalState {
    pub fn find_frontend(&self, name: &str) -> Option<&Frontend> {
        self.frontends.iter().find(|f| f.name() == name)
    }

    pub fn find_backend(&self, name: &str) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name() == name)
    }

    /// Append a synthesized frontend/backend pair.
    pub fn push_upstream(&mut self, frontend: Frontend, backend: Backend) {
        self.frontends.push(frontend);
        self.backends.push(backend);
    }
}
