//! Load balancer control-plane subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     fetch.rs (list frontends, backends and children)
//!     → GlobalState used as the first "old" snapshot
//!
//! Each pass:
//!     apply.rs (diff old vs new snapshot)
//!     → transaction.rs (lazy begin, upserts, one commit)
//!     → client.rs (HTTP requests against the Data Plane API)
//! ```
//!
//! # Design Decisions
//! - All writes of a pass share one transaction; nothing is visible before commit
//! - Server slots are replaced or created, never deleted
//! - No internal retries; the sync loop owns retry policy

pub mod apply;
pub mod client;
pub mod fetch;
pub mod models;
pub mod transaction;

pub use apply::StateApplier;
pub use client::Dataplane;
pub use transaction::Transaction;

use thiserror::Error;

/// Errors returned by the control-plane client.
#[derive(Debug, Error)]
pub enum DataplaneError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Data Plane API returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid Data Plane API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for control-plane operations.
pub type DataplaneResult<T> = Result<T, DataplaneError>;

/// Resource kinds managed through the configuration endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Frontend,
    Backend,
    Bind,
    Server,
    Filter,
    LogTarget,
    HttpRequestRule,
    HttpResponseRule,
}

impl ResourceKind {
    /// Path segment under `/configuration`.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Frontend => "frontends",
            ResourceKind::Backend => "backends",
            ResourceKind::Bind => "binds",
            ResourceKind::Server => "servers",
            ResourceKind::Filter => "filters",
            ResourceKind::LogTarget => "log_targets",
            ResourceKind::HttpRequestRule => "http_request_rules",
            ResourceKind::HttpResponseRule => "http_response_rules",
        }
    }
}

/// The resource a child resource is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// Top-level resource (frontends, backends).
    None,
    Frontend(String),
    Backend(String),
}

impl Parent {
    /// Query parameters selecting the parent for `kind`.
    ///
    /// Binds and servers use the older `frontend=`/`backend=` form, every
    /// other child kind uses `parent_type=`/`parent_name=`.
    pub fn query(&self, kind: ResourceKind) -> Vec<(&'static str, String)> {
        let (parent_type, name) = match self {
            Parent::None => return Vec::new(),
            Parent::Frontend(name) => ("frontend", name.clone()),
            Parent::Backend(name) => ("backend", name.clone()),
        };

        match kind {
            ResourceKind::Bind | ResourceKind::Server => vec![(parent_type, name)],
            _ => vec![("parent_type", parent_type.to_string()), ("parent_name", name)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_query() {
        let fe = Parent::Frontend("front_a".into());
        assert_eq!(fe.query(ResourceKind::Bind), vec![("frontend", "front_a".to_string())]);
        assert_eq!(
            fe.query(ResourceKind::HttpResponseRule),
            vec![
                ("parent_type", "frontend".to_string()),
                ("parent_name", "front_a".to_string())
            ]
        );
        assert!(Parent::None.query(ResourceKind::Frontend).is_empty());
    }
}
