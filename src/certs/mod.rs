//! Certificate resolution subsystem.
//!
//! # Data Flow
//! ```text
//! TlsConfig (PEM strings from service discovery)
//!     → CertificateStore::certs_path
//!     → (CA bundle path, certificate path)
//!     → copied onto every server slot of the upstream
//! ```
//!
//! # Design Decisions
//! - Resolution is a local file-path computation, never a network call
//! - Same material always resolves to the same paths
//! - Failures are returned to the caller, never retried here

pub mod store;

pub use store::FileCertStore;

use std::path::PathBuf;
use thiserror::Error;

use crate::discovery::TlsConfig;

/// Errors raised while resolving TLS material to files.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("TLS material incomplete: {0}")]
    MissingMaterial(&'static str),

    #[error("Failed to write certificate file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolved file locations for an upstream's TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertPaths {
    pub ca_file: PathBuf,
    pub cert_file: PathBuf,
}

/// Resolves a TLS configuration to concrete file locations.
pub trait CertificateStore: Send + Sync {
    /// Return the CA bundle and certificate paths for `tls`.
    fn certs_path(&self, tls: &TlsConfig) -> Result<CertPaths, CertError>;
}
