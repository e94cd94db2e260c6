//! File-backed certificate store.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::certs::{CertError, CertPaths, CertificateStore};
use crate::discovery::TlsConfig;

/// Writes TLS material into a directory using content-addressed file names.
#[derive(Debug, Clone)]
pub struct FileCertStore {
    dir: PathBuf,
}

impl FileCertStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_once(&self, prefix: &str, content: &str) -> Result<PathBuf, CertError> {
        let digest = Sha256::digest(content.as_bytes());
        let path = self.dir.join(format!("{}-{:x}.pem", prefix, digest));

        if path.exists() {
            return Ok(path);
        }

        fs::create_dir_all(&self.dir).map_err(|source| CertError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Staged under a unique owner-only (0600) name, then renamed into place.
        let io_err = |source| CertError::Io {
            path: path.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        staged.write_all(content.as_bytes()).map_err(io_err)?;
        staged.persist(&path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = ?path, "Wrote TLS material");
        Ok(path)
    }
}

impl CertificateStore for FileCertStore {
    fn certs_path(&self, tls: &TlsConfig) -> Result<CertPaths, CertError> {
        if tls.ca_certs.iter().all(|c| c.trim().is_empty()) {
            return Err(CertError::MissingMaterial("no CA certificates"));
        }
        if tls.cert.trim().is_empty() {
            return Err(CertError::MissingMaterial("no certificate"));
        }
        if tls.key.trim().is_empty() {
            return Err(CertError::MissingMaterial("no private key"));
        }

        let ca_bundle = join_pem(tls.ca_certs.iter().map(String::as_str));
        let cert_bundle = join_pem([tls.cert.as_str(), tls.key.as_str()]);

        Ok(CertPaths {
            ca_file: self.write_once("ca", &ca_bundle)?,
            cert_file: self.write_once("cert", &cert_bundle)?,
        })
    }
}

fn join_pem<'a>(blocks: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for block in blocks {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        out.push_str(block);
        out.push('\n');
    }
    out
}
