//! Upstream descriptor definitions.
//!
//! These types mirror what service discovery reports for one service's
//! upstreams. They derive Serde traits so the topology file deserializes
//! straight into them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Full set of upstreams observed at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Topology {
    pub upstreams: Vec<Upstream>,
}

/// Transport protocol requested by an upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Tcp,
}

/// One logical upstream service, as reported by service discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Upstream {
    /// Identity name; frontend and backend names derive from it.
    pub name: String,

    /// Local address the frontend binds to.
    #[serde(default = "default_bind_address")]
    pub local_bind_address: String,

    /// Local port the frontend binds to.
    pub local_bind_port: u16,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(rename = "read_timeout_ms", with = "millis", default = "default_read_timeout")]
    pub read_timeout: Duration,

    #[serde(rename = "connect_timeout_ms", with = "millis", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// TLS material used for every server slot of this upstream.
    #[serde(default)]
    pub tls: TlsConfig,

    /// Currently known instances.
    #[serde(default)]
    pub nodes: Vec<UpstreamNode>,
}

/// A single upstream instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpstreamNode {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl UpstreamNode {
    /// Identity key: `host:port`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PEM encoded TLS material for talking to upstream instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Trusted CA certificates.
    pub ca_certs: Vec<String>,
    /// Leaf certificate.
    pub cert: String,
    /// Private key for the leaf certificate.
    pub key: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_weight() -> u32 {
    1
}

/// Serde helpers storing a `Duration` as integer milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
