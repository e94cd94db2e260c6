//! Topology loading from disk.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::discovery::types::Topology;

/// Errors raised while reading a topology file.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Duplicate upstream name '{0}'")]
    DuplicateUpstream(String),

    #[error("Upstream '{0}' has no local bind port")]
    MissingBindPort(String),

    #[error("Upstream '{upstream}' has node '{host}' with port 0")]
    InvalidNodePort { upstream: String, host: String },
}

/// Load and validate a topology from a TOML file.
pub fn load_topology(path: &Path) -> Result<Topology, TopologyError> {
    let content = fs::read_to_string(path)?;
    parse_topology(&content)
}

/// Parse and validate a topology from TOML text.
pub fn parse_topology(content: &str) -> Result<Topology, TopologyError> {
    let topology: Topology = toml::from_str(content)?;
    validate_topology(&topology)?;
    Ok(topology)
}

fn validate_topology(topology: &Topology) -> Result<(), TopologyError> {
    let mut names = HashSet::new();
    for upstream in &topology.upstreams {
        if !names.insert(upstream.name.as_str()) {
            return Err(TopologyError::DuplicateUpstream(upstream.name.clone()));
        }
        if upstream.local_bind_port == 0 {
            return Err(TopologyError::MissingBindPort(upstream.name.clone()));
        }
        if let Some(node) = upstream.nodes.iter().find(|n| n.port == 0) {
            return Err(TopologyError::InvalidNodePort {
                upstream: upstream.name.clone(),
                host: node.host.clone(),
            });
        }
    }
    Ok(())
}
