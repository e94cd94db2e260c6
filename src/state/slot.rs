//! Server slot representation.
//!
//! # Responsibilities
//! - Represent one positional entry of a backend's server array
//! - Distinguish active slots from disabled (maintenance) slots
//! - Convert slots to and from the Data Plane API server model

use serde::Serialize;

use crate::certs::CertPaths;
use crate::dataplane::models::{Server, Toggle, Verify};
use crate::discovery::UpstreamNode;

/// Address every disabled slot points at.
pub const DISABLED_ADDRESS: &str = "127.0.0.1";

/// Port every disabled slot points at. Nothing listens here.
pub const DISABLED_PORT: u16 = 1;

/// Name of the slot at `index`.
pub fn slot_name(index: usize) -> String {
    format!("srv_{}", index)
}

/// What a slot currently routes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SlotTarget {
    Active {
        address: String,
        port: u16,
        weight: u32,
    },
    Disabled,
}

/// One entry of a backend's server array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub name: String,
    pub target: SlotTarget,
    pub ca_file: String,
    pub cert_file: String,
}

impl Slot {
    /// A maintenance slot at `index`.
    pub fn disabled(index: usize, paths: &CertPaths) -> Self {
        let mut slot = Self {
            name: slot_name(index),
            target: SlotTarget::Disabled,
            ca_file: String::new(),
            cert_file: String::new(),
        };
        slot.set_tls(paths);
        slot
    }

    /// Identity key of an active slot (`address:port`). Disabled slots have none.
    pub fn key(&self) -> Option<String> {
        match &self.target {
            SlotTarget::Active { address, port, .. } => Some(format!("{}:{}", address, port)),
            SlotTarget::Disabled => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.target, SlotTarget::Active { .. })
    }

    pub fn set_tls(&mut self, paths: &CertPaths) {
        self.ca_file = paths.ca_file.display().to_string();
        self.cert_file = paths.cert_file.display().to_string();
    }

    /// Point the slot at `node`, taking it out of maintenance.
    pub fn assign(&mut self, node: &UpstreamNode, paths: &CertPaths) {
        self.target = SlotTarget::Active {
            address: node.host.clone(),
            port: node.port,
            weight: node.weight,
        };
        self.set_tls(paths);
    }

    /// Wire representation of the slot.
    pub fn to_server(&self) -> Server {
        let (address, port, weight, maintenance) = match &self.target {
            SlotTarget::Active { address, port, weight } => {
                (address.clone(), *port, *weight, Toggle::Disabled)
            }
            SlotTarget::Disabled => (DISABLED_ADDRESS.to_string(), DISABLED_PORT, 1, Toggle::Enabled),
        };

        Server {
            name: self.name.clone(),
            address,
            port: Some(i64::from(port)),
            weight: Some(i64::from(weight)),
            ssl: Toggle::Enabled,
            ssl_certificate: Some(self.cert_file.clone()),
            ssl_cafile: Some(self.ca_file.clone()),
            verify: Some(Verify::Required),
            maintenance,
        }
    }

    /// Rebuild a slot from a server read back from the load balancer.
    pub fn from_server(server: &Server) -> Self {
        let target = match server.maintenance {
            Toggle::Enabled => SlotTarget::Disabled,
            Toggle::Disabled => SlotTarget::Active {
                address: server.address.clone(),
                port: server
                    .port
                    .and_then(|p| u16::try_from(p).ok())
                    .unwrap_or(DISABLED_PORT),
                weight: server
                    .weight
                    .and_then(|w| u32::try_from(w).ok())
                    .unwrap_or(1),
            },
        };

        Self {
            name: server.name.clone(),
            target,
            ca_file: server.ssl_cafile.clone().unwrap_or_default(),
            cert_file: server.ssl_certificate.clone().unwrap_or_default(),
        }
    }
}
