//! Mesh sidecar: keeps an HAProxy instance in line with service discovery.
//!
//! # Architecture Overview
//!
//! ```text
//!   topology file ──▶ discovery ──▶ sync loop ──────────────────────────┐
//!   (change feed)     watcher        │                                  │
//!                                    ▼                                  ▼
//!                              state::generate_state           dataplane::apply
//!                               ├─ stats frontend               (one transaction)
//!                               ├─ upstream synthesis                │
//!                               │   └─ server slot reconciliation    ▼
//!                               └─ certs (TLS file paths)       HAProxy Data Plane API
//!
//!   admin API ◀── committed snapshot (SyncHandle)
//! ```

use clap::Parser;
use std::path::PathBuf;

use mesh_sidecar::config::{load_config, SidecarConfig};
use mesh_sidecar::lifecycle::startup;
use mesh_sidecar::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "mesh-sidecar")]
#[command(about = "Reconciles service discovery into HAProxy configuration", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SidecarConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dataplane = %config.dataplane.url,
        topology = ?config.topology.path,
        "mesh-sidecar starting"
    );

    startup::run(config).await?;
    Ok(())
}
