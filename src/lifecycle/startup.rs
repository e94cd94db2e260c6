//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Seed the first snapshot from the running load balancer
//! - Start background tasks and wait for a shutdown signal

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::admin::{setup_admin_router, AdminState};
use crate::certs::FileCertStore;
use crate::config::{RetryConfig, SidecarConfig};
use crate::dataplane::fetch::fetch_state;
use crate::dataplane::{Dataplane, DataplaneError};
use crate::discovery::TopologyWatcher;
use crate::lifecycle::signals::wait_for_signal;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::backoff::apply_backoff;
use crate::state::GlobalState;
use crate::sync::{SyncHandle, Syncer};

/// Errors that prevent the sidecar from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Data Plane API client: {0}")]
    Dataplane(#[from] DataplaneError),

    #[error("Topology watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("Admin API: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address '{0}'")]
    Address(String),
}

/// Run the sidecar until SIGINT/SIGTERM.
pub async fn run(config: SidecarConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?);
    }

    let shutdown = Shutdown::new();
    let mut stopped = shutdown.subscribe();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger();
        });
    }

    let dataplane = Dataplane::new(&config.dataplane)?;
    let Some(initial) = initial_state(&dataplane, &config.retries, shutdown.subscribe()).await else {
        tracing::info!("Shutdown requested before the running configuration could be read");
        return Ok(());
    };
    let handle = SyncHandle::new(initial);

    let (watcher, updates) = TopologyWatcher::new(
        &config.topology.path,
        Duration::from_secs(config.topology.poll_interval_secs),
    );
    watcher.publish_initial();
    // Dropping the watcher stops notifications.
    let _watcher = watcher.run()?;

    let syncer = Syncer::new(
        dataplane,
        FileCertStore::new(&config.certs.dir),
        config.sync_options(),
        config.retries.clone(),
        handle.clone(),
    );
    let sync_task = tokio::spawn(syncer.run(updates, shutdown.subscribe()));

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(parse_addr(&config.admin.bind_address)?).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(AdminState {
            sync: handle.clone(),
            api_key: config.admin.api_key.clone(),
        });
        let mut stop = shutdown.subscribe();
        Some(tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        }))
    } else {
        None
    };

    let _ = stopped.recv().await;

    if let Err(e) = sync_task.await {
        tracing::error!(error = %e, "Sync loop panicked");
    }
    if let Some(task) = admin_task {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read the running configuration so that the first diff is taken against
/// what the load balancer actually holds.
///
/// Retries with capped backoff until the read succeeds. Starting from an
/// empty snapshot instead would turn every existing frontend and backend
/// into a create that the API rejects. Returns `None` if shutdown is
/// signalled first.
pub async fn initial_state(
    dataplane: &Dataplane,
    retries: &RetryConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Option<GlobalState> {
    let mut attempt: u32 = 0;

    loop {
        let fetched = tokio::select! {
            fetched = fetch_state(dataplane) => fetched,
            _ = shutdown.recv() => return None,
        };

        let e = match fetched {
            Ok(state) => return Some(state),
            Err(e) => e,
        };

        attempt = attempt.saturating_add(1);
        let delay = apply_backoff(attempt, retries);
        tracing::warn!(attempt, delay = ?delay, error = %e, "Failed to fetch running configuration, retrying");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.recv() => return None,
        }
    }
}

fn parse_addr(value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address(value.to_string()))
}
