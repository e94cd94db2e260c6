//! Topology file watcher acting as the change feed.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use crate::discovery::loader::load_topology;
use crate::discovery::types::Topology;

/// Watches the topology file and publishes every valid version of it.
pub struct TopologyWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<Topology>,
}

impl TopologyWatcher {
    /// Create a new TopologyWatcher.
    ///
    /// Returns the watcher and a receiver for topology updates.
    pub fn new(path: &Path, poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<Topology>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self {
            path: path.to_path_buf(),
            poll_interval,
            update_tx,
        }, update_rx)
    }

    /// Publish the current file contents once, so the first pass does not
    /// wait for a modification.
    pub fn publish_initial(&self) {
        publish(&self.path, &self.update_tx);
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Topology change detected");
                        publish(&path, &tx);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Topology watch error"),
            }
        }, Config::default().with_poll_interval(self.poll_interval))?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Topology watcher started");
        Ok(watcher)
    }
}

fn publish(path: &Path, tx: &mpsc::UnboundedSender<Topology>) {
    match load_topology(path) {
        Ok(topology) => {
            tracing::debug!(upstreams = topology.upstreams.len(), "Publishing topology");
            if tx.send(topology).is_err() {
                tracing::debug!("Topology receiver dropped");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load topology. Keeping current topology.");
        }
    }
}
