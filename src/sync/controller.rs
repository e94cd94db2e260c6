//! The reconciliation control loop.
//!
//! # Responsibilities
//! - Turn each topology update into a new desired snapshot
//! - Apply it transactionally, retrying with backoff
//! - Publish the snapshot once committed
//! - Retry abandoned or partially synthesized passes on a resync ticker

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio::task;
use tokio::time::{self, MissedTickBehavior};

use crate::certs::CertificateStore;
use crate::config::RetryConfig;
use crate::dataplane::apply::{ApplySummary, StateApplier};
use crate::discovery::Topology;
use crate::observability::metrics;
use crate::resilience::backoff::apply_backoff;
use crate::state::{generate_state, Options};
use crate::sync::{SyncError, SyncHandle};

/// Drives reconciliation passes against a load balancer.
pub struct Syncer<A, C> {
    applier: A,
    certs: Arc<C>,
    options: Options,
    retries: RetryConfig,
    handle: SyncHandle,
}

impl<A, C> Syncer<A, C>
where
    A: StateApplier,
    C: CertificateStore + 'static,
{
    pub fn new(applier: A, certs: C, options: Options, retries: RetryConfig, handle: SyncHandle) -> Self {
        Self {
            applier,
            certs: Arc::new(certs),
            options,
            retries,
            handle,
        }
    }

    pub fn handle(&self) -> &SyncHandle {
        &self.handle
    }

    /// Process updates until the feed closes or shutdown is signalled.
    pub async fn run(self, mut updates: mpsc::UnboundedReceiver<Topology>, mut shutdown: broadcast::Receiver<()>) {
        let period = Duration::from_secs(self.retries.resync_interval_secs.max(1));
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut pending: Option<Topology> = None;

        tracing::info!(resync_secs = period.as_secs(), "Sync loop starting");

        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(mut topology) = update else {
                        tracing::info!("Topology feed closed, stopping sync loop");
                        break;
                    };
                    while let Ok(next) = updates.try_recv() {
                        topology = next;
                    }
                    pending = self.settle(topology).await;
                }
                _ = ticker.tick() => {
                    if let Some(topology) = pending.take() {
                        tracing::info!("Retrying incomplete pass");
                        pending = self.settle(topology).await;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sync loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run a pass and decide whether `topology` needs another one.
    ///
    /// A topology stays pending when the apply was abandoned or when some
    /// upstream failed synthesis and was carried over from the old snapshot.
    async fn settle(&self, topology: Topology) -> Option<Topology> {
        match self.sync(&topology).await {
            Ok(_) if self.handle.report().failed_upstreams.is_empty() => None,
            Ok(_) => {
                tracing::info!(
                    failed = ?self.handle.report().failed_upstreams,
                    "Keeping topology for resync until every upstream synthesizes"
                );
                Some(topology)
            }
            Err(_) => Some(topology),
        }
    }

    /// Run one full pass for `topology`.
    ///
    /// Synthesis writes TLS material to disk, so it runs on the blocking
    /// pool. On error the committed snapshot is left untouched.
    pub async fn sync(&self, topology: &Topology) -> Result<ApplySummary, SyncError> {
        let old = self.handle.committed();

        let pass = {
            let certs = Arc::clone(&self.certs);
            let options = self.options.clone();
            let old = Arc::clone(&old);
            let topology = topology.clone();
            task::spawn_blocking(move || generate_state(&options, &*certs, &old, &topology)).await
        };
        let pass = match pass {
            Ok(pass) => pass,
            Err(e) => {
                tracing::error!(error = %e, "Synthesis task failed, keeping previous configuration");
                self.handle.record_error(e.to_string());
                return Err(SyncError::Synthesis(e));
            }
        };

        let failed: Vec<String> = pass.failures.iter().map(|f| f.upstream.clone()).collect();
        let max_attempts = self.retries.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let start = Instant::now();

            match self.applier.apply(&old, &pass.state).await {
                Ok(summary) => {
                    metrics::record_apply("ok", start);
                    tracing::info!(
                        upstreams = topology.upstreams.len(),
                        failed = failed.len(),
                        writes = summary.writes,
                        transaction_id = summary.transaction_id.as_deref().unwrap_or("none"),
                        "Pass committed"
                    );
                    self.handle.publish(pass.state, failed, summary.transaction_id.clone());
                    return Ok(summary);
                }
                Err(e) => {
                    metrics::record_apply("error", start);

                    if attempt >= max_attempts {
                        tracing::error!(attempt, error = %e, "Apply failed, keeping previous configuration");
                        self.handle.record_error(e.to_string());
                        return Err(SyncError::Apply(e));
                    }

                    let delay = apply_backoff(attempt, &self.retries);
                    tracing::warn!(attempt, delay = ?delay, error = %e, "Apply failed, retrying");
                    time::sleep(delay).await;
                }
            }
        }
    }
}
