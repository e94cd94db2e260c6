//! One reconciliation pass over a whole topology.

use crate::certs::CertificateStore;
use crate::discovery::Topology;
use crate::observability::metrics;
use crate::state::stats::generate_stats;
use crate::state::upstream::{backend_name, frontend_name, synthesize_upstream, SynthesisError};
use crate::state::{GlobalState, Options};

/// An upstream whose synthesis was abandoned during a pass.
#[derive(Debug)]
pub struct SynthesisFailure {
    pub upstream: String,
    /// Whether the previous frontend/backend pair was carried over.
    pub retained: bool,
    pub error: SynthesisError,
}

/// Result of a pass: the new snapshot plus the upstreams that failed.
#[derive(Debug)]
pub struct Pass {
    pub state: GlobalState,
    pub failures: Vec<SynthesisFailure>,
}

/// Build a fresh snapshot for `topology` from the read-only `old` snapshot.
///
/// Upstreams are processed in topology order. When one fails, its previous
/// pair from `old` is kept as is (if it exists) and the pass continues.
pub fn generate_state(
    opts: &Options,
    certs: &dyn CertificateStore,
    old: &GlobalState,
    topology: &Topology,
) -> Pass {
    let mut state = GlobalState::default();
    let mut failures = Vec::new();

    if let Some(port) = opts.stats_port {
        state.frontends.push(generate_stats(opts, port));
    }

    for upstream in &topology.upstreams {
        match synthesize_upstream(opts, certs, upstream, old) {
            Ok((fe, be)) => {
                metrics::record_reconcile(&upstream.name, "ok");
                state.push_upstream(fe, be);
            }
            Err(error) => {
                metrics::record_reconcile(&upstream.name, "error");

                let previous = old
                    .find_frontend(&frontend_name(&upstream.name))
                    .zip(old.find_backend(&backend_name(&upstream.name)));
                let retained = previous.is_some();
                if let Some((fe, be)) = previous {
                    state.push_upstream(fe.clone(), be.clone());
                }

                tracing::warn!(
                    upstream = %upstream.name,
                    retained,
                    error = %error,
                    "Upstream synthesis failed"
                );
                failures.push(SynthesisFailure {
                    upstream: upstream.name.clone(),
                    retained,
                    error,
                });
            }
        }
    }

    Pass { state, failures }
}
