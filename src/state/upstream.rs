//! Frontend and backend synthesis for a single upstream.

use thiserror::Error;

use crate::certs::{CertError, CertificateStore};
use crate::dataplane::models;
use crate::discovery::{Protocol, Upstream};
use crate::observability::metrics;
use crate::state::servers::reconcile_servers;
use crate::state::{Backend, Frontend, GlobalState, Options};

/// Errors that abandon synthesis of one upstream.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("certificate resolution failed for upstream '{upstream}': {source}")]
    Certificates {
        upstream: String,
        #[source]
        source: CertError,
    },
}

pub fn frontend_name(upstream: &str) -> String {
    format!("front_{}", upstream)
}

pub fn backend_name(upstream: &str) -> String {
    format!("back_{}", upstream)
}

/// Build the frontend/backend pair for `upstream`.
///
/// Server slots are reconciled against the backend of the same name in
/// `old`; a missing backend means this is the upstream's first pass.
pub fn synthesize_upstream(
    opts: &Options,
    certs: &dyn CertificateStore,
    upstream: &Upstream,
    old: &GlobalState,
) -> Result<(Frontend, Backend), SynthesisError> {
    let fe_name = frontend_name(&upstream.name);
    let be_name = backend_name(&upstream.name);

    let mode = match upstream.protocol {
        Protocol::Tcp => models::Mode::Tcp,
        Protocol::Http => models::Mode::Http,
    };
    let read_timeout = millis(upstream.read_timeout);

    let mut fe = Frontend {
        frontend: models::Frontend {
            name: fe_name.clone(),
            default_backend: Some(be_name.clone()),
            client_timeout: Some(read_timeout),
            mode,
            httplog: opts.log_requests && mode == models::Mode::Http,
            ..Default::default()
        },
        bind: models::Bind {
            name: format!("{}_bind", fe_name),
            address: upstream.local_bind_address.clone(),
            port: Some(i64::from(upstream.local_bind_port)),
        },
        filter_compression: Some(models::Filter {
            index: 0,
            filter_type: models::FilterType::Compression,
        }),
        log_target: opts.log_target(),
        ..Default::default()
    };

    if let Some(header) = opts.response_header_name.as_deref().filter(|h| !h.is_empty()) {
        if mode == models::Mode::Http {
            fe.http_response_rules.push(models::HttpResponseRule {
                index: fe.http_response_rules.len() as i64,
                rule_type: models::HttpRuleType::SetHeader,
                hdr_name: Some(header.to_string()),
                hdr_format: Some("true".to_string()),
            });
        }
    }

    let paths = certs
        .certs_path(&upstream.tls)
        .map_err(|source| SynthesisError::Certificates {
            upstream: upstream.name.clone(),
            source,
        })?;

    let previous = old
        .find_backend(&be_name)
        .map(|b| b.servers.as_slice())
        .unwrap_or_default();
    let servers = reconcile_servers(previous, &upstream.nodes, &paths);

    let active = servers.iter().filter(|s| s.is_active()).count();
    metrics::record_backend_slots(&be_name, active, servers.len() - active);
    tracing::debug!(
        backend = %be_name,
        previous = previous.len(),
        slots = servers.len(),
        active,
        "Reconciled server slots"
    );

    let be = Backend {
        backend: models::Backend {
            name: be_name,
            server_timeout: Some(read_timeout),
            connect_timeout: Some(millis(upstream.connect_timeout)),
            balance: Some(models::Balance {
                algorithm: models::BalanceAlgorithm::Leastconn,
            }),
            mode,
        },
        log_target: opts.log_target(),
        servers,
    };

    Ok((fe, be))
}

fn millis(d: std::time::Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::CertPaths;
    use crate::discovery::{TlsConfig, UpstreamNode};
    use std::path::PathBuf;
    use std::time::Duration;

    struct StaticCerts;

    impl CertificateStore for StaticCerts {
        fn certs_path(&self, _tls: &TlsConfig) -> Result<CertPaths, CertError> {
            Ok(CertPaths {
                ca_file: PathBuf::from("/ca.pem"),
                cert_file: PathBuf::from("/cert.pem"),
            })
        }
    }

    struct BrokenCerts;

    impl CertificateStore for BrokenCerts {
        fn certs_path(&self, _tls: &TlsConfig) -> Result<CertPaths, CertError> {
            Err(CertError::MissingMaterial("no certificate"))
        }
    }

    fn upstream(protocol: Protocol) -> Upstream {
        Upstream {
            name: "web".into(),
            local_bind_address: "127.0.0.1".into(),
            local_bind_port: 9000,
            protocol,
            read_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_millis(500),
            tls: TlsConfig::default(),
            nodes: vec![UpstreamNode {
                host: "10.0.0.1".into(),
                port: 8080,
                weight: 1,
            }],
        }
    }

    fn opts() -> Options {
        Options {
            log_requests: true,
            log_socket: Some("/dev/log".into()),
            response_header_name: Some("X-Mesh-Upstream".into()),
            stats_port: None,
        }
    }

    #[test]
    fn test_http_upstream() {
        let (fe, be) = synthesize_upstream(&opts(), &StaticCerts, &upstream(Protocol::Http), &GlobalState::default()).unwrap();

        assert_eq!(fe.name(), "front_web");
        assert_eq!(fe.frontend.default_backend.as_deref(), Some("back_web"));
        assert_eq!(fe.frontend.client_timeout, Some(2000));
        assert_eq!(fe.bind.name, "front_web_bind");
        assert_eq!(fe.bind.port, Some(9000));
        assert_eq!(fe.filter_compression.as_ref().map(|f| f.index), Some(0));
        assert!(fe.log_target.is_some());
        assert_eq!(fe.http_response_rules.len(), 1);
        assert_eq!(fe.http_response_rules[0].hdr_format.as_deref(), Some("true"));

        assert_eq!(be.name(), "back_web");
        assert_eq!(be.backend.server_timeout, Some(2000));
        assert_eq!(be.backend.connect_timeout, Some(500));
        assert_eq!(
            be.backend.balance.as_ref().map(|b| b.algorithm),
            Some(models::BalanceAlgorithm::Leastconn)
        );
        assert!(be.log_target.is_some());
        assert_eq!(be.servers.len(), 1);
        assert_eq!(be.servers[0].ca_file, "/ca.pem");
    }

    #[test]
    fn test_tcp_upstream_has_no_header_rule() {
        let (fe, be) = synthesize_upstream(&opts(), &StaticCerts, &upstream(Protocol::Tcp), &GlobalState::default()).unwrap();

        assert_eq!(fe.frontend.mode, models::Mode::Tcp);
        assert_eq!(be.backend.mode, models::Mode::Tcp);
        assert!(fe.http_response_rules.is_empty());
        assert!(!fe.frontend.httplog);
        assert!(fe.filter_compression.is_some());
    }

    #[test]
    fn test_logging_disabled() {
        let opts = Options {
            log_requests: false,
            ..opts()
        };
        let (fe, be) = synthesize_upstream(&opts, &StaticCerts, &upstream(Protocol::Http), &GlobalState::default()).unwrap();
        assert!(fe.log_target.is_none());
        assert!(be.log_target.is_none());
    }

    #[test]
    fn test_previous_slots_are_reused() {
        let mut up = upstream(Protocol::Http);
        let (fe, be) = synthesize_upstream(&opts(), &StaticCerts, &up, &GlobalState::default()).unwrap();
        let mut old = GlobalState::default();
        old.push_upstream(fe, be);

        up.nodes.clear();
        let (_, be) = synthesize_upstream(&opts(), &StaticCerts, &up, &old).unwrap();
        assert_eq!(be.servers.len(), 1);
        assert!(!be.servers[0].is_active());
    }

    #[test]
    fn test_certificate_failure() {
        let err = synthesize_upstream(&opts(), &BrokenCerts, &upstream(Protocol::Http), &GlobalState::default()).unwrap_err();
        assert!(err.to_string().contains("'web'"));
    }
}
