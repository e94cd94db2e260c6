//! Apply and fetch against an in-process Data Plane API.

mod common;

use common::{start_mock_dataplane, topology, upstream};
use reqwest::Method;

use mesh_sidecar::certs::FileCertStore;
use mesh_sidecar::config::RetryConfig;
use mesh_sidecar::dataplane::fetch::fetch_state;
use mesh_sidecar::dataplane::{DataplaneError, StateApplier};
use mesh_sidecar::lifecycle::startup::initial_state;
use mesh_sidecar::lifecycle::Shutdown;
use mesh_sidecar::state::{generate_state, GlobalState, Options, SlotTarget};
use mesh_sidecar::{SyncHandle, Syncer};

fn build(certs: &FileCertStore, old: &GlobalState, nodes: &[(&str, u16)]) -> GlobalState {
    let topo = topology(vec![upstream("web", 8080, nodes)]);
    let pass = generate_state(&Options::default(), certs, old, &topo);
    assert!(pass.failures.is_empty());
    pass.state
}

fn position(requests: &[common::Recorded], method: &Method, path: &str) -> usize {
    requests
        .iter()
        .position(|r| r.is(method, path))
        .unwrap_or_else(|| panic!("no {} {} in {:?}", method, path, requests))
}

#[tokio::test]
async fn test_initial_apply_creates_in_one_transaction() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());

    let new = build(&certs, &GlobalState::default(), &[("10.0.0.1", 443)]);
    let summary = dp.apply(&GlobalState::default(), &new).await.unwrap();

    assert_eq!(summary.transaction_id.as_deref(), Some("tx-1"));

    let requests = mock.requests();
    assert!(requests[0].is(&Method::GET, "configuration/version"));
    assert!(requests[1].is(&Method::POST, "transactions"));
    assert_eq!(requests[1].query.get("version").map(String::as_str), Some("7"));
    assert!(requests.last().unwrap().is(&Method::PUT, "transactions/tx-1"));

    let backend = position(&requests, &Method::POST, "configuration/backends");
    let server = position(&requests, &Method::POST, "configuration/servers");
    let frontend = position(&requests, &Method::POST, "configuration/frontends");
    let bind = position(&requests, &Method::POST, "configuration/binds");
    assert!(backend < server && server < frontend && frontend < bind);

    assert_eq!(requests[server].query.get("backend").map(String::as_str), Some("back_web"));
    assert_eq!(requests[bind].query.get("frontend").map(String::as_str), Some("front_web"));

    for write in requests.iter().filter(|r| r.path.starts_with("configuration/") && r.method != Method::GET) {
        assert_eq!(write.query.get("transaction_id").map(String::as_str), Some("tx-1"));
    }
    assert_eq!(summary.writes, requests.iter().filter(|r| r.path.starts_with("configuration/") && r.method != Method::GET).count());
}

#[tokio::test]
async fn test_identical_state_sends_nothing() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());

    let state = build(&certs, &GlobalState::default(), &[("10.0.0.1", 443)]);
    let summary = dp.apply(&state, &state).await.unwrap();

    assert_eq!(summary.transaction_id, None);
    assert_eq!(summary.writes, 0);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_node_removal_puts_slot_in_maintenance() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());

    let old = build(&certs, &GlobalState::default(), &[("10.0.0.1", 443), ("10.0.0.2", 443)]);
    let new = build(&certs, &old, &[("10.0.0.2", 443)]);

    dp.apply(&old, &new).await.unwrap();

    let writes: Vec<_> = mock
        .writes()
        .into_iter()
        .filter(|r| r.path.starts_with("configuration/"))
        .collect();
    assert_eq!(writes.len(), 1, "{:?}", writes);
    assert!(writes[0].is(&Method::PUT, "configuration/servers/srv_0"));

    let body = writes[0].body.as_ref().unwrap();
    assert_eq!(body["name"], "srv_0");
    assert_eq!(body["address"], "127.0.0.1");
    assert_eq!(body["port"], 1);
    assert_eq!(body["maintenance"], "enabled");
    assert_eq!(body["ssl"], "enabled");
    assert_eq!(body["verify"], "required");
}

#[tokio::test]
async fn test_new_node_reuses_disabled_slot() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());

    let first = build(&certs, &GlobalState::default(), &[("10.0.0.1", 443), ("10.0.0.2", 443)]);
    let second = build(&certs, &first, &[("10.0.0.2", 443)]);
    let third = build(&certs, &second, &[("10.0.0.2", 443), ("10.0.0.3", 443)]);

    dp.apply(&second, &third).await.unwrap();

    let writes: Vec<_> = mock
        .writes()
        .into_iter()
        .filter(|r| r.path.starts_with("configuration/"))
        .collect();
    assert_eq!(writes.len(), 1, "{:?}", writes);
    assert!(writes[0].is(&Method::PUT, "configuration/servers/srv_0"));
    let body = writes[0].body.as_ref().unwrap();
    assert_eq!(body["address"], "10.0.0.3");
    assert_eq!(body["maintenance"], "disabled");
}

#[tokio::test]
async fn test_removed_upstream_is_deleted() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());

    let old = build(&certs, &GlobalState::default(), &[("10.0.0.1", 443)]);
    dp.apply(&old, &GlobalState::default()).await.unwrap();

    let writes = mock.writes();
    let fe = position(&writes, &Method::DELETE, "configuration/frontends/front_web");
    let be = position(&writes, &Method::DELETE, "configuration/backends/back_web");
    assert!(fe < be);
    assert!(writes.last().unwrap().is(&Method::PUT, "transactions/tx-1"));
}

#[tokio::test]
async fn test_failed_write_discards_transaction() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());
    mock.fail_writes_to("configuration/frontends");

    let new = build(&certs, &GlobalState::default(), &[("10.0.0.1", 443)]);
    let err = dp.apply(&GlobalState::default(), &new).await.unwrap_err();

    assert!(matches!(err, DataplaneError::Status { code: 500, .. }));

    let requests = mock.requests();
    assert!(requests.last().unwrap().is(&Method::DELETE, "transactions/tx-1"));
    assert!(!requests.iter().any(|r| r.is(&Method::PUT, "transactions/tx-1")));
}

#[tokio::test]
async fn test_fetch_state_orders_slots_by_position() {
    let (mock, dp) = start_mock_dataplane().await;
    mock.set_list("backends", serde_json::json!([{ "name": "back_web", "mode": "http" }]));
    mock.set_list(
        "servers?back_web",
        serde_json::json!([
            {
                "name": "srv_1",
                "address": "127.0.0.1",
                "port": 1,
                "maintenance": "enabled",
                "ssl": "enabled",
                "ssl_cafile": "/certs/ca.pem",
                "ssl_certificate": "/certs/cert.pem",
                "verify": "required"
            },
            {
                "name": "srv_0",
                "address": "10.0.0.1",
                "port": 443,
                "weight": 3,
                "maintenance": "disabled",
                "ssl": "enabled",
                "ssl_cafile": "/certs/ca.pem",
                "ssl_certificate": "/certs/cert.pem",
                "verify": "required"
            }
        ]),
    );

    let state = fetch_state(&dp).await.unwrap();

    assert!(state.frontends.is_empty());
    let backend = state.find_backend("back_web").unwrap();
    assert_eq!(backend.servers.len(), 2);
    assert_eq!(backend.servers[0].name, "srv_0");
    assert_eq!(
        backend.servers[0].target,
        SlotTarget::Active {
            address: "10.0.0.1".into(),
            port: 443,
            weight: 3
        }
    );
    assert_eq!(backend.servers[1].target, SlotTarget::Disabled);
    assert_eq!(backend.servers[1].ca_file, "/certs/ca.pem");
}

#[tokio::test]
async fn test_syncer_publishes_after_commit() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();

    let handle = SyncHandle::default();
    let syncer = Syncer::new(
        dp,
        FileCertStore::new(dir.path()),
        Options::default(),
        RetryConfig {
            max_attempts: 1,
            ..Default::default()
        },
        handle.clone(),
    );

    let topo = topology(vec![upstream("web", 8080, &[("10.0.0.1", 443)])]);
    syncer.sync(&topo).await.unwrap();

    assert!(handle.committed().find_backend("back_web").is_some());
    assert_eq!(handle.report().commits, 1);
    assert_eq!(handle.report().last_transaction_id.as_deref(), Some("tx-1"));

    mock.clear();
    syncer.sync(&topo).await.unwrap();
    assert!(mock.requests().is_empty());
    assert_eq!(handle.report().commits, 2);
}

#[tokio::test]
async fn test_syncer_keeps_snapshot_on_failure() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    mock.fail_writes_to("configuration/backends");

    let handle = SyncHandle::default();
    let syncer = Syncer::new(
        dp,
        FileCertStore::new(dir.path()),
        Options::default(),
        RetryConfig {
            max_attempts: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..Default::default()
        },
        handle.clone(),
    );

    let topo = topology(vec![upstream("web", 8080, &[("10.0.0.1", 443)])]);
    assert!(syncer.sync(&topo).await.is_err());

    assert!(handle.committed().backends.is_empty());
    assert_eq!(handle.report().commits, 0);
    assert!(handle.report().last_error.is_some());

    let discarded = mock
        .requests()
        .iter()
        .filter(|r| r.is(&Method::DELETE, "transactions/tx-1"))
        .count();
    assert_eq!(discarded, 2);
}

fn fast_retries() -> RetryConfig {
    RetryConfig {
        max_attempts: 1,
        base_delay_ms: 1,
        max_delay_ms: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_startup_waits_for_running_configuration() {
    let (mock, dp) = start_mock_dataplane().await;
    let dir = tempfile::tempdir().unwrap();
    let certs = FileCertStore::new(dir.path());

    mock.set_list("backends", serde_json::json!([{ "name": "back_web", "mode": "http" }]));
    mock.set_list(
        "servers?back_web",
        serde_json::json!([{
            "name": "srv_0",
            "address": "10.0.0.1",
            "port": 443,
            "weight": 1,
            "maintenance": "disabled",
            "ssl": "enabled",
            "verify": "required"
        }]),
    );
    // More failures than the configured attempts.
    mock.fail_next_reads(4);

    let shutdown = Shutdown::new();
    let old = initial_state(&dp, &fast_retries(), shutdown.subscribe())
        .await
        .expect("running configuration");
    assert_eq!(old.find_backend("back_web").unwrap().servers.len(), 1);

    mock.clear();
    let new = build(&certs, &old, &[("10.0.0.1", 443)]);
    dp.apply(&old, &new).await.unwrap();

    let writes = mock.writes();
    assert!(!writes.iter().any(|r| r.is(&Method::POST, "configuration/backends")), "{:?}", writes);
    assert!(!writes.iter().any(|r| r.is(&Method::POST, "configuration/servers")), "{:?}", writes);
    position(&writes, &Method::PUT, "configuration/backends/back_web");
    position(&writes, &Method::PUT, "configuration/servers/srv_0");
}

#[tokio::test]
async fn test_startup_fetch_gives_up_on_shutdown() {
    let (mock, dp) = start_mock_dataplane().await;
    mock.fail_next_reads(usize::MAX);

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    shutdown.trigger();

    assert!(initial_state(&dp, &fast_retries(), rx).await.is_none());
}
