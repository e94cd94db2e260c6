//! Reading the live configuration back into a snapshot.

use crate::dataplane::client::Dataplane;
use crate::dataplane::models::{FilterType, Server};
use crate::dataplane::{DataplaneResult, Parent};
use crate::state::{Backend, Frontend, GlobalState, Slot};

/// Read every frontend and backend, with the children this sidecar manages.
///
/// Used once at startup so that slot positions survive a sidecar restart.
pub async fn fetch_state(dp: &Dataplane) -> DataplaneResult<GlobalState> {
    let mut state = GlobalState::default();

    for frontend in dp.frontends().await? {
        let parent = Parent::Frontend(frontend.name.clone());

        let bind = dp.binds(&frontend.name).await?.into_iter().next().unwrap_or_default();
        let filter_compression = dp
            .filters(&parent)
            .await?
            .into_iter()
            .find(|f| f.filter_type == FilterType::Compression);
        let log_target = dp.log_targets(&parent).await?.into_iter().next();
        let http_request_rules = dp.http_request_rules(&parent).await?;
        let http_response_rules = dp.http_response_rules(&parent).await?;

        state.frontends.push(Frontend {
            frontend,
            bind,
            filter_compression,
            log_target,
            http_request_rules,
            http_response_rules,
        });
    }

    for backend in dp.backends().await? {
        let parent = Parent::Backend(backend.name.clone());

        let log_target = dp.log_targets(&parent).await?.into_iter().next();
        let mut servers = dp.servers(&backend.name).await?;
        sort_by_slot(&mut servers);

        state.backends.push(Backend {
            backend,
            log_target,
            servers: servers.iter().map(Slot::from_server).collect(),
        });
    }

    tracing::info!(
        frontends = state.frontends.len(),
        backends = state.backends.len(),
        "Fetched running configuration"
    );
    Ok(state)
}

/// Order servers by the position encoded in `srv_<n>`. Foreign names keep
/// their relative order after all positional ones.
fn sort_by_slot(servers: &mut [Server]) {
    servers.sort_by_key(|s| {
        s.name
            .strip_prefix("srv_")
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(usize::MAX)
    });
}
