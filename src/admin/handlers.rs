use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::state::{GlobalState, SlotTarget};
use crate::sync::SyncReport;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub upstreams: usize,
    pub sync: SyncReport,
}

#[derive(Serialize)]
pub struct SlotStatus {
    pub name: String,
    pub address: Option<String>,
    pub weight: Option<u32>,
    pub active: bool,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub active: usize,
    pub disabled: usize,
    pub slots: Vec<SlotStatus>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        upstreams: state.sync.committed().backends.len(),
        sync: SyncReport::clone(&state.sync.report()),
    })
}

pub async fn get_state(State(state): State<AdminState>) -> Json<GlobalState> {
    Json(GlobalState::clone(&state.sync.committed()))
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let committed = state.sync.committed();

    let statuses = committed
        .backends
        .iter()
        .map(|b| {
            let slots: Vec<SlotStatus> = b
                .servers
                .iter()
                .map(|s| match &s.target {
                    SlotTarget::Active { address, port, weight } => SlotStatus {
                        name: s.name.clone(),
                        address: Some(format!("{}:{}", address, port)),
                        weight: Some(*weight),
                        active: true,
                    },
                    SlotTarget::Disabled => SlotStatus {
                        name: s.name.clone(),
                        address: None,
                        weight: None,
                        active: false,
                    },
                })
                .collect();
            let active = slots.iter().filter(|s| s.active).count();

            BackendStatus {
                name: b.name().to_string(),
                active,
                disabled: slots.len() - active,
                slots,
            }
        })
        .collect();

    Json(statuses)
}
