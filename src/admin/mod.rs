//! Read-only admin API.
//!
//! Exposes the committed snapshot and the sync report over HTTP, behind a
//! bearer token.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use crate::sync::SyncHandle;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub sync: SyncHandle,
    pub api_key: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/state", get(get_state))
        .route("/admin/backends", get(get_backends))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
