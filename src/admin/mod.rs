//! Admin API.
//!
//! Read-only inspection of the registry plus the host bridge: an
//! out-of-process proxy reports session events here and asks for routing
//! decisions. Every route requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::lifecycle::{Reloader, Shutdown};
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub reloader: Arc<Reloader>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .route("/admin/best", get(get_best))
        .route("/admin/reload", post(post_reload))
        .route("/admin/sessions/connect", post(post_connect))
        .route("/admin/sessions/disconnect", post(post_disconnect))
        .route("/admin/sessions/transfer", post(post_transfer))
        .route("/admin/events", post(post_event))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(Shutdown::wait(shutdown))
        .await
}
