use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admin::AdminState;
use crate::config::ConfigError;
use crate::load_balancer::{BackendId, BackendState};
use crate::routing::{RoutingDecision, SessionEvent};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub generation: u64,
    pub backends: usize,
    pub online: usize,
    pub count_underflows: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub name: BackendId,
    pub online: bool,
    pub connections: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BestServer {
    pub backend: Option<BackendId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResult {
    pub generation: u64,
    pub backends: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendRequest {
    pub backend: BackendId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: BackendId,
    pub to: BackendId,
}

/// Outcome of an accounting call. `state` is `None` for unregistered backends.
#[derive(Debug, Serialize)]
pub struct Accounted {
    pub registered: bool,
    pub state: Option<BackendState>,
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("reload rejected: {0}")]
    Reload(#[from] ConfigError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::Reload(ConfigError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Reload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let router = state.reloader.router();
    let snapshot = router.snapshot();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        generation: router.generation(),
        backends: snapshot.len(),
        online: snapshot.iter().filter(|(_, s)| s.online).count(),
        count_underflows: router.underflow_count(),
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .reloader
        .router()
        .snapshot()
        .into_iter()
        .map(|(name, s)| BackendStatus {
            name,
            online: s.online,
            connections: s.connection_count,
        })
        .collect();

    Json(statuses)
}

pub async fn get_best(State(state): State<AdminState>) -> Json<BestServer> {
    Json(BestServer {
        backend: state.reloader.router().find_best_server(),
    })
}

pub async fn post_reload(State(state): State<AdminState>) -> Result<Json<ReloadResult>, AdminError> {
    let generation = state.reloader.reload_from_disk()?;
    Ok(Json(ReloadResult {
        generation,
        backends: state.reloader.router().snapshot().len(),
    }))
}

pub async fn post_connect(
    State(state): State<AdminState>,
    Json(req): Json<BackendRequest>,
) -> Json<Accounted> {
    let router = state.reloader.router();
    let registered = router.on_connect(&req.backend);
    Json(Accounted {
        registered,
        state: router.get(&req.backend),
    })
}

pub async fn post_disconnect(
    State(state): State<AdminState>,
    Json(req): Json<BackendRequest>,
) -> Json<Accounted> {
    let router = state.reloader.router();
    let registered = router.on_disconnect(&req.backend);
    Json(Accounted {
        registered,
        state: router.get(&req.backend),
    })
}

pub async fn post_transfer(
    State(state): State<AdminState>,
    Json(req): Json<TransferRequest>,
) -> Json<[Accounted; 2]> {
    let router = state.reloader.router();
    router.on_transfer(&req.from, &req.to);

    let from = router.get(&req.from);
    let to = router.get(&req.to);
    Json([
        Accounted { registered: from.is_some(), state: from },
        Accounted { registered: to.is_some(), state: to },
    ])
}

pub async fn post_event(
    State(state): State<AdminState>,
    Json(event): Json<SessionEvent>,
) -> Json<RoutingDecision> {
    Json(state.reloader.router().handle_event(event))
}
