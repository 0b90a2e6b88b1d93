//! `/v1/debug/sessions` — browser-backed debug session lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use mon_domain::error::Error;
use mon_domain::types::{NetworkEventKind, ResourceType, SessionId, TargetId};
use mon_storage::model::NetworkEventFilter;

use crate::state::AppState;

fn error_response(err: Error) -> Response {
    let status = match err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub target_id: TargetId,
    pub duration_limit_seconds: Option<u32>,
}

// ── POST /v1/debug/sessions ──────────────────────────────────────────────
//
// Creates a `pending` session row only — no browser context is acquired
// here. The caller must follow up with `POST .../:id/start` to run the
// start sequence.

pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    match state
        .debug_engine
        .create_session(req.target_id, req.duration_limit_seconds)
        .await
    {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

// ── POST /v1/debug/sessions/:id/start ────────────────────────────────────
//
// Runs the start sequence on a `pending` session: acquires a browsing
// context, navigates, and transitions to `active` (or `failed`).

pub async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Response {
    match state.debug_engine.start_session(id).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

// ── POST /v1/debug/sessions/:id/stop ─────────────────────────────────────

pub async fn stop_session(State(state): State<AppState>, Path(id): Path<SessionId>) -> Response {
    match state.debug_engine.stop_session(id).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

// ── GET /v1/debug/sessions/:id ───────────────────────────────────────────

pub async fn get_session(State(state): State<AppState>, Path(id): Path<SessionId>) -> Response {
    match state.debug_engine.get_session(id).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

// ── GET /v1/debug/sessions/:id/events ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub kind: Option<NetworkEventKind>,
    pub resource_type: Option<ResourceType>,
}

fn default_limit() -> usize {
    200
}

pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Query(query): Query<ListEventsQuery>,
) -> Response {
    let filter = NetworkEventFilter {
        kind: query.kind,
        resource_type: query.resource_type,
    };

    let network = state
        .store
        .list_network_events(id, query.skip, query.limit, filter)
        .await;
    let console = state
        .store
        .list_console_messages(id, query.skip, query.limit)
        .await;

    match (network, console) {
        (Ok(network_events), Ok(console_messages)) => Json(serde_json::json!({
            "network_events": network_events,
            "console_messages": console_messages,
        }))
        .into_response(),
        (Err(e), _) | (_, Err(e)) => error_response(e),
    }
}
