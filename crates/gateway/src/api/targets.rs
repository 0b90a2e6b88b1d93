//! `/v1/targets` — CRUD plus `triggerCheck`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use mon_domain::error::Error;
use mon_domain::types::TargetId;
use mon_storage::model::NewTarget;

use crate::state::AppState;

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn error_response(err: Error) -> Response {
    match err {
        Error::InvalidInput(msg) => api_error(StatusCode::BAD_REQUEST, msg),
        Error::NotFound(msg) => api_error(StatusCode::NOT_FOUND, msg),
        Error::Conflict(msg) => api_error(StatusCode::CONFLICT, msg),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTargetRequest {
    pub url: String,
    pub name: String,
    pub check_interval_seconds: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateTargetRequest {
    pub url: Option<String>,
    pub name: Option<String>,
    pub check_interval_seconds: Option<u32>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListTargetsQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

// ── POST /v1/targets ───────────────────────────────────────────────────

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateTargetRequest>,
) -> Response {
    let result = state
        .store
        .create_target(NewTarget {
            url: req.url,
            name: req.name,
            check_interval_seconds: req.check_interval_seconds,
            enabled: req.enabled,
        })
        .await;

    match result {
        Ok(target) => {
            if target.enabled {
                state.scheduler.reconcile().await.ok();
            }
            (StatusCode::CREATED, Json(target)).into_response()
        }
        Err(e) => error_response(e),
    }
}

// ── GET /v1/targets ─────────────────────────────────────────────────────

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListTargetsQuery>,
) -> Response {
    match state.store.list_targets(query.skip, query.limit).await {
        Ok(targets) => Json(targets).into_response(),
        Err(e) => error_response(e),
    }
}

// ── GET /v1/targets/:id ─────────────────────────────────────────────────

pub async fn get(State(state): State<AppState>, Path(id): Path<TargetId>) -> Response {
    match state.store.get_target(id).await {
        Ok(target) => Json(target).into_response(),
        Err(e) => error_response(e),
    }
}

// ── PATCH /v1/targets/:id ────────────────────────────────────────────────

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<TargetId>,
    Json(req): Json<UpdateTargetRequest>,
) -> Response {
    let patch = mon_domain::types::TargetPatch {
        url: req.url,
        name: req.name,
        check_interval_seconds: req.check_interval_seconds,
        enabled: req.enabled,
    };

    match state.store.update_target(id, patch).await {
        Ok(target) => {
            state.scheduler.reconcile().await.ok();
            Json(target).into_response()
        }
        Err(e) => error_response(e),
    }
}

// ── DELETE /v1/targets/:id ───────────────────────────────────────────────

pub async fn delete(State(state): State<AppState>, Path(id): Path<TargetId>) -> Response {
    match state.store.delete_target(id).await {
        Ok(()) => {
            state.scheduler.cancel_job(id);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

// ── POST /v1/targets/:id/check ──────────────────────────────────────────
//
// Per spec.md §6, `triggerCheck(targetId) -> Check | not-found`: runs a
// probe immediately in the foreground, bypassing the scheduler, and
// returns the recorded Check. A concurrent trigger for the same target
// coalesces onto the in-flight probe instead of running its own, in which
// case there is no freshly-recorded Check for this call to return — that
// case reports 202 Accepted with no body rather than inventing one.

pub async fn trigger_check(State(state): State<AppState>, Path(id): Path<TargetId>) -> Response {
    match state.scheduler.trigger_check(id).await {
        Ok(Some(check)) => (StatusCode::OK, Json(check)).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}
