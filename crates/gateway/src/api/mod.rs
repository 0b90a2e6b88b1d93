pub mod debug;
pub mod sla;
pub mod targets;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health))
        // Targets
        .route("/v1/targets", post(targets::create).get(targets::list))
        .route(
            "/v1/targets/:id",
            get(targets::get)
                .patch(targets::update)
                .delete(targets::delete),
        )
        .route("/v1/targets/:id/check", post(targets::trigger_check))
        // SLA analytics
        .route("/v1/sla", get(sla::metrics))
        // Debug sessions
        .route("/v1/debug/sessions", post(debug::create_session))
        .route("/v1/debug/sessions/:id/start", post(debug::start_session))
        .route("/v1/debug/sessions/:id/stop", post(debug::stop_session))
        .route("/v1/debug/sessions/:id", get(debug::get_session))
        .route(
            "/v1/debug/sessions/:id/events",
            get(debug::list_events),
        )
        .route("/v1/debug/sessions/:id/ws", get(ws::subscribe))
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
