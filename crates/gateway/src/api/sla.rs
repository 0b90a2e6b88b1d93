//! `GET /v1/sla` — point-in-time or bucketed availability/latency metrics.
//!
//! `target_id`, `start`, and `end` are all optional, matching the
//! `metrics(targetId?, start?, end?) -> [...]` operation: an omitted
//! `target_id` reports every target, and an omitted range defaults to the
//! last 30 days. The response is always an array, one entry per target
//! (and, with `bucket` set, one array of buckets per target).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use mon_domain::types::TargetId;
use mon_engine::sla::Bucket;

use crate::state::AppState;

const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct SlaQuery {
    pub target_id: Option<TargetId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub bucket: Option<BucketParam>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketParam {
    Day,
    Week,
    Month,
}

impl From<BucketParam> for Bucket {
    fn from(value: BucketParam) -> Self {
        match value {
            BucketParam::Day => Bucket::Day,
            BucketParam::Week => Bucket::Week,
            BucketParam::Month => Bucket::Month,
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

pub async fn metrics(State(state): State<AppState>, Query(query): Query<SlaQuery>) -> Response {
    let end = query.end.unwrap_or_else(Utc::now);
    let start = query
        .start
        .unwrap_or_else(|| end - Duration::days(DEFAULT_RANGE_DAYS));

    if start >= end {
        return error_response(StatusCode::BAD_REQUEST, "start must be before end");
    }

    let target_ids = match query.target_id {
        Some(id) => vec![id],
        None => match state.store.list_targets(0, usize::MAX).await {
            Ok(targets) => targets.into_iter().map(|t| t.id).collect(),
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        },
    };

    let mut results = Vec::with_capacity(target_ids.len());
    for target_id in target_ids {
        let computed = match query.bucket {
            None => state
                .sla
                .metrics(target_id, start, end)
                .await
                .map(|m| serde_json::json!(m)),
            Some(bucket) => state
                .sla
                .bucketed_metrics(target_id, start, end, bucket.into())
                .await
                .map(|buckets| serde_json::json!(buckets)),
        };

        match computed {
            Ok(value) => results.push(value),
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }

    Json(results).into_response()
}
