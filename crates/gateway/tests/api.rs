//! End-to-end coverage of the HTTP surface: build an `AppState` by hand
//! (skipping `bootstrap::build_app_state`'s real Chromium launch, which
//! needs an actual browser binary) and drive requests through the router
//! with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use mon_domain::config::Config;
use mon_domain::types::Target;
use mon_engine::{Broadcaster, CircuitBreaker, DebugSessionEngine, Scheduler, SlaAnalytics};
use mon_gateway::{api, AppState};
use mon_probe::browser::{BrowserPool, BrowsingContext, NavigationOutcome};
use mon_probe::{CaptureSink, Probe, ProbeOutcome};
use mon_storage::MemStore;

struct NeverProbed;

#[async_trait]
impl Probe for NeverProbed {
    async fn check(&self, _target: &Target) -> ProbeOutcome {
        ProbeOutcome::success(200, 5.0, chrono::Utc::now())
    }
}

struct InertBrowserPool;

struct InertContext;

#[async_trait]
impl BrowserPool for InertBrowserPool {
    async fn acquire_context(&self) -> mon_domain::error::Result<Box<dyn BrowsingContext>> {
        Ok(Box::new(InertContext))
    }
}

#[async_trait]
impl BrowsingContext for InertContext {
    async fn navigate(
        &mut self,
        _url: &str,
        _timeout: Duration,
        _sink: Option<Arc<dyn CaptureSink>>,
    ) -> mon_domain::error::Result<NavigationOutcome> {
        Ok(NavigationOutcome { status: Some(200) })
    }

    async fn close(self: Box<Self>) -> mon_domain::error::Result<()> {
        Ok(())
    }
}

fn test_state() -> AppState {
    let config = Arc::new(Config::default());
    let store = Arc::new(MemStore::new());
    let breaker = Arc::new(CircuitBreaker::new(config.breaker.clone()));
    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        Arc::new(NeverProbed),
        breaker.clone(),
        config.scheduler.grace_period_seconds,
    ));
    let broadcaster = Arc::new(Broadcaster::new());
    let debug_engine = Arc::new(DebugSessionEngine::new(
        store.clone(),
        Arc::new(InertBrowserPool),
        broadcaster.clone(),
        config.debug.clone(),
    ));
    let sla = Arc::new(SlaAnalytics::new(
        store.clone(),
        config.sla.cache_ttl_seconds,
        config.sla.cache_enabled,
    ));

    AppState {
        config,
        store,
        scheduler,
        breaker,
        debug_engine,
        broadcaster,
        sla,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_then_get_target_round_trips() {
    let app = api::router().with_state(test_state());

    let create = Request::builder()
        .method(Method::POST)
        .uri("/v1/targets")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "url": "https://example.com",
                "name": "example",
                "check_interval_seconds": 60
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_u64().unwrap();
    assert_eq!(created["url"], "https://example.com");

    let get = Request::builder()
        .uri(format!("/v1/targets/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["id"], id);
}

#[tokio::test]
async fn create_target_rejects_invalid_url_with_400() {
    let app = api::router().with_state(test_state());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/targets")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "url": "not-a-url",
                "name": "bad",
                "check_interval_seconds": 60
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_target_is_404() {
    let app = api::router().with_state(test_state());

    let request = Request::builder()
        .uri("/v1/targets/999")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sla_metrics_over_an_empty_range_reports_null_stats() {
    let state = test_state();
    let target = state
        .store
        .create_target(mon_storage::model::NewTarget {
            url: "https://example.com".into(),
            name: "example".into(),
            check_interval_seconds: 60,
            enabled: true,
        })
        .await
        .unwrap();

    let app = api::router().with_state(state);
    let start = chrono::Utc::now() - chrono::Duration::hours(1);
    let end = chrono::Utc::now();
    let uri = format!(
        "/v1/sla?target_id={}&start={}&end={}",
        target.id,
        start.to_rfc3339(),
        end.to_rfc3339()
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let metrics = body_json(response).await;
    assert_eq!(metrics[0]["total_checks"], 0);
}

#[tokio::test]
async fn sla_metrics_without_a_target_id_reports_every_target() {
    let state = test_state();
    state
        .store
        .create_target(mon_storage::model::NewTarget {
            url: "https://a.example".into(),
            name: "a".into(),
            check_interval_seconds: 60,
            enabled: true,
        })
        .await
        .unwrap();
    state
        .store
        .create_target(mon_storage::model::NewTarget {
            url: "https://b.example".into(),
            name: "b".into(),
            check_interval_seconds: 60,
            enabled: true,
        })
        .await
        .unwrap();

    let app = api::router().with_state(state);
    let request = Request::builder()
        .uri("/v1/sla")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let metrics = body_json(response).await;
    assert_eq!(metrics.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn second_debug_session_for_same_target_conflicts_with_409() {
    let state = test_state();
    let target = state
        .store
        .create_target(mon_storage::model::NewTarget {
            url: "https://example.com".into(),
            name: "example".into(),
            check_interval_seconds: 60,
            enabled: true,
        })
        .await
        .unwrap();

    let app = api::router().with_state(state);

    let create_session = || {
        Request::builder()
            .method(Method::POST)
            .uri("/v1/debug/sessions")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "target_id": target.id }).to_string(),
            ))
            .unwrap()
    };
    let start_session = |id: u64| {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/v1/debug/sessions/{id}/start"))
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(create_session()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    let first_id = first["id"].as_u64().unwrap();

    let started = app
        .clone()
        .oneshot(start_session(first_id))
        .await
        .unwrap();
    assert_eq!(started.status(), StatusCode::OK);

    let second = app.oneshot(create_session()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}
