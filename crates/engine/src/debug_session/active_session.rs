use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use mon_domain::config::DebugConfig;
use mon_domain::error::Result;
use mon_domain::trace::TraceEvent;
use mon_domain::types::{truncate_utf8, DebugSession, SessionId, SessionStatus, Target, TargetId};
use mon_probe::{BrowserPool, BrowsingContext, CaptureSink, CapturedEvent};
use mon_storage::model::{NewConsoleMessage, NewNetworkEvent};
use mon_storage::Store;

use crate::broadcaster::{Broadcaster, DebugMessage};

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// One running debug session: an isolated browsing context, its capture
/// buffers, and the background tasks that flush them and enforce the
/// session's duration limit.
///
/// Implements [`CaptureSink`] directly so the same object that owns the
/// buffers is the thing `BrowsingContext::navigate` forwards events into —
/// no separate adapter type needed. The browsing context itself lives
/// behind a lock rather than a dedicated field on the session's "happy
/// path" struct so that closing it (which takes the context by value) can
/// `take()` it out from under a shared `Arc<ActiveSession>`.
pub struct ActiveSession {
    pub session_id: SessionId,
    pub target_id: TargetId,
    context: Mutex<Option<Box<dyn BrowsingContext>>>,
    network_buffer: Mutex<Vec<NewNetworkEvent>>,
    console_buffer: Mutex<Vec<NewConsoleMessage>>,
    body_byte_limit: usize,
    stop: CancellationToken,
    flush_done: Notify,
}

impl ActiveSession {
    fn new(session_id: SessionId, target_id: TargetId, body_byte_limit: usize) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            target_id,
            context: Mutex::new(None),
            network_buffer: Mutex::new(Vec::new()),
            console_buffer: Mutex::new(Vec::new()),
            body_byte_limit,
            stop: CancellationToken::new(),
            flush_done: Notify::new(),
        })
    }

    fn drain(&self) -> (Vec<NewNetworkEvent>, Vec<NewConsoleMessage>) {
        let network = std::mem::take(&mut *self.network_buffer.lock());
        let console = std::mem::take(&mut *self.console_buffer.lock());
        (network, console)
    }

    async fn flush_once(&self, store: &Arc<dyn Store>, broadcaster: &Arc<Broadcaster>) {
        let (network, console) = self.drain();
        if network.is_empty() && console.is_empty() {
            return;
        }

        let network_count = network.len();
        let console_count = console.len();

        match store.insert_network_events_batch(network).await {
            Ok(events) => {
                for event in events {
                    broadcaster.broadcast(self.session_id, DebugMessage::NetworkEvent { event });
                }
            }
            Err(err) => tracing::warn!(
                session_id = self.session_id,
                error = %err,
                "failed to persist buffered network events"
            ),
        }

        match store.insert_console_messages_batch(console).await {
            Ok(messages) => {
                for message in messages {
                    broadcaster.broadcast(self.session_id, DebugMessage::ConsoleError { message });
                }
            }
            Err(err) => tracing::warn!(
                session_id = self.session_id,
                error = %err,
                "failed to persist buffered console messages"
            ),
        }

        TraceEvent::DebugSessionFlush {
            session_id: self.session_id,
            network_events: network_count,
            console_messages: console_count,
        }
        .emit();
    }

    async fn await_flush_exit(&self) {
        self.flush_done.notified().await;
    }
}

impl CaptureSink for ActiveSession {
    fn capture(&self, event: CapturedEvent) {
        match event {
            CapturedEvent::Network(capture) => {
                let request_body = capture
                    .request_body
                    .map(|b| truncate_utf8(&b, self.body_byte_limit));
                let response_body = capture.response_body.and_then(|b| {
                    response_body_capturable(capture.response_headers.as_deref())
                        .then(|| truncate_utf8(&b, self.body_byte_limit))
                });
                self.network_buffer.lock().push(NewNetworkEvent {
                    session_id: self.session_id,
                    kind: capture.kind,
                    url: capture.url,
                    method: capture.method,
                    status: capture.status,
                    request_headers: capture.request_headers,
                    response_headers: capture.response_headers,
                    request_body,
                    response_body,
                    resource_type: capture.resource_type,
                    timestamp: capture.timestamp,
                    duration_ms: capture.duration_ms,
                });
            }
            CapturedEvent::Console(capture) => {
                if !capture.level.is_captured() {
                    return;
                }
                self.console_buffer.lock().push(NewConsoleMessage {
                    session_id: self.session_id,
                    level: capture.level,
                    message: capture.message,
                    timestamp: capture.timestamp,
                });
            }
        }
    }
}

/// Only capture response bodies whose `content-type` looks like text.
/// `headers` is the response's serialized-JSON header map, if present.
fn response_body_capturable(headers: Option<&str>) -> bool {
    let Some(headers) = headers else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(headers) else {
        return false;
    };
    let Some(map) = value.as_object() else {
        return false;
    };
    map.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("content-type")
            && v.as_str()
                .map(|ct| {
                    let ct = ct.to_ascii_lowercase();
                    ct.contains("json")
                        || ct.contains("text")
                        || ct.contains("xml")
                        || ct.contains("html")
                })
                .unwrap_or(false)
    })
}

/// Runs the session's start sequence synchronously: acquire a browsing
/// context, attach this session as its capture sink, navigate to the
/// target's URL, then launch the flush and deadline tasks. Returns the
/// final persisted [`DebugSession`] (`active` on success, `failed`
/// otherwise) and, on success, the live [`ActiveSession`] handle.
pub async fn start(
    store: Arc<dyn Store>,
    pool: Arc<dyn BrowserPool>,
    broadcaster: Arc<Broadcaster>,
    config: DebugConfig,
    pending: DebugSession,
    target: Target,
) -> (DebugSession, Option<Arc<ActiveSession>>) {
    let session = ActiveSession::new(pending.id, pending.target_id, config.body_byte_limit);

    match run_start_sequence(&pool, &session, &target).await {
        Ok(()) => {
            let updated = match store
                .transition_session(pending.id, SessionStatus::Active, None)
                .await
            {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!(session_id = pending.id, error = %err, "failed to record active transition");
                    cleanup_context(&session).await;
                    return (pending, None);
                }
            };

            spawn_flush_task(
                session.clone(),
                store.clone(),
                broadcaster.clone(),
                Duration::from_millis(config.flush_interval_ms),
            );

            TraceEvent::DebugSessionStarted {
                session_id: updated.id,
                target_id: updated.target_id,
            }
            .emit();
            broadcaster.broadcast(
                updated.id,
                DebugMessage::Status {
                    status: "active".into(),
                    detail: None,
                    at: Utc::now(),
                },
            );

            (updated, Some(session))
        }
        Err(err) => {
            let detail = err.to_string();
            cleanup_context(&session).await;
            let updated = store
                .transition_session(pending.id, SessionStatus::Failed, Some(detail.clone()))
                .await
                .unwrap_or(pending);

            broadcaster.broadcast(
                updated.id,
                DebugMessage::Status {
                    status: "failed".into(),
                    detail: Some(detail),
                    at: Utc::now(),
                },
            );
            (updated, None)
        }
    }
}

async fn run_start_sequence(
    pool: &Arc<dyn BrowserPool>,
    session: &Arc<ActiveSession>,
    target: &Target,
) -> Result<()> {
    let mut context = pool.acquire_context().await?;
    let sink: Arc<dyn CaptureSink> = session.clone();

    let result = context
        .navigate(&target.url, NAVIGATION_TIMEOUT, Some(sink))
        .await;

    *session.context.lock() = Some(context);
    result.map(|_| ())
}

async fn cleanup_context(session: &Arc<ActiveSession>) {
    let held = session.context.lock().take();
    if let Some(context) = held {
        if let Err(err) = context.close().await {
            tracing::warn!(session_id = session.session_id, error = %err, "failed to close browsing context during cleanup");
        }
    }
}

fn spawn_flush_task(
    session: Arc<ActiveSession>,
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
    interval: Duration,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = session.stop.cancelled() => {
                    session.flush_once(&store, &broadcaster).await;
                    session.flush_done.notify_one();
                    return;
                }
                _ = tokio::time::sleep(interval) => {
                    session.flush_once(&store, &broadcaster).await;
                }
            }
        }
    });
}

/// Stop an active session: signal the flush task, await its final flush,
/// then close the held browsing context. Idempotent: cancelling an
/// already-cancelled token is a no-op and a second `stop()` call simply
/// awaits the same (already-fired) notification again.
pub async fn stop(session: &Arc<ActiveSession>) {
    session.stop.cancel();
    session.await_flush_exit().await;
    cleanup_context(session).await;
}

/// Resolves once the session's deadline (`duration_limit_seconds` from the
/// moment this is spawned) elapses, unless `stop()` is called first. The
/// engine owns what happens after the deadline fires (recording the
/// `timeout` terminal status is a Store concern `ActiveSession` doesn't
/// have access to).
pub async fn wait_for_deadline(session: &Arc<ActiveSession>, limit: Duration) -> bool {
    tokio::select! {
        _ = session.stop.cancelled() => false,
        _ = tokio::time::sleep(limit) => true,
    }
}
