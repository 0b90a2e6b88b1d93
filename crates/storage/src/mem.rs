//! In-memory reference [`Store`] implementation. Each table is a
//! `parking_lot::RwLock`-guarded map keyed by owner id, mirroring the
//! `SessionStore` convention of one `RwLock<HashMap<_, _>>` per persisted
//! collection with id counters minted locally rather than by a database
//! sequence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::clock::{self, Clock};

use mon_domain::error::{Error, Result};
use mon_domain::types::{
    Check, ConsoleMessage, DebugSession, DowntimeAction, DowntimeWindow, NetworkEvent, SessionId,
    SessionStatus, Target, TargetId, TargetPatch, MAX_CHECK_INTERVAL_SECONDS, MAX_NAME_BYTES,
    MAX_URL_BYTES, MIN_CHECK_INTERVAL_SECONDS,
};

use crate::model::{NetworkEventFilter, NewCheck, NewConsoleMessage, NewNetworkEvent, NewTarget};
use crate::store::Store;

#[derive(Default)]
struct Ids {
    target: AtomicU64,
    check: AtomicU64,
    window: AtomicU64,
    session: AtomicU64,
    network_event: AtomicU64,
    console_message: AtomicU64,
}

impl Ids {
    fn next(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// In-memory `Store`. Not persisted across process restarts; the
/// transactional contract is provided by holding the relevant lock for the
/// duration of each logical operation rather than by a real WAL.
pub struct MemStore {
    ids: Ids,
    clock: Arc<dyn Clock>,
    targets: RwLock<HashMap<TargetId, Target>>,
    checks: RwLock<HashMap<TargetId, Vec<Check>>>,
    windows: RwLock<HashMap<TargetId, Vec<DowntimeWindow>>>,
    sessions: RwLock<HashMap<SessionId, DebugSession>>,
    active_session_by_target: RwLock<HashMap<TargetId, SessionId>>,
    network_events: RwLock<HashMap<SessionId, Vec<NetworkEvent>>>,
    console_messages: RwLock<HashMap<SessionId, Vec<ConsoleMessage>>>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::with_clock(clock::system())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            ids: Ids::default(),
            clock,
            targets: RwLock::new(HashMap::new()),
            checks: RwLock::new(HashMap::new()),
            windows: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            active_session_by_target: RwLock::new(HashMap::new()),
            network_events: RwLock::new(HashMap::new()),
            console_messages: RwLock::new(HashMap::new()),
        }
    }

    fn validate_new_target(&self, url: &str, name: &str, interval: u32) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidInput(format!(
                "url must be absolute http/https: {url}"
            )));
        }
        if url.len() > MAX_URL_BYTES {
            return Err(Error::InvalidInput("url exceeds max length".into()));
        }
        if name.len() > MAX_NAME_BYTES {
            return Err(Error::InvalidInput("name exceeds max length".into()));
        }
        if !(MIN_CHECK_INTERVAL_SECONDS..=MAX_CHECK_INTERVAL_SECONDS).contains(&interval) {
            return Err(Error::InvalidInput(format!(
                "check_interval_seconds must be in [{MIN_CHECK_INTERVAL_SECONDS}, {MAX_CHECK_INTERVAL_SECONDS}]"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_target(&self, input: NewTarget) -> Result<Target> {
        self.validate_new_target(&input.url, &input.name, input.check_interval_seconds)?;

        let mut targets = self.targets.write();
        if targets.values().any(|t| t.url == input.url) {
            return Err(Error::Conflict(format!("url already registered: {}", input.url)));
        }

        let now = self.clock.now();
        let target = Target {
            id: Ids::next(&self.ids.target),
            url: input.url,
            name: input.name,
            check_interval_seconds: input.check_interval_seconds,
            enabled: input.enabled,
            created_at: now,
            updated_at: now,
        };
        targets.insert(target.id, target.clone());
        Ok(target)
    }

    async fn get_target(&self, id: TargetId) -> Result<Target> {
        self.targets
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("target {id}")))
    }

    async fn list_targets(&self, skip: usize, limit: usize) -> Result<Vec<Target>> {
        let mut targets: Vec<Target> = self.targets.read().values().cloned().collect();
        targets.sort_by_key(|t| t.id);
        Ok(targets.into_iter().skip(skip).take(limit).collect())
    }

    async fn list_enabled_targets(&self) -> Result<Vec<Target>> {
        let mut targets: Vec<Target> = self
            .targets
            .read()
            .values()
            .filter(|t| t.enabled)
            .cloned()
            .collect();
        targets.sort_by_key(|t| t.id);
        Ok(targets)
    }

    async fn update_target(&self, id: TargetId, patch: TargetPatch) -> Result<Target> {
        let mut targets = self.targets.write();
        let existing = targets
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("target {id}")))?;

        let url = patch.url.unwrap_or(existing.url);
        let name = patch.name.unwrap_or(existing.name);
        let check_interval_seconds = patch
            .check_interval_seconds
            .unwrap_or(existing.check_interval_seconds);
        let enabled = patch.enabled.unwrap_or(existing.enabled);

        self.validate_new_target(&url, &name, check_interval_seconds)?;
        if url != existing.url && targets.values().any(|t| t.id != id && t.url == url) {
            return Err(Error::Conflict(format!("url already registered: {url}")));
        }

        let updated = Target {
            id,
            url,
            name,
            check_interval_seconds,
            enabled,
            created_at: existing.created_at,
            updated_at: self.clock.now(),
        };
        targets.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_target(&self, id: TargetId) -> Result<()> {
        if self.targets.write().remove(&id).is_none() {
            return Err(Error::NotFound(format!("target {id}")));
        }
        self.checks.write().remove(&id);
        self.windows.write().remove(&id);

        let session_ids: Vec<SessionId> = {
            let sessions = self.sessions.read();
            sessions
                .values()
                .filter(|s| s.target_id == id)
                .map(|s| s.id)
                .collect()
        };
        self.active_session_by_target.write().remove(&id);
        for sid in session_ids {
            self.sessions.write().remove(&sid);
            self.network_events.write().remove(&sid);
            self.console_messages.write().remove(&sid);
        }
        Ok(())
    }

    async fn open_window(&self, target_id: TargetId) -> Result<Option<DowntimeWindow>> {
        Ok(self
            .windows
            .read()
            .get(&target_id)
            .and_then(|ws| ws.iter().rev().find(|w| w.is_open()))
            .cloned())
    }

    async fn commit_check(
        &self,
        check: NewCheck,
        action: DowntimeAction,
    ) -> Result<(Check, Option<DowntimeWindow>)> {
        let mut checks = self.checks.write();
        let mut windows = self.windows.write();

        let check = Check {
            id: Ids::next(&self.ids.check),
            target_id: check.target_id,
            observed_at: check.observed_at,
            available: check.available,
            status: check.status,
            response_time_ms: check.response_time_ms,
            error_kind: check.error_kind,
            error_detail: check.error_detail,
        };
        checks.entry(check.target_id).or_default().push(check.clone());

        let window = match action {
            DowntimeAction::NoOp => None,
            DowntimeAction::Open => {
                let w = DowntimeWindow {
                    id: Ids::next(&self.ids.window),
                    target_id: check.target_id,
                    started_at: check.observed_at,
                    ended_at: None,
                };
                windows.entry(check.target_id).or_default().push(w.clone());
                Some(w)
            }
            DowntimeAction::Close => {
                let ws = windows.entry(check.target_id).or_default();
                let open = ws.iter_mut().rev().find(|w| w.is_open());
                open.map(|w| {
                    w.ended_at = Some(check.observed_at);
                    w.clone()
                })
            }
        };

        Ok((check, window))
    }

    async fn checks_in_range(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Check>> {
        Ok(self
            .checks
            .read()
            .get(&target_id)
            .map(|cs| {
                cs.iter()
                    .filter(|c| c.observed_at >= start && c.observed_at <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn windows_overlapping(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DowntimeWindow>> {
        Ok(self
            .windows
            .read()
            .get(&target_id)
            .map(|ws| {
                ws.iter()
                    .filter(|w| {
                        let window_end = w.ended_at.unwrap_or(end);
                        w.started_at <= end && window_end >= start
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_session(
        &self,
        target_id: TargetId,
        duration_limit_seconds: Option<u32>,
    ) -> Result<DebugSession> {
        if self.targets.read().get(&target_id).is_none() {
            return Err(Error::NotFound(format!("target {target_id}")));
        }
        if self.active_session_by_target.read().contains_key(&target_id) {
            return Err(Error::Conflict(format!(
                "target {target_id} already has an active debug session"
            )));
        }

        let session = DebugSession {
            id: Ids::next(&self.ids.session),
            target_id,
            status: SessionStatus::Pending,
            created_at: self.clock.now(),
            started_at: None,
            stopped_at: None,
            duration_limit_seconds,
            error_detail: None,
        };
        self.sessions.write().insert(session.id, session.clone());
        Ok(session)
    }

    async fn transition_session(
        &self,
        id: SessionId,
        status: SessionStatus,
        error_detail: Option<String>,
    ) -> Result<DebugSession> {
        let mut sessions = self.sessions.write();
        let existing = sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("debug session {id}")))?;

        if existing.status.is_terminal() {
            return Err(Error::Conflict(format!(
                "debug session {id} is in terminal state {:?}",
                existing.status
            )));
        }

        let now = self.clock.now();
        let updated = DebugSession {
            status,
            started_at: if status == SessionStatus::Active {
                Some(now)
            } else {
                existing.started_at
            },
            stopped_at: if status.is_terminal() {
                Some(now)
            } else {
                existing.stopped_at
            },
            error_detail: error_detail.or(existing.error_detail),
            ..existing
        };

        if !updated.invariant_holds() {
            return Err(Error::Fatal(format!(
                "debug session {id} transition would violate its invariant"
            )));
        }

        if status == SessionStatus::Active {
            self.active_session_by_target
                .write()
                .insert(updated.target_id, id);
        } else if status.is_terminal() {
            let mut active = self.active_session_by_target.write();
            if active.get(&updated.target_id) == Some(&id) {
                active.remove(&updated.target_id);
            }
        }

        sessions.insert(id, updated.clone());
        Ok(updated)
    }

    async fn get_session(&self, id: SessionId) -> Result<DebugSession> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("debug session {id}")))
    }

    async fn active_session_for_target(&self, target_id: TargetId) -> Result<Option<DebugSession>> {
        let id = self.active_session_by_target.read().get(&target_id).copied();
        match id {
            Some(id) => Ok(self.sessions.read().get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn insert_network_events_batch(
        &self,
        events: Vec<NewNetworkEvent>,
    ) -> Result<Vec<NetworkEvent>> {
        let mut table = self.network_events.write();
        let mut inserted = Vec::with_capacity(events.len());
        for e in events {
            let event = NetworkEvent {
                id: Ids::next(&self.ids.network_event),
                session_id: e.session_id,
                kind: e.kind,
                url: e.url,
                method: e.method,
                status: e.status,
                request_headers: e.request_headers,
                response_headers: e.response_headers,
                request_body: e.request_body,
                response_body: e.response_body,
                resource_type: e.resource_type,
                timestamp: e.timestamp,
                duration_ms: e.duration_ms,
            };
            table.entry(event.session_id).or_default().push(event.clone());
            inserted.push(event);
        }
        Ok(inserted)
    }

    async fn insert_console_messages_batch(
        &self,
        messages: Vec<NewConsoleMessage>,
    ) -> Result<Vec<ConsoleMessage>> {
        let mut table = self.console_messages.write();
        let mut inserted = Vec::with_capacity(messages.len());
        for m in messages {
            let msg = ConsoleMessage {
                id: Ids::next(&self.ids.console_message),
                session_id: m.session_id,
                level: m.level,
                message: m.message,
                timestamp: m.timestamp,
            };
            table.entry(msg.session_id).or_default().push(msg.clone());
            inserted.push(msg);
        }
        Ok(inserted)
    }

    async fn list_network_events(
        &self,
        session_id: SessionId,
        skip: usize,
        limit: usize,
        filter: NetworkEventFilter,
    ) -> Result<Vec<NetworkEvent>> {
        Ok(self
            .network_events
            .read()
            .get(&session_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| filter.kind.map_or(true, |k| e.kind == k))
                    .filter(|e| filter.resource_type.map_or(true, |rt| e.resource_type == rt))
                    .skip(skip)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_console_messages(
        &self,
        session_id: SessionId,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<ConsoleMessage>> {
        Ok(self
            .console_messages
            .read()
            .get(&session_id)
            .map(|msgs| msgs.iter().skip(skip).take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTarget;

    fn new_target(url: &str) -> NewTarget {
        NewTarget {
            url: url.to_string(),
            name: "example".to_string(),
            check_interval_seconds: 60,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn create_target_rejects_duplicate_url() {
        let store = MemStore::new();
        store.create_target(new_target("https://a.example")).await.unwrap();
        let err = store
            .create_target(new_target("https://a.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn create_target_rejects_bad_interval() {
        let store = MemStore::new();
        let mut t = new_target("https://b.example");
        t.check_interval_seconds = 10;
        let err = store.create_target(t).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_target_preserves_unmentioned_fields() {
        let store = MemStore::new();
        let t = store.create_target(new_target("https://c.example")).await.unwrap();
        let patched = store
            .update_target(
                t.id,
                TargetPatch {
                    name: Some("renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.name, "renamed");
        assert_eq!(patched.url, "https://c.example");
        assert_eq!(patched.check_interval_seconds, 60);
    }

    #[tokio::test]
    async fn delete_target_cascades_to_checks_and_sessions() {
        let store = MemStore::new();
        let t = store.create_target(new_target("https://d.example")).await.unwrap();
        store
            .commit_check(
                NewCheck {
                    target_id: t.id,
                    observed_at: Utc::now(),
                    available: true,
                    status: Some(200),
                    response_time_ms: Some(12.0),
                    error_kind: None,
                    error_detail: None,
                },
                DowntimeAction::NoOp,
            )
            .await
            .unwrap();
        let session = store.create_session(t.id, None).await.unwrap();

        store.delete_target(t.id).await.unwrap();

        assert!(store.get_target(t.id).await.is_err());
        assert!(store
            .checks_in_range(t.id, Utc::now() - chrono::Duration::days(1), Utc::now())
            .await
            .unwrap()
            .is_empty());
        assert!(store.get_session(session.id).await.is_err());
    }

    #[tokio::test]
    async fn only_one_active_session_per_target() {
        let store = MemStore::new();
        let t = store.create_target(new_target("https://e.example")).await.unwrap();
        let s1 = store.create_session(t.id, None).await.unwrap();
        store
            .transition_session(s1.id, SessionStatus::Active, None)
            .await
            .unwrap();

        let err = store.create_session(t.id, None).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn commit_check_opens_and_closes_downtime_window() {
        let store = MemStore::new();
        let t = store.create_target(new_target("https://f.example")).await.unwrap();
        let now = Utc::now();

        assert!(store.open_window(t.id).await.unwrap().is_none());

        let (_, opened) = store
            .commit_check(
                NewCheck {
                    target_id: t.id,
                    observed_at: now,
                    available: false,
                    status: None,
                    response_time_ms: None,
                    error_kind: Some(mon_domain::types::ErrorKind::Timeout),
                    error_detail: None,
                },
                DowntimeAction::Open,
            )
            .await
            .unwrap();
        assert!(opened.unwrap().is_open());
        assert!(store.open_window(t.id).await.unwrap().is_some());

        let (_, closed) = store
            .commit_check(
                NewCheck {
                    target_id: t.id,
                    observed_at: now + chrono::Duration::seconds(60),
                    available: true,
                    status: Some(200),
                    response_time_ms: Some(5.0),
                    error_kind: None,
                    error_detail: None,
                },
                DowntimeAction::Close,
            )
            .await
            .unwrap();
        assert!(!closed.unwrap().is_open());
        assert!(store.open_window(t.id).await.unwrap().is_none());
    }
}
