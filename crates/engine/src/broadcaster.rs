//! Per-session subscriber fan-out for live debug session streaming.
//!
//! Grounded on the teacher's node registry: subscribers are `mpsc::Sender`
//! sinks keyed in a lock-protected map, exactly like `NodeRegistry` keys
//! connected nodes by id. The difference is cardinality — many subscribers
//! per session instead of one sink per node — and that a slow or closed
//! sink is simply dropped rather than treated as a registry error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use mon_domain::types::{ConsoleMessage, NetworkEvent, SessionId};

/// One message pushed to a debug session's subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DebugMessage {
    #[serde(rename = "network_event")]
    NetworkEvent { event: NetworkEvent },
    #[serde(rename = "console_error")]
    ConsoleError { message: ConsoleMessage },
    #[serde(rename = "status")]
    Status {
        status: String,
        detail: Option<String>,
        at: DateTime<Utc>,
    },
}

pub type SubscriberSink = mpsc::Sender<DebugMessage>;

/// Fan-out of [`DebugMessage`]s to every live subscriber of a debug
/// session. Delivery to a single subscriber preserves `broadcast` call
/// order; delivery across subscribers is independent, and a subscriber
/// whose channel is full or closed is dropped from the set rather than
/// blocking the broadcaster.
#[derive(Default)]
pub struct Broadcaster {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<SessionId, HashMap<u64, SubscriberSink>>>,
}

/// Handle returned by [`Broadcaster::subscribe`]; pass to
/// [`Broadcaster::unsubscribe`] to remove that specific sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, session_id: SessionId, sink: SubscriberSink) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .write()
            .entry(session_id)
            .or_default()
            .insert(id, sink);
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, session_id: SessionId, subscription: SubscriptionId) {
        let mut subscribers = self.subscribers.write();
        if let Some(sinks) = subscribers.get_mut(&session_id) {
            sinks.remove(&subscription.0);
            if sinks.is_empty() {
                subscribers.remove(&session_id);
            }
        }
    }

    /// Best-effort, non-blocking broadcast to every live subscriber of
    /// `session_id`. A sink that is full or whose receiver dropped is
    /// removed from the set; its subscriber will observe the disconnect
    /// on its own end of the channel.
    pub fn broadcast(&self, session_id: SessionId, message: DebugMessage) {
        let sinks: Vec<(u64, SubscriberSink)> = {
            let subscribers = self.subscribers.read();
            match subscribers.get(&session_id) {
                Some(sinks) => sinks.iter().map(|(id, s)| (*id, s.clone())).collect(),
                None => return,
            }
        };

        let mut dead = Vec::new();
        for (id, sink) in sinks {
            if sink.try_send(message.clone()).is_err() {
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write();
            if let Some(sinks) = subscribers.get_mut(&session_id) {
                for id in dead {
                    sinks.remove(&id);
                }
                if sinks.is_empty() {
                    subscribers.remove(&session_id);
                }
            }
        }
    }

    /// Drop every subscriber for a session, e.g. once it reaches a
    /// terminal state and no further messages will be sent.
    pub fn close_session(&self, session_id: SessionId) {
        self.subscribers.write().remove(&session_id);
    }

    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.subscribers
            .read()
            .get(&session_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: &str) -> DebugMessage {
        DebugMessage::Status {
            status: s.into(),
            detail: None,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_broadcast_messages_in_order() {
        let broadcaster = Broadcaster::new();
        let (tx, mut rx) = mpsc::channel(8);
        broadcaster.subscribe(1, tx);

        broadcaster.broadcast(1, status("active"));
        broadcaster.broadcast(1, status("stopped"));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, DebugMessage::Status { status, .. } if status == "active"));
        assert!(matches!(second, DebugMessage::Status { status, .. } if status == "stopped"));
    }

    #[tokio::test]
    async fn broadcast_to_unknown_session_is_a_noop() {
        let broadcaster = Broadcaster::new();
        broadcaster.broadcast(99, status("active"));
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_next_broadcast() {
        let broadcaster = Broadcaster::new();
        let (tx, rx) = mpsc::channel(8);
        broadcaster.subscribe(1, tx);
        drop(rx);

        broadcaster.broadcast(1, status("active"));
        assert_eq!(broadcaster.subscriber_count(1), 0);
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_that_sink() {
        let broadcaster = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let sub1 = broadcaster.subscribe(1, tx1);
        broadcaster.subscribe(1, tx2);

        broadcaster.unsubscribe(1, sub1);
        broadcaster.broadcast(1, status("active"));

        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn close_session_drops_all_subscribers() {
        let broadcaster = Broadcaster::new();
        let (tx, _rx) = mpsc::channel(8);
        broadcaster.subscribe(1, tx);
        broadcaster.close_session(1);
        assert_eq!(broadcaster.subscriber_count(1), 0);
    }
}
