use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use mon_domain::types::{ErrorKind, Target, TargetId};

use crate::browser::BrowserPool;
use crate::capture::CaptureSink;
use crate::outcome::ProbeOutcome;
use crate::probe::Probe;

/// Looks up the capture sink for a target's active debug session, if any.
/// `mon-engine`'s `DebugSessionEngine` implements this so the browser probe
/// can forward captured network/console events without depending on the
/// engine crate directly.
pub trait ActiveSessionLookup: Send + Sync {
    fn capture_sink_for(&self, target_id: TargetId) -> Option<Arc<dyn CaptureSink>>;
}

/// Required when a debug session for the target is active; optionally used
/// otherwise. Navigates with `wait_until=domcontentloaded` semantics (the
/// navigation future resolves once the main document load event fires) and
/// a fixed 30s timeout.
pub struct BrowserProbe {
    pool: Arc<dyn BrowserPool>,
    sessions: Arc<dyn ActiveSessionLookup>,
}

const NAVIGATION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

impl BrowserProbe {
    pub fn new(pool: Arc<dyn BrowserPool>, sessions: Arc<dyn ActiveSessionLookup>) -> Self {
        Self { pool, sessions }
    }
}

#[async_trait]
impl Probe for BrowserProbe {
    async fn check(&self, target: &Target) -> ProbeOutcome {
        let observed_at = Utc::now();

        let mut context = match self.pool.acquire_context().await {
            Ok(ctx) => ctx,
            Err(err) => {
                return ProbeOutcome::failure(ErrorKind::Unexpected, err.to_string(), observed_at)
            }
        };

        let sink = self.sessions.capture_sink_for(target.id);
        let started = std::time::Instant::now();
        let result = context.navigate(&target.url, NAVIGATION_TIMEOUT, sink).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Err(err) = context.close().await {
            tracing::warn!(target_id = target.id, error = %err, "failed to close browsing context");
        }

        match result {
            Ok(nav) => match nav.status {
                Some(status) => ProbeOutcome::success(status, elapsed_ms, observed_at),
                None => ProbeOutcome::failure(
                    ErrorKind::Navigation,
                    "navigation produced no response status",
                    observed_at,
                ),
            },
            Err(err) => {
                let kind = match &err {
                    mon_domain::error::Error::Probe { kind, .. } => *kind,
                    _ => ErrorKind::Navigation,
                };
                ProbeOutcome::failure(kind, err.to_string(), observed_at)
            }
        }
    }
}
