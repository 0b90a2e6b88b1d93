use std::sync::Arc;

use mon_domain::config::Config;
use mon_engine::{Broadcaster, CircuitBreaker, DebugSessionEngine, Scheduler, SlaAnalytics};
use mon_storage::Store;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core** — config, store, scheduler, circuit breaker
/// - **Debug sessions** — session engine, live-event broadcaster
/// - **Analytics** — SLA analytics (cached aggregate queries)
#[derive(Clone)]
pub struct AppState {
    // ── Core ──────────────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub scheduler: Arc<Scheduler>,
    pub breaker: Arc<CircuitBreaker>,

    // ── Debug sessions ────────────────────────────────────────────────
    pub debug_engine: Arc<DebugSessionEngine>,
    pub broadcaster: Arc<Broadcaster>,

    // ── Analytics ─────────────────────────────────────────────────────
    pub sla: Arc<SlaAnalytics>,
}
