use std::sync::Arc;

use anyhow::Context;

use mon_domain::config::Config;
use mon_engine::{Broadcaster, CircuitBreaker, DebugSessionEngine, Scheduler, SlaAnalytics};
use mon_probe::browser::chromium::ChromiumPool;
use mon_probe::browser::probe::ActiveSessionLookup;
use mon_probe::{BrowserProbe, HttpProbe, HybridProbe, Probe};
use mon_storage::{MemStore, Store};

use crate::state::AppState;

/// Construct every subsystem and wire it into an [`AppState`], in
/// dependency order, logging readiness at each step the same way the
/// teacher's own bootstrap sequence does.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Store ────────────────────────────────────────────────────────
    let store: Arc<dyn Store> = Arc::new(MemStore::new());
    tracing::info!("in-memory store ready");

    // ── Circuit breaker ──────────────────────────────────────────────
    let breaker = Arc::new(CircuitBreaker::new(config.breaker.clone()));
    tracing::info!(
        failure_threshold = config.breaker.failure_threshold,
        cooldown_seconds = config.breaker.cooldown_seconds,
        "circuit breaker ready"
    );

    // ── Browser pool ─────────────────────────────────────────────────
    let pool = Arc::new(
        ChromiumPool::launch(&config.browser)
            .await
            .context("launching headless Chromium pool")?,
    );
    tracing::info!(headless = config.browser.headless, "browser pool ready");

    // ── Debug session engine + broadcaster ───────────────────────────
    let broadcaster = Arc::new(Broadcaster::new());
    let debug_engine = Arc::new(DebugSessionEngine::new(
        store.clone(),
        pool.clone(),
        broadcaster.clone(),
        config.debug.clone(),
    ));
    tracing::info!("debug session engine ready");

    // ── Probe (HTTP by default, browser while a debug session is live) ─
    let sessions: Arc<dyn ActiveSessionLookup> = debug_engine.clone();
    let http_probe = HttpProbe::new(&config.probe);
    let browser_probe = BrowserProbe::new(pool, sessions.clone());
    let probe: Arc<dyn Probe> = Arc::new(HybridProbe::new(http_probe, browser_probe, sessions));
    tracing::info!(
        timeout_seconds = config.probe.timeout_seconds,
        retries = config.probe.retries,
        "probe pipeline ready"
    );

    // ── Scheduler ─────────────────────────────────────────────────────
    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        probe,
        breaker.clone(),
        config.scheduler.grace_period_seconds,
    ));
    if config.scheduler.enabled {
        scheduler
            .start()
            .await
            .context("starting scheduler jobs for enabled targets")?;
        tracing::info!("scheduler started");
    } else {
        tracing::warn!("scheduler.enabled=false — no jobs will be started automatically");
    }

    // ── SLA analytics ─────────────────────────────────────────────────
    let sla = Arc::new(SlaAnalytics::new(
        store.clone(),
        config.sla.cache_ttl_seconds,
        config.sla.cache_enabled,
    ));
    tracing::info!(
        cache_enabled = config.sla.cache_enabled,
        cache_ttl_seconds = config.sla.cache_ttl_seconds,
        "SLA analytics ready"
    );

    Ok(AppState {
        config,
        store,
        scheduler,
        breaker,
        debug_engine,
        broadcaster,
        sla,
    })
}
