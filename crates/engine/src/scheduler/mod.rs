//! Per-target probe scheduling.
//!
//! One ticker task per enabled target, rather than the teacher's single
//! periodic sweep over due cron schedules: targets have independent,
//! configurable intervals and no cron expression, so a dedicated task per
//! target is the natural fit. [`reconcile`](Scheduler::reconcile) keeps the
//! task set in sync with the store after targets are added, removed, or
//! toggled.

mod inflight;
mod missed;

pub use inflight::InFlightGuard;
pub use missed::missed_fire_eligible;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mon_domain::error::Result;
use mon_domain::trace::TraceEvent;
use mon_domain::types::{Check, Target, TargetId};
use mon_probe::Probe;
use mon_storage::model::NewCheck;
use mon_storage::Store;

use crate::breaker::CircuitBreaker;
use crate::downtime;

struct JobHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives one ticker task per enabled target, firing probes on that
/// target's configured interval.
pub struct Scheduler {
    store: Arc<dyn Store>,
    probe: Arc<dyn Probe>,
    breaker: Arc<CircuitBreaker>,
    inflight: Arc<InFlightGuard>,
    grace_period_seconds: u32,
    jobs: Mutex<HashMap<TargetId, JobHandle>>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        probe: Arc<dyn Probe>,
        breaker: Arc<CircuitBreaker>,
        grace_period_seconds: u32,
    ) -> Self {
        Self {
            store,
            probe,
            breaker,
            inflight: Arc::new(InFlightGuard::new()),
            grace_period_seconds,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn a job for every currently-enabled target. Call once at
    /// startup; use [`Self::reconcile`] to pick up later changes.
    pub async fn start(&self) -> Result<()> {
        let targets = self.store.list_enabled_targets().await?;
        for target in targets {
            self.spawn_job(target);
        }
        Ok(())
    }

    /// Re-read enabled targets from the store and converge the running job
    /// set: spawn jobs for newly-enabled targets, cancel jobs for targets
    /// that were deleted or disabled since the last reconcile.
    pub async fn reconcile(&self) -> Result<()> {
        let targets = self.store.list_enabled_targets().await?;
        let wanted: HashMap<TargetId, Target> = targets.into_iter().map(|t| (t.id, t)).collect();

        let stale: Vec<TargetId> = {
            let jobs = self.jobs.lock();
            jobs.keys()
                .filter(|id| !wanted.contains_key(id))
                .copied()
                .collect()
        };
        for id in stale {
            self.cancel_job(id);
        }

        let missing: Vec<Target> = {
            let jobs = self.jobs.lock();
            wanted
                .into_values()
                .filter(|t| !jobs.contains_key(&t.id))
                .collect()
        };
        for target in missing {
            self.spawn_job(target);
        }

        Ok(())
    }

    /// Cancel and drop the job for a single target, if one is running.
    pub fn cancel_job(&self, target_id: TargetId) {
        let removed = self.jobs.lock().remove(&target_id);
        if let Some(job) = removed {
            job.cancel.cancel();
            job.handle.abort();
        }
        self.inflight.remove(target_id);
    }

    /// Manually trigger an out-of-band check for a target, bypassing the
    /// breaker's pre-check (an operator asking for a check right now wants
    /// an answer, not a skip) but still updating breaker state from the
    /// outcome like any scheduled fire would. Returns the recorded `Check`,
    /// per spec.md §6's `triggerCheck(targetId) -> Check | not-found`; `None`
    /// only when a probe for this target was already in flight and this
    /// call coalesced onto it rather than running its own.
    pub async fn trigger_check(&self, target_id: TargetId) -> Result<Option<Check>> {
        if !self.inflight.try_acquire(target_id) {
            TraceEvent::SchedulerJobCoalesced { target_id }.emit();
            return Ok(None);
        }
        let result = run_probe_cycle(
            &self.store,
            &self.probe,
            &self.breaker,
            target_id,
            /* check_breaker = */ false,
        )
        .await;
        self.inflight.release(target_id);
        result
    }

    fn spawn_job(&self, target: Target) {
        let target_id = target.id;
        let cancel = CancellationToken::new();
        let job_cancel = cancel.clone();

        let store = self.store.clone();
        let probe = self.probe.clone();
        let breaker = self.breaker.clone();
        let inflight = self.inflight.clone();
        let grace = self.grace_period_seconds;

        let handle = tokio::spawn(async move {
            run_target_loop(
                target_id,
                target.check_interval_seconds,
                store,
                probe,
                breaker,
                inflight,
                grace,
                job_cancel,
            )
            .await;
        });

        self.jobs.lock().insert(
            target_id,
            JobHandle {
                cancel,
                handle,
            },
        );
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_target_loop(
    target_id: TargetId,
    interval_seconds: u32,
    store: Arc<dyn Store>,
    probe: Arc<dyn Probe>,
    breaker: Arc<CircuitBreaker>,
    inflight: Arc<InFlightGuard>,
    grace_period_seconds: u32,
    cancel: CancellationToken,
) {
    let interval = chrono::Duration::seconds(interval_seconds as i64);
    let mut due_at = Utc::now() + interval;

    loop {
        let sleep_for = (due_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(0));

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(sleep_for) => {}
        }

        let now = Utc::now();
        if !missed_fire_eligible(due_at, now, grace_period_seconds) {
            due_at = now + interval;
            continue;
        }

        if breaker.is_blocked(target_id) {
            TraceEvent::SchedulerJobSkippedBlocked { target_id }.emit();
            due_at = due_at + interval;
            continue;
        }

        if !inflight.try_acquire(target_id) {
            TraceEvent::SchedulerJobCoalesced { target_id }.emit();
            due_at = due_at + interval;
            continue;
        }

        let outcome = run_probe_cycle(&store, &probe, &breaker, target_id, true).await;
        inflight.release(target_id);

        if let Err(err) = outcome {
            match err {
                mon_domain::error::Error::NotFound(_) => return,
                other => {
                    tracing::warn!(target_id, error = %other, "scheduled probe cycle failed");
                }
            }
        }

        due_at = due_at + interval;
        if due_at < Utc::now() {
            due_at = Utc::now() + interval;
        }
    }
}

/// One probe-and-commit cycle: re-read the target, run the probe, decide
/// and commit the downtime transition, and update breaker state. Shared by
/// the scheduled loop and [`Scheduler::trigger_check`]; `check_breaker`
/// controls whether a pre-existing block short-circuits the cycle before
/// the probe runs (scheduled fires honor it, manual triggers don't). Returns
/// `None` when the cycle was skipped (blocked or disabled) rather than
/// producing a `Check`.
async fn run_probe_cycle(
    store: &Arc<dyn Store>,
    probe: &Arc<dyn Probe>,
    breaker: &Arc<CircuitBreaker>,
    target_id: TargetId,
    check_breaker: bool,
) -> Result<Option<Check>> {
    if check_breaker && breaker.is_blocked(target_id) {
        TraceEvent::SchedulerJobSkippedBlocked { target_id }.emit();
        return Ok(None);
    }

    let target = store.get_target(target_id).await?;
    if !target.enabled {
        return Ok(None);
    }

    let outcome = probe.check(&target).await;

    let open = store.open_window(target_id).await?;
    let action = downtime::apply(open.as_ref(), outcome.available);

    let new_check = NewCheck {
        target_id,
        observed_at: outcome.observed_at,
        available: outcome.available,
        status: outcome.status,
        response_time_ms: outcome.response_time_ms,
        error_kind: outcome.error_kind,
        error_detail: outcome.error_detail.clone(),
    };

    let (check, window) = store.commit_check(new_check, action).await?;

    if outcome.available {
        breaker.record_success(target_id);
    } else {
        breaker.record_failure(target_id);
    }

    TraceEvent::CheckRecorded {
        target_id,
        check_id: check.id,
        available: check.available,
        error_kind: check.error_kind.map(|k| format!("{k:?}").to_lowercase()),
    }
    .emit();

    if let Some(window) = window {
        if window.is_open() {
            TraceEvent::DowntimeWindowOpened {
                target_id,
                window_id: window.id,
                started_at: window.started_at.to_rfc3339(),
            }
            .emit();
        } else if let Some(ended_at) = window.ended_at {
            TraceEvent::DowntimeWindowClosed {
                target_id,
                window_id: window.id,
                ended_at: ended_at.to_rfc3339(),
            }
            .emit();
        }
    }

    Ok(Some(check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mon_domain::config::BreakerConfig;
    use mon_domain::types::ErrorKind;
    use mon_storage::clock::fake::FakeClock;
    use mon_storage::model::NewTarget;
    use mon_storage::MemStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysUp;

    #[async_trait]
    impl Probe for AlwaysUp {
        async fn check(&self, _target: &Target) -> mon_probe::ProbeOutcome {
            mon_probe::ProbeOutcome::success(200, 10.0, Utc::now())
        }
    }

    struct CountingProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Probe for CountingProbe {
        async fn check(&self, _target: &Target) -> mon_probe::ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            mon_probe::ProbeOutcome::failure(ErrorKind::Timeout, "boom", Utc::now())
        }
    }

    async fn seeded_store() -> (Arc<dyn Store>, TargetId) {
        let clock = FakeClock::new(Utc::now());
        let store: Arc<dyn Store> = Arc::new(MemStore::with_clock(clock));
        let target = store
            .create_target(NewTarget {
                url: "https://example.com".into(),
                name: "example".into(),
                check_interval_seconds: 60,
                enabled: true,
            })
            .await
            .unwrap();
        (store, target.id)
    }

    #[tokio::test]
    async fn trigger_check_records_a_check_and_updates_breaker() {
        let (store, target_id) = seeded_store().await;
        let probe: Arc<dyn Probe> = Arc::new(AlwaysUp);
        let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
            failure_threshold: 5,
            cooldown_seconds: 300,
        }));

        let scheduler = Scheduler::new(store.clone(), probe, breaker.clone(), 300);
        scheduler.trigger_check(target_id).await.unwrap();

        let checks = store
            .checks_in_range(target_id, Utc::now() - chrono::Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(checks.len(), 1);
        assert!(checks[0].available);
        assert!(!breaker.is_blocked(target_id));
    }

    #[tokio::test]
    async fn trigger_check_bypasses_breaker_block_but_still_counts_failure() {
        let (store, target_id) = seeded_store().await;
        let probe: Arc<dyn Probe> = Arc::new(CountingProbe {
            calls: AtomicUsize::new(0),
        });
        let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
            failure_threshold: 1,
            cooldown_seconds: 300,
        }));
        breaker.record_failure(target_id);
        assert!(breaker.is_blocked(target_id));

        let scheduler = Scheduler::new(store.clone(), probe, breaker.clone(), 300);
        scheduler.trigger_check(target_id).await.unwrap();

        let checks = store
            .checks_in_range(target_id, Utc::now() - chrono::Duration::hours(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(checks.len(), 1, "manual trigger runs despite the block");
    }

    #[tokio::test]
    async fn concurrent_trigger_coalesces_to_one_in_flight_probe() {
        let (store, target_id) = seeded_store().await;
        let calls = Arc::new(AtomicUsize::new(0));
        struct Slow(Arc<AtomicUsize>);
        #[async_trait]
        impl Probe for Slow {
            async fn check(&self, _target: &Target) -> mon_probe::ProbeOutcome {
                self.0.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                mon_probe::ProbeOutcome::success(200, 1.0, Utc::now())
            }
        }
        let probe: Arc<dyn Probe> = Arc::new(Slow(calls.clone()));
        let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
            failure_threshold: 5,
            cooldown_seconds: 300,
        }));
        let scheduler = Arc::new(Scheduler::new(store, probe, breaker, 300));

        let s1 = scheduler.clone();
        let s2 = scheduler.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.trigger_check(target_id).await }),
            tokio::spawn(async move { s2.trigger_check(target_id).await }),
        );
        r1.unwrap().unwrap();
        r2.unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1, "one call coalesces the other");
    }
}
