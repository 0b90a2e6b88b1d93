//! Single-flight guard per target.
//!
//! A simplified generalization of the teacher's `ConcurrencyGuard`: that
//! guard allows a configurable max-concurrency per schedule via an
//! `AtomicU32` counter. Monitoring targets are checked one probe at a
//! time, so the counter collapses to a single `AtomicBool`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use mon_domain::types::TargetId;

#[derive(Default)]
pub struct InFlightGuard {
    flags: RwLock<HashMap<TargetId, Arc<AtomicBool>>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the single slot for `target_id`. Returns `true` if
    /// acquired; `false` if a probe for this target is already in flight.
    pub fn try_acquire(&self, target_id: TargetId) -> bool {
        let flag = {
            let mut flags = self.flags.write();
            flags
                .entry(target_id)
                .or_insert_with(|| Arc::new(AtomicBool::new(false)))
                .clone()
        };
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the slot for `target_id` after a probe completes.
    pub fn release(&self, target_id: TargetId) {
        let flags = self.flags.read();
        if let Some(flag) = flags.get(&target_id) {
            flag.store(false, Ordering::SeqCst);
        }
    }

    /// Drop a target's tracking entry entirely, e.g. on target deletion.
    pub fn remove(&self, target_id: TargetId) {
        self.flags.write().remove(&target_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_in_flight() {
        let guard = InFlightGuard::new();
        assert!(guard.try_acquire(1));
        assert!(!guard.try_acquire(1));
        guard.release(1);
        assert!(guard.try_acquire(1));
    }

    #[test]
    fn targets_are_independent() {
        let guard = InFlightGuard::new();
        assert!(guard.try_acquire(1));
        assert!(guard.try_acquire(2));
    }

    #[test]
    fn remove_forgets_target_state() {
        let guard = InFlightGuard::new();
        assert!(guard.try_acquire(1));
        guard.remove(1);
        // Removing without releasing still allows a fresh acquire: the
        // entry itself, not just the flag, is gone.
        assert!(guard.try_acquire(1));
    }
}
