//! Per-target circuit breaker.
//!
//! In-memory only: a process restart implicitly clears every block, the
//! same way the teacher's quota tracker implicitly resets on a day
//! rollover rather than persisting its own clock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use mon_domain::config::BreakerConfig;
use mon_domain::trace::TraceEvent;
use mon_domain::types::TargetId;

struct BreakerState {
    failure_count: u32,
    blocked_until: Option<DateTime<Utc>>,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            failure_count: 0,
            blocked_until: None,
        }
    }
}

/// Tracks consecutive-failure counts per target and blocks scheduling once
/// a target crosses `failure_threshold`, for `cooldown_seconds`.
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: RwLock<HashMap<TargetId, BreakerState>>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Returns true while the target is within its cooldown window. Clears
    /// the block as a side effect once the cooldown has elapsed.
    pub fn is_blocked(&self, target_id: TargetId) -> bool {
        let now = Utc::now();
        {
            let state = self.state.read();
            match state.get(&target_id).and_then(|s| s.blocked_until) {
                Some(until) if now < until => return true,
                Some(_) => {}
                None => return false,
            }
        }

        let mut state = self.state.write();
        if let Some(entry) = state.get_mut(&target_id) {
            if let Some(until) = entry.blocked_until {
                if now < until {
                    return true;
                }
                entry.failure_count = 0;
                entry.blocked_until = None;
            }
        }
        false
    }

    /// Increments the failure count; opens the breaker once it reaches the
    /// configured threshold.
    pub fn record_failure(&self, target_id: TargetId) {
        let now = Utc::now();
        let mut state = self.state.write();
        let entry = state.entry(target_id).or_default();
        entry.failure_count += 1;

        if entry.failure_count >= self.config.failure_threshold {
            let until = now + chrono::Duration::seconds(self.config.cooldown_seconds as i64);
            entry.blocked_until = Some(until);
            TraceEvent::CircuitBreakerOpened {
                target_id,
                failure_count: entry.failure_count,
                blocked_until: until.to_rfc3339(),
            }
            .emit();
        }
    }

    /// Clears the failure count and any block for the target.
    pub fn record_success(&self, target_id: TargetId) {
        let mut state = self.state.write();
        let was_blocked = state
            .get(&target_id)
            .map(|s| s.blocked_until.is_some())
            .unwrap_or(false);
        state.remove(&target_id);
        if was_blocked {
            TraceEvent::CircuitBreakerClosed { target_id }.emit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32, cooldown: u32) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: threshold,
            cooldown_seconds: cooldown,
        }
    }

    #[test]
    fn unknown_target_is_not_blocked() {
        let breaker = CircuitBreaker::new(config(5, 300));
        assert!(!breaker.is_blocked(1));
    }

    #[test]
    fn opens_at_threshold_and_blocks() {
        let breaker = CircuitBreaker::new(config(3, 300));
        breaker.record_failure(1);
        breaker.record_failure(1);
        assert!(!breaker.is_blocked(1));
        breaker.record_failure(1);
        assert!(breaker.is_blocked(1));
    }

    #[test]
    fn success_clears_failure_count_and_block() {
        let breaker = CircuitBreaker::new(config(2, 300));
        breaker.record_failure(1);
        breaker.record_failure(1);
        assert!(breaker.is_blocked(1));

        breaker.record_success(1);
        assert!(!breaker.is_blocked(1));

        breaker.record_failure(1);
        assert!(!breaker.is_blocked(1));
    }

    #[test]
    fn breaker_is_per_target() {
        let breaker = CircuitBreaker::new(config(1, 300));
        breaker.record_failure(1);
        assert!(breaker.is_blocked(1));
        assert!(!breaker.is_blocked(2));
    }

    #[test]
    fn block_expires_after_cooldown() {
        let breaker = CircuitBreaker::new(config(1, 0));
        breaker.record_failure(1);
        // cooldown_seconds = 0, so `now < blocked_until` is already false.
        assert!(!breaker.is_blocked(1));
    }
}
