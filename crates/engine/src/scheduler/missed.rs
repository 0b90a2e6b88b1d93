//! Grace-period eligibility for a scheduler tick that fires later than its
//! target's `check_interval_seconds` would suggest (the ticker itself was
//! busy, the process was catching up after a pause, and so on).
//!
//! The teacher's cron scheduler distinguishes `Skip`/`RunOnce`/`CatchUp`
//! missed-window policies because one cron schedule can miss several
//! distinct windows between runs. A per-target interval ticker only ever
//! has one outstanding "next fire" at a time, so that three-way policy
//! collapses to a single yes/no question: is this fire still within grace?

use chrono::{DateTime, Utc};

/// Returns `true` if a firing due at `due_at` is still eligible to run at
/// `now`, given `grace_period_seconds`. Equivalent to the teacher's
/// `RunOnce` policy: a late firing still fires, once, as long as it's
/// within grace; a firing that's overshot grace is dropped rather than
/// queued for catch-up.
pub fn missed_fire_eligible(
    due_at: DateTime<Utc>,
    now: DateTime<Utc>,
    grace_period_seconds: u32,
) -> bool {
    if now <= due_at {
        return true;
    }
    let late_by = now - due_at;
    late_by <= chrono::Duration::seconds(grace_period_seconds as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn on_time_fire_is_eligible() {
        let now = Utc::now();
        assert!(missed_fire_eligible(now, now, 300));
    }

    #[test]
    fn early_fire_is_eligible() {
        let due = Utc::now();
        let now = due - Duration::seconds(5);
        assert!(missed_fire_eligible(due, now, 300));
    }

    #[test]
    fn late_within_grace_is_eligible() {
        let due = Utc::now();
        let now = due + Duration::seconds(299);
        assert!(missed_fire_eligible(due, now, 300));
    }

    #[test]
    fn late_beyond_grace_is_dropped() {
        let due = Utc::now();
        let now = due + Duration::seconds(301);
        assert!(!missed_fire_eligible(due, now, 300));
    }

    #[test]
    fn zero_grace_only_allows_exact_or_early() {
        let due = Utc::now();
        assert!(missed_fire_eligible(due, due, 0));
        assert!(!missed_fire_eligible(due, due + Duration::seconds(1), 0));
    }
}
