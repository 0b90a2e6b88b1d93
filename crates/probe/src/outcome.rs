use std::time::Duration;

use chrono::{DateTime, Utc};

use mon_domain::types::ErrorKind;

/// The result of one probe attempt against a [`mon_domain::types::Target`].
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub available: bool,
    pub status: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub error_kind: Option<ErrorKind>,
    pub error_detail: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl ProbeOutcome {
    pub fn success(status: u16, response_time_ms: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            available: 200 <= status && status < 400,
            status: Some(status),
            response_time_ms: Some(response_time_ms),
            error_kind: None,
            error_detail: None,
            observed_at,
        }
    }

    pub fn failure(kind: ErrorKind, detail: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            available: false,
            status: None,
            response_time_ms: None,
            error_kind: Some(kind),
            error_detail: Some(detail.into()),
            observed_at,
        }
    }
}

/// Every probe must complete or abort within this many seconds: the smaller
/// of `(interval_seconds - 1)` and a 30s ceiling. Since targets are bounded
/// to a minimum 60s interval, this normally resolves to a flat 30s, which
/// matches the browser probe's fixed navigation timeout.
pub fn effective_timeout(interval_seconds: u32) -> Duration {
    let headroom = interval_seconds.saturating_sub(1);
    Duration::from_secs(headroom.min(30).max(1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_timeout_clamps_to_thirty_seconds_floor() {
        assert_eq!(effective_timeout(60), Duration::from_secs(30));
        assert_eq!(effective_timeout(3600), Duration::from_secs(30));
    }

    #[test]
    fn effective_timeout_shrinks_for_short_intervals() {
        assert_eq!(effective_timeout(10), Duration::from_secs(9));
    }

    #[test]
    fn success_outcome_marks_unavailable_outside_2xx_3xx() {
        let now = Utc::now();
        let o = ProbeOutcome::success(404, 12.0, now);
        assert!(!o.available);
        let o = ProbeOutcome::success(204, 12.0, now);
        assert!(o.available);
    }
}
