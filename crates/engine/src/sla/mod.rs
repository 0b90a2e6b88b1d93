//! Read-only SLA metrics over a target's Checks and DowntimeWindows, with
//! an optional process-local TTL cache.
//!
//! Assumptions (per the interface contract):
//! 1. Missing checks do not count as downtime — only explicit downtime
//!    windows count.
//! 2. An ongoing window (`ended_at = None`) is treated as extending to the
//!    end of the query range.
//! 3. Response-time statistics exclude failed checks.

mod bucket;
mod cache;
mod percentile;

pub use bucket::Bucket;
pub use cache::SlaCache;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use mon_domain::error::Result;
use mon_domain::trace::TraceEvent;
use mon_domain::types::TargetId;
use mon_storage::Store;

const DEFAULT_PERCENTILES: [u8; 5] = [50, 75, 90, 95, 99];

/// Point-in-time SLA metrics for one target over `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaMetrics {
    pub target_id: TargetId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub availability_percent: f64,
    pub mean_response_time_ms: Option<f64>,
    /// `(percentile, value)` pairs, in the order requested.
    pub percentile_response_times_ms: Vec<(u8, f64)>,
    pub total_checks: usize,
    pub successful_checks: usize,
    pub failure_count: usize,
    pub total_downtime_seconds: f64,
}

/// One bucket's metrics, clipped to the overall query range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketMetrics {
    pub bucket_start: DateTime<Utc>,
    pub bucket_end: DateTime<Utc>,
    pub metrics: SlaMetrics,
}

pub struct SlaAnalytics {
    store: Arc<dyn Store>,
    cache: SlaCache,
}

impl SlaAnalytics {
    pub fn new(store: Arc<dyn Store>, cache_ttl_seconds: u64, cache_enabled: bool) -> Self {
        Self {
            store,
            cache: SlaCache::new(cache_ttl_seconds, cache_enabled),
        }
    }

    /// Compute metrics for `target_id` over `[start, end]`, using the
    /// cache when enabled and not expired.
    pub async fn metrics(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SlaMetrics> {
        let key = cache::CacheKey {
            target_id,
            start,
            end,
            bucket: None,
        };
        if let Some(hit) = self.cache.get(&key) {
            TraceEvent::SlaCacheHit { target_id }.emit();
            return Ok(hit);
        }
        TraceEvent::SlaCacheMiss { target_id }.emit();

        let metrics = self.compute(target_id, start, end).await?;
        self.cache.put(key, metrics.clone());
        Ok(metrics)
    }

    /// Compute metrics per bucket (`day`/`week`/`month`) over `[start,
    /// end]`. Each bucket is clipped to the query range and computed
    /// independently via [`Self::metrics`] (and therefore shares its
    /// cache).
    pub async fn bucketed_metrics(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket: Bucket,
    ) -> Result<Vec<BucketMetrics>> {
        let mut result = Vec::new();
        for (bucket_start, bucket_end) in bucket::boundaries(start, end, bucket) {
            let metrics = self.metrics(target_id, bucket_start, bucket_end).await?;
            result.push(BucketMetrics {
                bucket_start,
                bucket_end,
                metrics,
            });
        }
        Ok(result)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn compute(
        &self,
        target_id: TargetId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SlaMetrics> {
        let checks = self.store.checks_in_range(target_id, start, end).await?;
        let windows = self
            .store
            .windows_overlapping(target_id, start, end)
            .await?;

        let total_checks = checks.len();
        let successful_checks = checks.iter().filter(|c| c.available).count();
        let failure_count = total_checks - successful_checks;

        let samples: Vec<f64> = checks
            .iter()
            .filter(|c| c.available)
            .filter_map(|c| c.response_time_ms)
            .collect();

        let mean_response_time_ms = if samples.is_empty() {
            None
        } else {
            Some(samples.iter().sum::<f64>() / samples.len() as f64)
        };

        let percentile_response_times_ms = DEFAULT_PERCENTILES
            .iter()
            .filter_map(|&p| percentile::linear(&samples, p as f64).map(|v| (p, v)))
            .collect();

        let total_range_seconds = (end - start).num_milliseconds().max(0) as f64 / 1000.0;
        let downtime_seconds: f64 = windows
            .iter()
            .map(|w| {
                let window_end = w.ended_at.unwrap_or(end).min(end);
                let window_start = w.started_at.max(start);
                let overlap = (window_end - window_start).num_milliseconds().max(0) as f64 / 1000.0;
                overlap.max(0.0)
            })
            .sum();

        let availability_percent = if total_range_seconds <= 0.0 {
            100.0
        } else {
            ((total_range_seconds - downtime_seconds) / total_range_seconds * 100.0).clamp(0.0, 100.0)
        };

        Ok(SlaMetrics {
            target_id,
            start,
            end,
            availability_percent,
            mean_response_time_ms,
            percentile_response_times_ms,
            total_checks,
            successful_checks,
            failure_count,
            total_downtime_seconds: downtime_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mon_domain::types::ErrorKind;
    use mon_storage::model::{NewCheck, NewTarget};
    use mon_storage::MemStore;

    async fn seeded(
        hourly: impl Fn(u32) -> (bool, Option<f64>),
    ) -> (Arc<dyn Store>, TargetId, DateTime<Utc>, DateTime<Utc>) {
        let store: Arc<dyn Store> = Arc::new(MemStore::new());
        let target = store
            .create_target(NewTarget {
                url: "https://a".into(),
                name: "a".into(),
                check_interval_seconds: 3600,
                enabled: true,
            })
            .await
            .unwrap();

        let day0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let day1 = day0 + Duration::days(1);

        let mut open_window_start: Option<DateTime<Utc>> = None;
        for hour in 0..24u32 {
            let observed_at = day0 + Duration::hours(hour as i64);
            let (available, response) = hourly(hour);

            let action = match (open_window_start, available) {
                (None, false) => {
                    open_window_start = Some(observed_at);
                    mon_domain::types::DowntimeAction::Open
                }
                (Some(_), true) => {
                    open_window_start = None;
                    mon_domain::types::DowntimeAction::Close
                }
                _ => mon_domain::types::DowntimeAction::NoOp,
            };

            store
                .commit_check(
                    NewCheck {
                        target_id: target.id,
                        observed_at,
                        available,
                        status: Some(if available { 200 } else { 503 }),
                        response_time_ms: response,
                        error_kind: if available { None } else { Some(ErrorKind::Unexpected) },
                        error_detail: None,
                    },
                    action,
                )
                .await
                .unwrap();
        }

        (store, target.id, day0, day1)
    }

    #[tokio::test]
    async fn s1_uptime_only() {
        let (store, target_id, day0, day1) =
            seeded(|_hour| (true, Some(100.0))).await;
        let sla = SlaAnalytics::new(store, 300, true);
        let metrics = sla.metrics(target_id, day0, day1).await.unwrap();

        assert_eq!(metrics.availability_percent, 100.0);
        assert_eq!(metrics.total_checks, 24);
        assert_eq!(metrics.failure_count, 0);
        assert_eq!(metrics.mean_response_time_ms, Some(100.0));
    }

    #[tokio::test]
    async fn s2_one_two_hour_outage() {
        let (store, target_id, day0, day1) = seeded(|hour| {
            if (6..8).contains(&hour) {
                (false, None)
            } else {
                (true, Some(100.0))
            }
        })
        .await;
        let sla = SlaAnalytics::new(store, 300, true);
        let metrics = sla.metrics(target_id, day0, day1).await.unwrap();

        assert!((metrics.availability_percent - 91.666_666_67).abs() < 0.001);
        assert_eq!(metrics.total_downtime_seconds, 7200.0);
        assert_eq!(metrics.failure_count, 2);
    }

    #[tokio::test]
    async fn s3_ongoing_outage_counts_to_range_end() {
        let (store, target_id, day0, day1) =
            seeded(|hour| (hour < 12, Some(100.0))).await;
        let sla = SlaAnalytics::new(store, 300, true);
        let metrics = sla.metrics(target_id, day0, day1).await.unwrap();

        assert_eq!(metrics.availability_percent, 50.0);
        assert_eq!(metrics.total_downtime_seconds, 43_200.0);
    }

    #[tokio::test]
    async fn s6_percentiles_linear_interpolation() {
        let store: Arc<dyn Store> = Arc::new(MemStore::new());
        let target = store
            .create_target(NewTarget {
                url: "https://a".into(),
                name: "a".into(),
                check_interval_seconds: 3600,
                enabled: true,
            })
            .await
            .unwrap();
        let day0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for (i, rt) in (100..=190).step_by(10).enumerate() {
            store
                .commit_check(
                    NewCheck {
                        target_id: target.id,
                        observed_at: day0 + Duration::minutes(i as i64),
                        available: true,
                        status: Some(200),
                        response_time_ms: Some(rt as f64),
                        error_kind: None,
                        error_detail: None,
                    },
                    mon_domain::types::DowntimeAction::NoOp,
                )
                .await
                .unwrap();
        }

        let sla = SlaAnalytics::new(store, 300, true);
        let metrics = sla
            .metrics(target.id, day0, day0 + Duration::hours(1))
            .await
            .unwrap();

        let p = |want: u8| {
            metrics
                .percentile_response_times_ms
                .iter()
                .find(|(p, _)| *p == want)
                .map(|(_, v)| *v)
                .unwrap()
        };
        assert!((p(50) - 145.0).abs() < 0.01);
        assert!((p(90) - 181.0).abs() < 0.01);
        assert!((p(95) - 185.5).abs() < 0.01);
        assert!((p(99) - 189.1).abs() < 0.05);
    }

    #[tokio::test]
    async fn empty_sample_yields_null_stats() {
        let store: Arc<dyn Store> = Arc::new(MemStore::new());
        let target = store
            .create_target(NewTarget {
                url: "https://a".into(),
                name: "a".into(),
                check_interval_seconds: 60,
                enabled: true,
            })
            .await
            .unwrap();
        let sla = SlaAnalytics::new(store, 300, true);
        let now = Utc::now();
        let metrics = sla.metrics(target.id, now, now + Duration::hours(1)).await.unwrap();

        assert_eq!(metrics.mean_response_time_ms, None);
        assert!(metrics.percentile_response_times_ms.is_empty());
        assert_eq!(metrics.availability_percent, 100.0);
    }

    #[tokio::test]
    async fn cache_returns_same_result_despite_intervening_mutation() {
        let (store, target_id, day0, day1) =
            seeded(|_hour| (true, Some(100.0))).await;
        let sla = SlaAnalytics::new(store.clone(), 300, true);

        let first = sla.metrics(target_id, day0, day1).await.unwrap();

        store
            .commit_check(
                NewCheck {
                    target_id,
                    observed_at: day1,
                    available: false,
                    status: Some(500),
                    response_time_ms: None,
                    error_kind: Some(ErrorKind::Unexpected),
                    error_detail: None,
                },
                mon_domain::types::DowntimeAction::Open,
            )
            .await
            .unwrap();

        let second = sla.metrics(target_id, day0, day1).await.unwrap();
        assert_eq!(first, second, "cache hit returns the stale-but-consistent result");

        sla.clear_cache();
        let third = sla.metrics(target_id, day0, day1).await.unwrap();
        assert_ne!(second.total_checks, third.total_checks);
    }
}
