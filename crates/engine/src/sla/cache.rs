//! Process-local, TTL-based cache for [`super::SlaMetrics`] lookups.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use mon_domain::types::TargetId;

use super::bucket::Bucket;
use super::SlaMetrics;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub target_id: TargetId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bucket: Option<Bucket>,
}

struct CacheEntry {
    value: SlaMetrics,
    inserted_at: DateTime<Utc>,
}

/// Keyed on `(target_id, start, end, bucket?)`. Disabled caches act as a
/// pass-through (every lookup is a miss, nothing is ever stored).
pub struct SlaCache {
    ttl_seconds: u64,
    enabled: bool,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl SlaCache {
    pub fn new(ttl_seconds: u64, enabled: bool) -> Self {
        Self {
            ttl_seconds,
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<SlaMetrics> {
        if !self.enabled {
            return None;
        }
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        let age = Utc::now() - entry.inserted_at;
        if age > chrono::Duration::seconds(self.ttl_seconds as i64) {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: CacheKey, value: SlaMetrics) {
        if !self.enabled {
            return;
        }
        self.entries.write().insert(
            key,
            CacheEntry {
                value,
                inserted_at: Utc::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(target_id: TargetId) -> SlaMetrics {
        let now = Utc::now();
        SlaMetrics {
            target_id,
            start: now,
            end: now,
            availability_percent: 100.0,
            mean_response_time_ms: None,
            percentile_response_times_ms: Vec::new(),
            total_checks: 0,
            successful_checks: 0,
            failure_count: 0,
            total_downtime_seconds: 0.0,
        }
    }

    fn key(target_id: TargetId) -> CacheKey {
        let now = Utc::now();
        CacheKey {
            target_id,
            start: now,
            end: now,
            bucket: None,
        }
    }

    #[test]
    fn hit_after_put() {
        let cache = SlaCache::new(300, true);
        let k = key(1);
        cache.put(k.clone(), sample(1));
        assert!(cache.get(&k).is_some());
    }

    #[test]
    fn zero_ttl_is_always_a_miss() {
        let cache = SlaCache::new(0, true);
        let k = key(1);
        cache.put(k.clone(), sample(1));
        assert!(cache.get(&k).is_none());
    }

    #[test]
    fn disabled_cache_never_stores() {
        let cache = SlaCache::new(300, false);
        let k = key(1);
        cache.put(k.clone(), sample(1));
        assert!(cache.get(&k).is_none());
    }

    #[test]
    fn clear_drops_every_entry() {
        let cache = SlaCache::new(300, true);
        let k = key(1);
        cache.put(k.clone(), sample(1));
        cache.clear();
        assert!(cache.get(&k).is_none());
    }
}
