//! Bucket boundary alignment for bucketed SLA metrics.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Day,
    Week,
    Month,
}

/// Day: midnight UTC. Week: Monday 00:00 UTC (ISO). Month: first day of
/// the month, 00:00 UTC.
fn floor_to_bucket(at: DateTime<Utc>, bucket: Bucket) -> DateTime<Utc> {
    let midnight = at.date_naive().and_hms_opt(0, 0, 0).unwrap();
    match bucket {
        Bucket::Day => Utc.from_utc_datetime(&midnight),
        Bucket::Week => {
            let days_since_monday = midnight.weekday().num_days_from_monday();
            Utc.from_utc_datetime(&(midnight - Duration::days(days_since_monday as i64)))
        }
        Bucket::Month => {
            let first_of_month = midnight.with_day(1).unwrap();
            Utc.from_utc_datetime(&first_of_month)
        }
    }
}

fn advance(at: DateTime<Utc>, bucket: Bucket) -> DateTime<Utc> {
    match bucket {
        Bucket::Day => at + Duration::days(1),
        Bucket::Week => at + Duration::weeks(1),
        Bucket::Month => {
            let naive = at.date_naive();
            let (year, month) = if naive.month() == 12 {
                (naive.year() + 1, 1)
            } else {
                (naive.year(), naive.month() + 1)
            };
            let next = chrono::NaiveDate::from_ymd_opt(year, month, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            Utc.from_utc_datetime(&next)
        }
    }
}

/// `[start, end]` split into aligned buckets, each clipped to the overall
/// range. Returns `(bucket_start, bucket_end)` pairs in chronological
/// order.
pub fn boundaries(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bucket: Bucket,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if start >= end {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut cursor = floor_to_bucket(start, bucket);

    while cursor < end {
        let next = advance(cursor, bucket);
        let clipped_start = cursor.max(start);
        let clipped_end = next.min(end);
        if clipped_start < clipped_end {
            result.push((clipped_start, clipped_end));
        }
        cursor = next;
    }

    result
}
