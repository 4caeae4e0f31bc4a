use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::ser::{Serialize, Serializer};
use ulid::Ulid;

use crate::model::*;

/// One aggregation slot: an hour of the day or a weekday.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Bucket {
    pub key: u8,
    /// Intervals that touched this slot.
    pub count: u32,
    /// Distinct resources behind `count`.
    pub resources: BTreeSet<Ulid>,
}

impl Bucket {
    fn empty(key: u8) -> Self {
        Self {
            key,
            count: 0,
            resources: BTreeSet::new(),
        }
    }
}

/// Fixed set of `N` buckets keyed `0..N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketMap<const N: usize> {
    buckets: [Bucket; N],
}

/// Hour of day, 0–23.
pub type HourlyBuckets = BucketMap<24>;
/// Weekday counted from Monday, 0–6.
pub type WeekdayBuckets = BucketMap<7>;

impl<const N: usize> BucketMap<N> {
    pub fn new() -> Self {
        Self {
            buckets: std::array::from_fn(|key| Bucket::empty(key as u8)),
        }
    }

    pub fn get(&self, key: usize) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    /// Count at `key`; 0 for keys outside the map.
    pub fn count(&self, key: usize) -> u32 {
        self.get(key).map_or(0, |b| b.count)
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Count one hit at `key`. Keys outside `0..N` are ignored.
    pub fn record(&mut self, key: usize, resource_id: Ulid) {
        if let Some(bucket) = self.buckets.get_mut(key) {
            bucket.count += 1;
            bucket.resources.insert(resource_id);
        }
    }

    /// Combine two partial maps: counts add, resource sets union.
    pub fn merge(mut self, other: &Self) -> Self {
        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            mine.count += theirs.count;
            mine.resources.extend(theirs.resources.iter().copied());
        }
        self
    }
}

impl<const N: usize> Default for BucketMap<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Serialize for BucketMap<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.buckets.iter())
    }
}

// ── Bucketization ────────────────────────────────────────────────

/// Hour-of-day occupancy for one calendar `day`.
pub fn bucketize_hourly(intervals: &[Interval], day: NaiveDate) -> HourlyBuckets {
    bucketize_hours(intervals, day, OperatingHours::ALL_DAY)
}

/// Hour-of-day occupancy for `day`, counting only time inside `hours`.
///
/// Each interval is clipped to `[day open:00, day close:00)` and increments every
/// hour from the clipped start up to the hour holding `clipped end - 1ms`, so an
/// interval ending exactly on `10:00` stops at hour 9.
pub fn bucketize_hours(intervals: &[Interval], day: NaiveDate, hours: OperatingHours) -> HourlyBuckets {
    let midnight = day_start(day);
    let bounds = hours.span_on(day);
    let mut map = HourlyBuckets::new();

    for interval in occupying(intervals) {
        let Some(clipped) = interval.span.clip(&bounds) else {
            continue;
        };
        let first = ((clipped.start - midnight) / HOUR_MS) as usize;
        let last = ((clipped.end - 1 - midnight) / HOUR_MS) as usize;
        for hour in first..=last {
            map.record(hour, interval.resource_id);
        }
    }

    map
}

/// Weekday occupancy over the whole query window.
///
/// Each interval is clipped to the window and counted once for every calendar
/// day it occupies, from the day of the clipped start to the day holding
/// `clipped end - 1ms`. A day the interval only touches at midnight is not counted.
pub fn bucketize_weekday(intervals: &[Interval], window: &QueryWindow) -> WeekdayBuckets {
    let bounds = window.span();
    let mut map = WeekdayBuckets::new();

    for interval in occupying(intervals) {
        let Some(clipped) = interval.span.clip(&bounds) else {
            continue;
        };
        let (Some(first), Some(last)) = (date_of(clipped.start), date_of(clipped.end - 1)) else {
            continue;
        };
        for day in first.iter_days().take_while(|d| *d <= last) {
            map.record(day.weekday().num_days_from_monday() as usize, interval.resource_id);
        }
    }

    map
}

fn occupying(intervals: &[Interval]) -> impl Iterator<Item = &Interval> {
    intervals
        .iter()
        .filter(|i| i.is_valid() && i.counts_toward_occupancy())
}
