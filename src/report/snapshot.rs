use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::config::ReportConfig;
use crate::limits::*;
use crate::model::*;
use crate::observability::{self, *};
use crate::source::{DataSource, FetchedRows};

use super::ReportError;
use super::bucket::{HourlyBuckets, WeekdayBuckets, bucketize_hours, bucketize_weekday};
use super::classify::{CurrentState, classify_detailed};
use super::peak::peaks;

// ── Snapshot types ───────────────────────────────────────────────

/// One resource as it stands at the snapshot's `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus {
    pub id: Ulid,
    pub name: String,
    pub type_id: Ulid,
    pub location: Option<String>,
    pub capacity: u32,
    pub state: CurrentState,
    /// Interval that decided `state`.
    pub interval_id: Option<Ulid>,
    pub occupied_until: Option<Ms>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub available: usize,
    pub reserved: usize,
    pub maintenance: usize,
}

impl StateCounts {
    pub fn total(&self) -> usize {
        self.available + self.reserved + self.maintenance
    }

    pub fn get(&self, state: CurrentState) -> usize {
        match state {
            CurrentState::Available => self.available,
            CurrentState::Reserved => self.reserved,
            CurrentState::Maintenance => self.maintenance,
        }
    }

    fn add(&mut self, state: CurrentState) {
        match state {
            CurrentState::Available => self.available += 1,
            CurrentState::Reserved => self.reserved += 1,
            CurrentState::Maintenance => self.maintenance += 1,
        }
    }

    pub fn percentages(&self) -> StatePercentages {
        let total = self.total();
        StatePercentages {
            available: percentage(self.available, total),
            reserved: percentage(self.reserved, total),
            maintenance: percentage(self.maintenance, total),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatePercentages {
    pub available: f64,
    pub reserved: f64,
    pub maintenance: f64,
}

/// Units across classified resources, and how many of them sit on available resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapacitySummary {
    pub total: u64,
    pub available: u64,
}

/// One point of today's chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyPoint {
    pub hour: u8,
    pub count: u32,
    /// Distinct resources occupied during this hour.
    pub resources: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilitySnapshot {
    pub window: QueryWindow,
    pub now: Ms,
    /// Calendar day of `now`; the hourly heatmap covers it.
    pub today: NaiveDate,
    pub operating_hours: OperatingHours,
    pub resources: Vec<ResourceStatus>,
    /// Disabled resources left out of classification and totals.
    pub disabled: Vec<Ulid>,
    pub counts: StateCounts,
    pub percentages: StatePercentages,
    pub capacity: CapacitySummary,
    pub hourly: HourlyBuckets,
    pub hourly_series: Vec<HourlyPoint>,
    pub weekday: WeekdayBuckets,
    pub peak_hours: Vec<u8>,
    pub peak_weekdays: Vec<u8>,
    /// Interval rows discarded for bad bounds.
    pub dropped_intervals: usize,
}

/// `count / total * 100`, or 0 when there is nothing to divide by.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

// ── Assembly ─────────────────────────────────────────────────────

/// Build a snapshot from rows already fetched for `window`.
///
/// Pipeline: drop invalid intervals → classify (maintenance before reservations)
/// → tally → hourly buckets for the day of `now` within operating hours →
/// weekday buckets over the window → peaks.
/// Occupancy buckets are fed from reservations of reported resources only.
pub fn assemble_snapshot(
    window: &QueryWindow,
    rows: FetchedRows,
    now: Ms,
    config: &ReportConfig,
) -> Result<AvailabilitySnapshot, ReportError> {
    if !(MIN_VALID_TIMESTAMP_MS..=MAX_VALID_TIMESTAMP_MS).contains(&now) {
        return Err(ReportError::LimitExceeded("now out of range"));
    }
    let today = date_of(now).ok_or(ReportError::LimitExceeded("now out of range"))?;

    let FetchedRows {
        resources,
        maintenance,
        reservations,
    } = rows;
    let (maintenance, dropped_maintenance) = retain_valid(maintenance);
    let (mut reservations, dropped_reservations) = retain_valid(reservations);
    let dropped_intervals = dropped_maintenance + dropped_reservations;
    if dropped_intervals > 0 {
        debug!("dropped {dropped_intervals} interval(s) with invalid bounds");
        metrics::counter!(INTERVALS_DROPPED_TOTAL).increment(dropped_intervals as u64);
    }

    let mut statuses = Vec::with_capacity(resources.len());
    let mut disabled = Vec::new();
    let mut counts = StateCounts::default();
    let mut capacity = CapacitySummary::default();

    for resource in resources {
        if !resource.enabled && !config.include_disabled {
            disabled.push(resource.id);
            continue;
        }
        let decided = classify_detailed(&resource, &maintenance, &reservations, now);
        counts.add(decided.state);
        capacity.total += resource.capacity as u64;
        if decided.state == CurrentState::Available {
            capacity.available += resource.capacity as u64;
        }
        statuses.push(ResourceStatus {
            id: resource.id,
            name: resource.name,
            type_id: resource.type_id,
            location: resource.location,
            capacity: resource.capacity,
            state: decided.state,
            interval_id: decided.interval_id,
            occupied_until: decided.occupied_until,
        });
    }
    for state in CurrentState::ALL {
        metrics::counter!(RESOURCES_CLASSIFIED_TOTAL, "state" => state.as_str())
            .increment(counts.get(state) as u64);
    }

    let reported: HashSet<Ulid> = statuses.iter().map(|s| s.id).collect();
    reservations.retain(|i| i.is_reservation() && reported.contains(&i.resource_id));

    let hourly = bucketize_hours(&reservations, today, config.operating_hours);
    let open = config.operating_hours.hours();
    let hourly_series = hourly
        .iter()
        .filter(|b| open.contains(&(b.key as u32)))
        .map(|b| HourlyPoint {
            hour: b.key,
            count: b.count,
            resources: b.resources.len(),
        })
        .collect();
    let weekday = bucketize_weekday(&reservations, window);

    Ok(AvailabilitySnapshot {
        window: *window,
        now,
        today,
        operating_hours: config.operating_hours,
        resources: statuses,
        disabled,
        percentages: counts.percentages(),
        counts,
        capacity,
        peak_hours: peaks(&hourly),
        peak_weekdays: peaks(&weekday),
        hourly,
        hourly_series,
        weekday,
        dropped_intervals,
    })
}

/// Keep valid intervals; return how many were discarded.
fn retain_valid(mut intervals: Vec<Interval>) -> (Vec<Interval>, usize) {
    let before = intervals.len();
    intervals.retain(Interval::is_valid);
    let dropped = before - intervals.len();
    (intervals, dropped)
}

// ── Aggregator ───────────────────────────────────────────────────

/// Fetches rows for a report request and turns them into an [`AvailabilitySnapshot`].
///
/// Holds no per-request state, so one aggregator serves concurrent requests.
pub struct SnapshotAggregator<S> {
    source: S,
    config: ReportConfig,
}

impl<S: DataSource> SnapshotAggregator<S> {
    pub fn new(source: S, config: ReportConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Fetch once, then assemble. A failed fetch is returned as
    /// [`ReportError::Source`] with no retry; empty rows give an all-zero snapshot.
    pub async fn build_snapshot(
        &self,
        window: &QueryWindow,
        now: Ms,
    ) -> Result<AvailabilitySnapshot, ReportError> {
        let started = Instant::now();
        let result = self.fetch_and_assemble(window, now).await;
        metrics::histogram!(SNAPSHOT_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match &result {
            Ok(snapshot) => {
                metrics::counter!(SNAPSHOTS_TOTAL, "status" => "ok").increment(1);
                info!(
                    "snapshot {}..{}: {} resources ({} available, {} reserved, {} maintenance), {} disabled",
                    window.start,
                    window.end,
                    snapshot.counts.total(),
                    snapshot.counts.available,
                    snapshot.counts.reserved,
                    snapshot.counts.maintenance,
                    snapshot.disabled.len(),
                );
            }
            Err(e) => {
                metrics::counter!(SNAPSHOTS_TOTAL, "status" => observability::error_label(e)).increment(1);
            }
        }
        result
    }

    async fn fetch_and_assemble(
        &self,
        window: &QueryWindow,
        now: Ms,
    ) -> Result<AvailabilitySnapshot, ReportError> {
        let fetch_start = Instant::now();
        let rows = self.source.fetch(window).await.map_err(|e| {
            warn!("snapshot fetch failed for {}..{}: {e}", window.start, window.end);
            ReportError::Source(e)
        })?;
        metrics::histogram!(FETCH_DURATION_SECONDS).record(fetch_start.elapsed().as_secs_f64());

        assemble_snapshot(window, rows, now, &self.config)
    }
}
