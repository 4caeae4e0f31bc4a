use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::*;
use crate::report::ReportError;

/// Unix milliseconds, the only time type.
pub type Ms = i64;

pub const HOUR_MS: Ms = 3_600_000;
pub const DAY_MS: Ms = 24 * HOUR_MS;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Intersection with `bounds`, or `None` when no instant of `self` lies inside.
    pub fn clip(&self, bounds: &Span) -> Option<Span> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        (start < end).then(|| Span::new(start, end))
    }
}

// ── Calendar helpers ─────────────────────────────────────────────

/// Midnight at the start of `date`.
pub fn day_start(date: NaiveDate) -> Ms {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Calendar date-time of a timestamp; `None` outside the representable range.
pub fn datetime(t: Ms) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(t).map(|dt| dt.naive_utc())
}

pub fn date_of(t: Ms) -> Option<NaiveDate> {
    datetime(t).map(|dt| dt.date())
}

/// The whole calendar day `[00:00, 24:00)` of `date`.
pub fn day_span(date: NaiveDate) -> Span {
    let start = day_start(date);
    Span::new(start, start + DAY_MS)
}

// ── Statuses ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} status: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseStatusError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Holds the resource at the instants it covers.
    pub fn is_current(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    pub fn counts_toward_occupancy(self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" | "canceled" => Ok(ReservationStatus::Cancelled),
            "completed" => Ok(ReservationStatus::Completed),
            _ => Err(ParseStatusError {
                kind: "reservation",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
        }
    }

    /// Takes the resource out of service at the instants it covers.
    pub fn is_active(self) -> bool {
        matches!(self, MaintenanceStatus::Pending | MaintenanceStatus::InProgress)
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MaintenanceStatus::Pending),
            "in_progress" => Ok(MaintenanceStatus::InProgress),
            "completed" => Ok(MaintenanceStatus::Completed),
            _ => Err(ParseStatusError {
                kind: "maintenance",
                value: s.to_string(),
            }),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────

/// What an interval represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum IntervalKind {
    Reservation(ReservationStatus),
    Maintenance(MaintenanceStatus),
}

/// A single occupation of a resource. Reservations and maintenance windows are both intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub id: Ulid,
    pub resource_id: Ulid,
    /// Raw row bounds; may be inverted when the source data is bad.
    pub span: Span,
    pub kind: IntervalKind,
}

impl Interval {
    pub fn reservation(resource_id: Ulid, start: Ms, end: Ms, status: ReservationStatus) -> Self {
        Self {
            id: Ulid::new(),
            resource_id,
            span: Span { start, end },
            kind: IntervalKind::Reservation(status),
        }
    }

    pub fn maintenance(resource_id: Ulid, start: Ms, end: Ms, status: MaintenanceStatus) -> Self {
        Self {
            id: Ulid::new(),
            resource_id,
            span: Span { start, end },
            kind: IntervalKind::Maintenance(status),
        }
    }

    pub fn is_reservation(&self) -> bool {
        matches!(self.kind, IntervalKind::Reservation(_))
    }

    pub fn is_maintenance(&self) -> bool {
        matches!(self.kind, IntervalKind::Maintenance(_))
    }

    /// `end >= start`, both within the representable calendar range.
    pub fn is_valid(&self) -> bool {
        self.span.start <= self.span.end
            && self.span.start >= MIN_VALID_TIMESTAMP_MS
            && self.span.end <= MAX_VALID_TIMESTAMP_MS
    }

    /// Whether this interval decides the resource's state at `now`.
    pub fn is_active_at(&self, now: Ms) -> bool {
        if !self.is_valid() || !self.span.contains_instant(now) {
            return false;
        }
        match self.kind {
            IntervalKind::Reservation(status) => status.is_current(),
            IntervalKind::Maintenance(status) => status.is_active(),
        }
    }

    /// Whether this interval lands in historical occupancy buckets.
    pub fn counts_toward_occupancy(&self) -> bool {
        match self.kind {
            IntervalKind::Reservation(status) => status.counts_toward_occupancy(),
            IntervalKind::Maintenance(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Ulid,
    pub name: String,
    pub type_id: Ulid,
    pub enabled: bool,
    /// Total bookable units.
    pub capacity: u32,
    /// Display only.
    pub location: Option<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, type_id: Ulid, capacity: u32) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            type_id,
            enabled: true,
            capacity,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// ── Query parameters ─────────────────────────────────────────────

/// Optional narrowing of a report to one resource type and/or one resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFilter {
    pub resource_type: Option<Ulid>,
    pub resource_id: Option<Ulid>,
}

impl ResourceFilter {
    pub fn matches(&self, resource: &Resource) -> bool {
        self.resource_type.is_none_or(|t| t == resource.type_id)
            && self.resource_id.is_none_or(|id| id == resource.id)
    }
}

/// Report range in whole days, `start` and `end` both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub filter: ResourceFilter,
}

impl QueryWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if end < start {
            return Err(ReportError::InvalidWindow { start, end });
        }
        if (end - start).num_days() + 1 > MAX_QUERY_WINDOW_DAYS {
            return Err(ReportError::LimitExceeded("query window too wide"));
        }
        if day_start(start) < MIN_VALID_TIMESTAMP_MS || day_start(end) + DAY_MS - 1 > MAX_VALID_TIMESTAMP_MS {
            return Err(ReportError::LimitExceeded("query window out of range"));
        }
        Ok(Self {
            start,
            end,
            filter: ResourceFilter::default(),
        })
    }

    pub fn with_resource_type(mut self, type_id: Ulid) -> Self {
        self.filter.resource_type = Some(type_id);
        self
    }

    pub fn with_resource(mut self, resource_id: Ulid) -> Self {
        self.filter.resource_id = Some(resource_id);
        self
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// `[start 00:00, end + 1 day 00:00)`.
    pub fn span(&self) -> Span {
        Span::new(day_start(self.start), day_start(self.end) + DAY_MS)
    }
}

/// Hours of the day a report's hourly heatmap covers, `[open:00, close:00)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatingHours {
    open: u32,
    close: u32,
}

impl OperatingHours {
    pub const ALL_DAY: Self = Self { open: 0, close: 24 };

    pub fn new(open: u32, close: u32) -> Result<Self, ReportError> {
        if open >= close || close > 24 {
            return Err(ReportError::InvalidOperatingHours { open, close });
        }
        Ok(Self { open, close })
    }

    pub fn open(&self) -> u32 {
        self.open
    }

    pub fn close(&self) -> u32 {
        self.close
    }

    pub fn hours(&self) -> Range<u32> {
        self.open..self.close
    }

    pub fn span_on(&self, day: NaiveDate) -> Span {
        let midnight = day_start(day);
        Span::new(
            midnight + self.open as Ms * HOUR_MS,
            midnight + self.close as Ms * HOUR_MS,
        )
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self { open: 7, close: 22 }
    }
}
