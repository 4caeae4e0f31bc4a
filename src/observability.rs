use crate::report::ReportError;

/// Counter: snapshot builds. Labels: status (ok, or the error kind).
pub const SNAPSHOTS_TOTAL: &str = "occupancy_snapshots_total";

/// Histogram: end-to-end snapshot build time in seconds, fetch included.
pub const SNAPSHOT_DURATION_SECONDS: &str = "occupancy_snapshot_duration_seconds";

/// Histogram: data source fetch time in seconds.
pub const FETCH_DURATION_SECONDS: &str = "occupancy_fetch_duration_seconds";

/// Counter: interval rows discarded for inverted or out-of-range bounds.
pub const INTERVALS_DROPPED_TOTAL: &str = "occupancy_intervals_dropped_total";

/// Counter: resources classified. Labels: state.
pub const RESOURCES_CLASSIFIED_TOTAL: &str = "occupancy_resources_classified_total";

/// Install a fmt subscriber for binaries, benches and tests. No-op if one is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Map a build failure to a short label for metrics.
pub fn error_label(err: &ReportError) -> &'static str {
    match err {
        ReportError::Source(_) => "source_error",
        ReportError::InvalidWindow { .. } => "invalid_window",
        ReportError::InvalidOperatingHours { .. } => "invalid_operating_hours",
        ReportError::LimitExceeded(_) => "limit_exceeded",
    }
}
