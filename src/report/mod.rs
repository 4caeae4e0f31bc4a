mod bucket;
mod classify;
mod error;
mod peak;
mod snapshot;

pub use bucket::{
    Bucket, BucketMap, HourlyBuckets, WeekdayBuckets, bucketize_hourly, bucketize_hours, bucketize_weekday,
};
pub use classify::{Classification, CurrentState, classify, classify_detailed};
pub use error::ReportError;
pub use peak::peaks;
pub use snapshot::{
    AvailabilitySnapshot, CapacitySummary, HourlyPoint, ResourceStatus, SnapshotAggregator, StateCounts,
    StatePercentages, assemble_snapshot, percentage,
};
