/// Widest report window, counted in whole days (both ends inclusive).
pub const MAX_QUERY_WINDOW_DAYS: i64 = 3_660;

/// 0001-01-01T00:00:00.000
pub const MIN_VALID_TIMESTAMP_MS: i64 = -62_135_596_800_000;

/// 9999-12-31T23:59:59.999
pub const MAX_VALID_TIMESTAMP_MS: i64 = 253_402_300_799_999;
