use crate::model::OperatingHours;
use crate::report::ReportError;

pub const OPEN_HOUR_VAR: &str = "OCCUPANCY_OPEN_HOUR";
pub const CLOSE_HOUR_VAR: &str = "OCCUPANCY_CLOSE_HOUR";
pub const INCLUDE_DISABLED_VAR: &str = "OCCUPANCY_INCLUDE_DISABLED";

/// Per-deployment knobs for snapshot building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportConfig {
    /// Range covered by the hourly heatmap; 07:00–22:00 unless configured.
    pub operating_hours: OperatingHours,
    /// Classify disabled resources like any other instead of listing them apart.
    pub include_disabled: bool,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparsable values fall back to their defaults; the resulting hours are validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ReportError> {
        let defaults = OperatingHours::default();
        let open: u32 = lookup(OPEN_HOUR_VAR)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.open());
        let close: u32 = lookup(CLOSE_HOUR_VAR)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.close());
        let include_disabled = lookup(INCLUDE_DISABLED_VAR)
            .and_then(|s| parse_flag(&s))
            .unwrap_or(false);

        Ok(Self {
            operating_hours: OperatingHours::new(open, close)?,
            include_disabled,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
