use chrono::NaiveDate;

use crate::source::SourceError;

#[derive(Debug)]
pub enum ReportError {
    /// The data source failed; the inner error is passed through untouched.
    Source(SourceError),
    InvalidWindow {
        start: NaiveDate,
        end: NaiveDate,
    },
    InvalidOperatingHours {
        open: u32,
        close: u32,
    },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Source(e) => write!(f, "data source error: {e}"),
            ReportError::InvalidWindow { start, end } => {
                write!(f, "query window ends ({end}) before it starts ({start})")
            }
            ReportError::InvalidOperatingHours { open, close } => {
                write!(f, "operating hours [{open}:00, {close}:00) are not a range within one day")
            }
            ReportError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Source(e) => Some(&**e),
            _ => None,
        }
    }
}
