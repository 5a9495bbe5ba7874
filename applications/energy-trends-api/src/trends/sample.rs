use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One raw meter reading: RMS current per phase at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub irms: [f64; 3],
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, irms1: f64, irms2: f64, irms3: f64) -> Self {
        Self {
            timestamp,
            irms: [irms1, irms2, irms3],
        }
    }
}

/// Closed interval `[start, end]` used to select samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse RFC 3339 bounds; a trailing `Z` is read as UTC.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_instant("start_date", start)?, parse_instant("end_date", end)?)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("Invalid date format for {}: {}", field, value)))
}
