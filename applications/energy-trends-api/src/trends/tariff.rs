use crate::config::TariffSettings;
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::Serialize;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Half-open `[start, end)` window of UTC minutes-of-day billed at the peak rate.
///
/// A window whose end is not after its start (for example `22:00`-`02:00`)
/// does not wrap past midnight; it matches no sample at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeakWindow {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl PeakWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_minute = parse_clock_minutes(start)?;
        if start_minute == MINUTES_PER_DAY {
            return Err(AppError::InvalidPeakTime(format!(
                "peak_start cannot be 24:00: {}",
                start
            )));
        }
        Ok(Self {
            start_minute,
            end_minute: parse_clock_minutes(end)?,
        })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let minute = minute_of_day(ts);
        self.start_minute <= minute && minute < self.end_minute
    }
}

pub fn minute_of_day(ts: DateTime<Utc>) -> u32 {
    ts.hour() * 60 + ts.minute()
}

/// `HH:MM` (24-hour) to minutes since midnight. `24:00` maps to 1440 so a
/// window can run to the end of the day.
pub fn parse_clock_minutes(value: &str) -> Result<u32> {
    let value = value.trim();
    if value == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|t| t.hour() * 60 + t.minute())
        .map_err(|_| AppError::InvalidPeakTime(format!("expected HH:MM, got {:?}", value)))
}

/// Tariff fields exactly as they arrive on a request, before validation.
#[derive(Debug, Clone, Default)]
pub struct TariffParams {
    pub base_rate: Option<String>,
    pub peak_rate: Option<String>,
    pub voltage: Option<String>,
    pub power_factor: Option<String>,
    pub peak_start: Option<String>,
    pub peak_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TariffConfig {
    pub base_rate: f64,
    pub peak_rate: f64,
    pub voltage: f64,
    pub power_factor: f64,
    pub peak_window: Option<PeakWindow>,
}

impl TariffConfig {
    pub fn from_params(params: &TariffParams, defaults: &TariffSettings) -> Result<Self> {
        let base_rate = match params.base_rate.as_deref() {
            Some(raw) => parse_number("base_rate", raw)?,
            None => {
                return Err(AppError::Validation(
                    "Missing required parameter: base_rate".to_string(),
                ))
            }
        };
        if base_rate <= 0.0 {
            return Err(AppError::Validation(format!(
                "base_rate must be positive, got {}",
                base_rate
            )));
        }

        let peak_rate = optional_number("peak_rate", params.peak_rate.as_deref())?
            .unwrap_or(base_rate);
        if peak_rate < 0.0 {
            return Err(AppError::Validation(format!(
                "peak_rate must not be negative, got {}",
                peak_rate
            )));
        }

        let voltage = optional_number("voltage", params.voltage.as_deref())?
            .unwrap_or(defaults.default_voltage);
        if voltage <= 0.0 {
            return Err(AppError::Validation(format!(
                "voltage must be positive, got {}",
                voltage
            )));
        }

        let power_factor = optional_number("power_factor", params.power_factor.as_deref())?
            .unwrap_or(defaults.default_power_factor);
        if !(power_factor > 0.0 && power_factor <= 1.0) {
            return Err(AppError::Validation(format!(
                "power_factor must be in (0, 1], got {}",
                power_factor
            )));
        }

        // A window needs both bounds; a lone or blank bound leaves every sample off-peak
        let peak_window = match (
            non_blank(params.peak_start.as_deref()),
            non_blank(params.peak_end.as_deref()),
        ) {
            (Some(start), Some(end)) => Some(PeakWindow::parse(start, end)?),
            _ => None,
        };

        Ok(Self {
            base_rate,
            peak_rate,
            voltage,
            power_factor,
            peak_window,
        })
    }

    pub fn is_peak(&self, ts: DateTime<Utc>) -> bool {
        self.peak_window.is_some_and(|w| w.contains(ts))
    }

    pub fn rate_for(&self, is_peak: bool) -> f64 {
        if is_peak {
            self.peak_rate
        } else {
            self.base_rate
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|v| !v.trim().is_empty())
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Validation(format!("{} must be numeric, got {:?}", field, raw)))
}

fn optional_number(field: &str, raw: Option<&str>) -> Result<Option<f64>> {
    raw.map(|r| parse_number(field, r)).transpose()
}
