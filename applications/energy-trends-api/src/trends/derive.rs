use super::sample::Sample;
use super::tariff::TariffConfig;
use chrono::{DateTime, Utc};

/// Longest gap between consecutive samples that still carries energy.
/// Anything longer is treated as a sensor dropout.
pub const GAP_THRESHOLD_SECS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSample {
    pub timestamp: DateTime<Utc>,
    pub delta_seconds: f64,
    pub energy_kwh: [f64; 3],
    pub total_energy_kwh: f64,
    pub is_peak: bool,
    pub rate: f64,
    pub cost: f64,
}

/// Seconds from `current` until `next`, or 0 when there is no successor or
/// the gap exceeds [`GAP_THRESHOLD_SECS`].
pub fn delta_seconds(current: DateTime<Utc>, next: Option<DateTime<Utc>>) -> f64 {
    let Some(next) = next else {
        return 0.0;
    };
    let Some(micros) = (next - current).num_microseconds() else {
        return 0.0;
    };
    let secs = micros as f64 / 1_000_000.0;
    if secs > GAP_THRESHOLD_SECS || secs < 0.0 {
        0.0
    } else {
        secs
    }
}

/// Energy in kWh for one phase held at `irms` amps for `delta_seconds`.
pub fn phase_energy_kwh(voltage: f64, power_factor: f64, irms: f64, delta_seconds: f64) -> f64 {
    voltage * power_factor * irms * (delta_seconds / 3600.0) / 1000.0
}

/// Derive per-sample energy and cost. Samples must be sorted ascending.
pub fn derive_samples(samples: &[Sample], tariff: &TariffConfig) -> Vec<DerivedSample> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let next = samples.get(i + 1).map(|s| s.timestamp);
            let delta = delta_seconds(sample.timestamp, next);

            let energy_kwh = sample
                .irms
                .map(|irms| phase_energy_kwh(tariff.voltage, tariff.power_factor, irms, delta));
            let total_energy_kwh = energy_kwh.iter().sum::<f64>();

            let is_peak = tariff.is_peak(sample.timestamp);
            let rate = tariff.rate_for(is_peak);

            DerivedSample {
                timestamp: sample.timestamp,
                delta_seconds: delta,
                energy_kwh,
                total_energy_kwh,
                is_peak,
                rate,
                cost: total_energy_kwh * rate,
            }
        })
        .collect()
}
