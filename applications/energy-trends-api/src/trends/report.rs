use super::aggregate::{
    daily_totals, hourly_average, round_cost, round_energy, top_usage_windows, weekday_average,
    Series, TOP_WINDOWS,
};
use super::derive::derive_samples;
use super::sample::{Sample, TimeRange};
use super::tariff::TariffConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendsReport {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub sample_count: usize,
    #[serde(rename = "total_energy_kWh")]
    pub total_energy_kwh: f64,
    #[serde(rename = "total_energy_l1_kWh")]
    pub total_energy_l1_kwh: f64,
    #[serde(rename = "total_energy_l2_kWh")]
    pub total_energy_l2_kwh: f64,
    #[serde(rename = "total_energy_l3_kWh")]
    pub total_energy_l3_kwh: f64,
    pub total_cost: f64,
    #[serde(rename = "on_peak_energy_kWh")]
    pub peak_energy_kwh: f64,
    #[serde(rename = "off_peak_energy_kWh")]
    pub off_peak_energy_kwh: f64,
    #[serde(rename = "on_peak_cost")]
    pub peak_cost: f64,
    pub off_peak_cost: f64,
    #[serde(rename = "hourly_avg_kWh")]
    pub hourly_avg_kwh: Series,
    #[serde(rename = "daily_kWh")]
    pub daily_kwh: Series,
    pub daily_cost: Series,
    #[serde(rename = "weekday_avg_kWh")]
    pub weekday_avg_kwh: Series,
    pub peak_usage_hours: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrendsOutcome {
    /// Nothing was recorded in the range. Not an error.
    NoData,
    Report(Box<TrendsReport>),
}

/// Derive energy and cost for every sample and reduce them into a report.
pub fn compute_trends(samples: &[Sample], tariff: &TariffConfig, range: TimeRange) -> TrendsOutcome {
    if samples.is_empty() {
        return TrendsOutcome::NoData;
    }

    let derived = derive_samples(samples, tariff);

    let mut total_energy = 0.0;
    let mut total_cost = 0.0;
    let mut peak_energy = 0.0;
    let mut peak_cost = 0.0;
    let mut phase_energy = [0.0f64; 3];
    for sample in &derived {
        total_energy += sample.total_energy_kwh;
        total_cost += sample.cost;
        for (acc, e) in phase_energy.iter_mut().zip(sample.energy_kwh) {
            *acc += e;
        }
        if sample.is_peak {
            peak_energy += sample.total_energy_kwh;
            peak_cost += sample.cost;
        }
    }
    // off-peak is derived, never accumulated
    let off_peak_energy = total_energy - peak_energy;
    let off_peak_cost = total_cost - peak_cost;

    let daily = daily_totals(&derived);
    let weekday_avg_kwh = weekday_average(&daily);

    TrendsOutcome::Report(Box::new(TrendsReport {
        start_date: range.start,
        end_date: range.end,
        sample_count: derived.len(),
        total_energy_kwh: round_energy(total_energy),
        total_energy_l1_kwh: round_energy(phase_energy[0]),
        total_energy_l2_kwh: round_energy(phase_energy[1]),
        total_energy_l3_kwh: round_energy(phase_energy[2]),
        total_cost: round_cost(total_cost),
        peak_energy_kwh: round_energy(peak_energy),
        off_peak_energy_kwh: round_energy(off_peak_energy),
        peak_cost: round_cost(peak_cost),
        off_peak_cost: round_cost(off_peak_cost),
        hourly_avg_kwh: hourly_average(&derived),
        daily_kwh: daily.energy,
        daily_cost: daily.cost,
        weekday_avg_kwh,
        peak_usage_hours: top_usage_windows(&derived, TOP_WINDOWS),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::tariff::PeakWindow;
    use chrono::{Duration, TimeZone};

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn tariff(window: Option<PeakWindow>) -> TariffConfig {
        TariffConfig {
            base_rate: 35.0,
            peak_rate: 40.0,
            voltage: 230.0,
            power_factor: 0.9,
            peak_window: window,
        }
    }

    fn evening_peak() -> Option<PeakWindow> {
        Some(PeakWindow {
            start_minute: 18 * 60 + 30,
            end_minute: 22 * 60 + 30,
        })
    }

    /// A sample every minute across three days, with a dropout and varying load.
    fn week_of_samples() -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2025, 4, 4, 0, 0, 0).unwrap();
        (0..3 * 24 * 60)
            .filter(|i| !(600..700).contains(i))
            .map(|i| {
                let load = (i % 97) as f64 / 10.0;
                Sample::new(start + Duration::minutes(i), load, load * 0.5, 2.0)
            })
            .collect()
    }

    fn unwrap_report(outcome: TrendsOutcome) -> TrendsReport {
        match outcome {
            TrendsOutcome::Report(report) => *report,
            TrendsOutcome::NoData => panic!("expected a report"),
        }
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert_eq!(
            compute_trends(&[], &tariff(evening_peak()), range()),
            TrendsOutcome::NoData
        );
    }

    #[test]
    fn test_single_sample_reports_zero_totals() {
        let sample = Sample::new(Utc.with_ymd_and_hms(2025, 4, 4, 19, 0, 0).unwrap(), 9.0, 9.0, 9.0);
        let report = unwrap_report(compute_trends(&[sample], &tariff(evening_peak()), range()));

        assert_eq!(report.sample_count, 1);
        assert_eq!(report.total_energy_kwh, 0.0);
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.peak_energy_kwh, 0.0);
        assert_eq!(report.off_peak_energy_kwh, 0.0);
        assert_eq!(report.daily_kwh.data, vec![0.0]);
        assert_eq!(report.peak_usage_hours.len(), 1);
    }

    #[test]
    fn test_peak_and_off_peak_partition_totals() {
        let report = unwrap_report(compute_trends(
            &week_of_samples(),
            &tariff(evening_peak()),
            range(),
        ));

        assert!(report.peak_energy_kwh > 0.0);
        assert!(report.off_peak_energy_kwh > 0.0);
        assert!(
            (report.peak_energy_kwh + report.off_peak_energy_kwh - report.total_energy_kwh).abs()
                < 1e-3
        );
        assert!((report.peak_cost + report.off_peak_cost - report.total_cost).abs() < 2e-2);
    }

    #[test]
    fn test_daily_totals_add_up_to_total() {
        let report = unwrap_report(compute_trends(
            &week_of_samples(),
            &tariff(evening_peak()),
            range(),
        ));

        let daily_sum: f64 = report.daily_kwh.data.iter().sum();
        assert_eq!(report.daily_kwh.len(), 3);
        assert!((daily_sum - report.total_energy_kwh).abs() < 1e-3);

        let phase_sum =
            report.total_energy_l1_kwh + report.total_energy_l2_kwh + report.total_energy_l3_kwh;
        assert!((phase_sum - report.total_energy_kwh).abs() < 1e-3);
    }

    #[test]
    fn test_no_peak_window_bills_everything_off_peak() {
        let report = unwrap_report(compute_trends(&week_of_samples(), &tariff(None), range()));

        assert_eq!(report.peak_energy_kwh, 0.0);
        assert_eq!(report.peak_cost, 0.0);
        assert_eq!(report.off_peak_energy_kwh, report.total_energy_kwh);
        assert_eq!(report.off_peak_cost, report.total_cost);
        assert!((report.total_cost - report.total_energy_kwh * 35.0).abs() < 1e-2);
    }

    #[test]
    fn test_series_lists_are_parallel() {
        let report = unwrap_report(compute_trends(
            &week_of_samples(),
            &tariff(evening_peak()),
            range(),
        ));

        for series in [
            &report.hourly_avg_kwh,
            &report.daily_kwh,
            &report.daily_cost,
            &report.weekday_avg_kwh,
            &report.peak_usage_hours,
        ] {
            assert_eq!(series.labels.len(), series.data.len());
        }
        assert_eq!(report.hourly_avg_kwh.len(), 24);
        assert_eq!(report.peak_usage_hours.len(), 3);
        assert_eq!(
            report.weekday_avg_kwh.labels,
            vec!["Friday", "Saturday", "Sunday"]
        );
    }

    #[test]
    fn test_report_json_keys() {
        let report = unwrap_report(compute_trends(
            &week_of_samples(),
            &tariff(evening_peak()),
            range(),
        ));
        let json = serde_json::to_value(&report).unwrap();

        for key in [
            "total_energy_kWh",
            "total_cost",
            "on_peak_energy_kWh",
            "off_peak_energy_kWh",
            "on_peak_cost",
            "off_peak_cost",
            "hourly_avg_kWh",
            "daily_kWh",
            "daily_cost",
            "weekday_avg_kWh",
            "peak_usage_hours",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert!(json["daily_kWh"]["labels"].is_array());
        assert!(json["daily_kWh"]["data"].is_array());
    }
}
