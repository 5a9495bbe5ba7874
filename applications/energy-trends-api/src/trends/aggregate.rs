//! Grouped reductions over derived samples. Each axis is computed straight
//! from the derived set; only the weekday view builds on the daily totals.

use super::derive::DerivedSample;
use chrono::{NaiveDate, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOP_WINDOWS: usize = 3;

/// Parallel label/value lists, ready for charting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

impl Series {
    fn push(&mut self, label: String, value: f64) {
        self.labels.push(label);
        self.data.push(value);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut series = Series::default();
        for (label, value) in iter {
            series.push(label, value);
        }
        series
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round_energy(value: f64) -> f64 {
    round_to(value, 4)
}

pub fn round_cost(value: f64) -> f64 {
    round_to(value, 2)
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Mean per-sample energy by UTC hour of day. Hours without samples are omitted.
pub fn hourly_average(derived: &[DerivedSample]) -> Series {
    let mut by_hour: BTreeMap<u32, Mean> = BTreeMap::new();
    for sample in derived {
        by_hour
            .entry(sample.timestamp.hour())
            .or_default()
            .add(sample.total_energy_kwh);
    }

    by_hour
        .into_iter()
        .map(|(hour, mean)| (hour.to_string(), round_energy(mean.value())))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub energy: Series,
    pub cost: Series,
    /// Rounded daily energy keyed by date, input to the weekday view.
    #[serde(skip)]
    pub by_date: Vec<(NaiveDate, f64)>,
}

/// Energy and cost summed per UTC calendar date.
pub fn daily_totals(derived: &[DerivedSample]) -> DailyTotals {
    let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for sample in derived {
        let entry = by_date.entry(sample.timestamp.date_naive()).or_default();
        entry.0 += sample.total_energy_kwh;
        entry.1 += sample.cost;
    }

    let mut totals = DailyTotals::default();
    for (date, (energy, cost)) in by_date {
        let label = date.format("%Y-%m-%d").to_string();
        let energy = round_energy(energy);
        totals.energy.push(label.clone(), energy);
        totals.cost.push(label, round_cost(cost));
        totals.by_date.push((date, energy));
    }
    totals
}

/// Average daily consumption per weekday name, averaged over daily totals
/// rather than raw samples. Labels come out in name order.
pub fn weekday_average(daily: &DailyTotals) -> Series {
    let mut by_weekday: BTreeMap<String, Mean> = BTreeMap::new();
    for (date, energy) in &daily.by_date {
        by_weekday
            .entry(date.format("%A").to_string())
            .or_default()
            .add(*energy);
    }

    by_weekday
        .into_iter()
        .map(|(weekday, mean)| (weekday, round_energy(mean.value())))
        .collect()
}

/// The `n` clock hours with the highest summed energy, largest first. Equal
/// sums keep chronological order.
pub fn top_usage_windows(derived: &[DerivedSample], n: usize) -> Series {
    let mut by_slot: BTreeMap<(NaiveDate, u32), f64> = BTreeMap::new();
    for sample in derived {
        let slot = (sample.timestamp.date_naive(), sample.timestamp.hour());
        *by_slot.entry(slot).or_default() += sample.total_energy_kwh;
    }

    let mut slots: Vec<_> = by_slot.into_iter().collect();
    // stable: ties stay in slot order
    slots.sort_by(|a, b| b.1.total_cmp(&a.1));

    slots
        .into_iter()
        .take(n)
        .map(|((date, hour), energy)| {
            (
                format!("{} {:02}:00:00", date.format("%Y-%m-%d"), hour),
                round_energy(energy),
            )
        })
        .collect()
}
