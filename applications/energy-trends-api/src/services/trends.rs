use crate::config::TariffSettings;
use crate::error::{AppError, Result};
use crate::repositories::SampleStore;
use crate::trends::{compute_trends, TariffConfig, TariffParams, TimeRange, TrendsOutcome};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Query string of the trends endpoint. Every field stays a string so that
/// bad numbers surface as validation errors rather than extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub base_rate: Option<String>,
    pub peak_rate: Option<String>,
    pub voltage: Option<String>,
    pub power_factor: Option<String>,
    pub peak_start: Option<String>,
    pub peak_end: Option<String>,
}

impl TrendsQuery {
    pub fn range(&self) -> RangeQuery {
        RangeQuery {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }

    pub fn tariff_params(&self) -> TariffParams {
        TariffParams {
            base_rate: self.base_rate.clone(),
            peak_rate: self.peak_rate.clone(),
            voltage: self.voltage.clone(),
            power_factor: self.power_factor.clone(),
            peak_start: self.peak_start.clone(),
            peak_end: self.peak_end.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeQuery {
    pub fn parse(&self) -> Result<TimeRange> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) => TimeRange::parse(start, end),
            _ => Err(AppError::Validation(
                "Missing required parameters: start_date and end_date".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct TrendsService {
    store: Arc<dyn SampleStore>,
    tariff_defaults: TariffSettings,
}

impl TrendsService {
    pub fn new(store: Arc<dyn SampleStore>, tariff_defaults: TariffSettings) -> Self {
        Self {
            store,
            tariff_defaults,
        }
    }

    pub fn currency(&self) -> &str {
        &self.tariff_defaults.currency
    }

    pub async fn trends(&self, query: &TrendsQuery) -> Result<TrendsOutcome> {
        // Validate everything before touching the store
        let range = query.range().parse()?;
        let tariff = TariffConfig::from_params(&query.tariff_params(), &self.tariff_defaults)?;

        let samples = self.store.fetch_samples(range).await?;
        let outcome = compute_trends(&samples, &tariff, range);

        match &outcome {
            TrendsOutcome::NoData => info!(start = %range.start, end = %range.end, "no readings in range"),
            TrendsOutcome::Report(report) => info!(
                start = %range.start,
                end = %range.end,
                sample_count = report.sample_count,
                total_energy_kwh = report.total_energy_kwh,
                "trends computed"
            ),
        }
        Ok(outcome)
    }

    pub async fn raw_readings(&self, query: &RangeQuery) -> Result<String> {
        let range = query.parse()?;
        let lines = self.store.fetch_raw_rows(range).await?;
        info!(start = %range.start, end = %range.end, rows = lines.len(), "raw readings exported");
        Ok(lines.join("\n"))
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.ping().await
    }
}
