use crate::trends::{TrendsOutcome, TrendsReport};
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const NO_DATA_MESSAGE: &str = "No data found.";

/// Report keys that carry money; on the wire they end in `_<currency>`.
pub const COST_KEYS: [&str; 4] = ["total_cost", "on_peak_cost", "off_peak_cost", "daily_cost"];

#[derive(Debug)]
pub enum TrendsResponse {
    NoData {
        message: String,
    },
    Report {
        report: Box<TrendsReport>,
        currency: String,
    },
}

impl TrendsResponse {
    pub fn new(outcome: TrendsOutcome, currency: &str) -> Self {
        match outcome {
            TrendsOutcome::NoData => TrendsResponse::NoData {
                message: NO_DATA_MESSAGE.to_string(),
            },
            TrendsOutcome::Report(report) => TrendsResponse::Report {
                report,
                currency: currency.to_string(),
            },
        }
    }
}

impl Serialize for TrendsResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TrendsResponse::NoData { message } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("message", message)?;
                map.end()
            }
            TrendsResponse::Report { report, currency } => {
                let Value::Object(mut fields) =
                    serde_json::to_value(&**report).map_err(S::Error::custom)?
                else {
                    return Err(S::Error::custom("report did not serialize to an object"));
                };
                for key in COST_KEYS {
                    if let Some(value) = fields.remove(key) {
                        fields.insert(format!("{}_{}", key, currency), value);
                    }
                }
                fields.insert("currency".to_string(), Value::String(currency.clone()));

                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in &fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
