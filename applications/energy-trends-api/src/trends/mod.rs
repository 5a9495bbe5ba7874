//! Energy and cost derivation from multi-phase current samples.
//!
//! Pure and synchronous: a function of the samples, the tariff and the
//! requested range. Fetching the samples is the caller's job.

pub mod aggregate;
pub mod derive;
pub mod report;
pub mod sample;
pub mod tariff;

pub use aggregate::Series;
pub use derive::{DerivedSample, GAP_THRESHOLD_SECS};
pub use report::{compute_trends, TrendsOutcome, TrendsReport};
pub use sample::{Sample, TimeRange};
pub use tariff::{PeakWindow, TariffConfig, TariffParams};
