pub mod readings;

pub use readings::{PgReadingRepository, SampleStore};
