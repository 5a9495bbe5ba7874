pub mod trends;

pub use trends::{RangeQuery, TrendsQuery, TrendsService};
