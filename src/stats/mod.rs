pub mod export;
pub mod histogram;

pub use export::{Bucket, HistogramData, Percentile};
pub use histogram::{Counter, Histogram, HistogramError};
