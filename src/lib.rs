pub mod converter;
pub mod crs;
pub mod error;
pub mod gtfs;
pub mod output;
pub mod pipeline;
pub mod sample_day;
pub mod schedule;

pub use error::ConvertError;
pub use pipeline::{ConversionRequest, RunOptions, RunReport, run};
pub use sample_day::SampleDay;
