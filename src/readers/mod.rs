pub mod csv_source;
pub mod memory_source;
pub mod parquet_source;
pub mod profile_reader;

pub use csv_source::CsvSource;
pub use memory_source::MemorySource;
pub use parquet_source::ParquetSource;
pub use profile_reader::ProfileReader;

use crate::error::Result;
use crate::models::{CumulativeReading, PeriodWindow};

/// A time-series store able to answer the cumulative-sum window query: one
/// reading per (date, point) in `window`, holding the running sum of
/// effective temperature from the window start.
///
/// Each call acquires and releases whatever handle the store needs; nothing
/// is held between queries.
pub trait TemperatureSource {
    fn cumulative_window(&self, window: &PeriodWindow) -> Result<Vec<CumulativeReading>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}
