use crate::error::{ProcessingError, Result};
use crate::models::{CumulativeReading, Observation, ObservationBuilder, PeriodWindow};
use crate::processors::Accumulator;
use crate::readers::TemperatureSource;
use crate::utils::parse_date;
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Days between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const BATCH_SIZE: usize = 8192;

enum DateColumn {
    Days(Date32Array),
    Text(StringArray),
}

impl DateColumn {
    fn from_array(array: &ArrayRef) -> Result<Self> {
        match array.data_type() {
            DataType::Date32 => array
                .as_any()
                .downcast_ref::<Date32Array>()
                .map(|a| DateColumn::Days(a.clone()))
                .ok_or_else(|| ProcessingError::Config("Invalid date column type".to_string())),
            DataType::Utf8 => array
                .as_any()
                .downcast_ref::<StringArray>()
                .map(|a| DateColumn::Text(a.clone()))
                .ok_or_else(|| ProcessingError::Config("Invalid date column type".to_string())),
            other => Err(ProcessingError::Config(format!(
                "Unsupported date column type: {}",
                other
            ))),
        }
    }

    fn value(&self, i: usize) -> Result<Option<NaiveDate>> {
        match self {
            DateColumn::Days(a) if a.is_null(i) => Ok(None),
            DateColumn::Days(a) => {
                NaiveDate::from_num_days_from_ce_opt(a.value(i) + UNIX_EPOCH_DAYS_FROM_CE)
                    .map(Some)
                    .ok_or_else(|| {
                        ProcessingError::InvalidFormat("Invalid date in Parquet file".to_string())
                    })
            }
            DateColumn::Text(a) if a.is_null(i) => Ok(None),
            DateColumn::Text(a) => parse_date(a.value(i)).map(Some),
        }
    }
}

/// Raw daily observations in a Parquet file with `date`, `latitude`,
/// `longitude` and `temperature` columns. Numeric columns of any float or
/// integer type are widened to f64.
pub struct ParquetSource {
    path: PathBuf,
    accumulator: Accumulator,
}

impl ParquetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            accumulator: Accumulator::new(),
        }
    }

    pub fn with_accumulator(mut self, accumulator: Accumulator) -> Self {
        self.accumulator = accumulator;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_observations(&self, window: &PeriodWindow) -> Result<Vec<Observation>> {
        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(BATCH_SIZE)
            .build()?;

        let mut observations = Vec::new();
        let mut skipped = 0usize;

        for batch in reader {
            let batch = batch?;
            skipped += self.collect_batch(&batch, window, &mut observations)?;
        }

        debug!(
            path = %self.path.display(),
            period = %window.label,
            rows = observations.len(),
            skipped,
            "Read Parquet observations"
        );

        Ok(observations)
    }

    fn collect_batch(
        &self,
        batch: &RecordBatch,
        window: &PeriodWindow,
        out: &mut Vec<Observation>,
    ) -> Result<usize> {
        let dates = DateColumn::from_array(required_column(batch, "date")?)?;
        let latitudes = float_column(batch, "latitude")?;
        let longitudes = float_column(batch, "longitude")?;
        let temperatures = float_column(batch, "temperature")?;

        let mut skipped = 0;
        for i in 0..batch.num_rows() {
            if latitudes.is_null(i) || longitudes.is_null(i) || temperatures.is_null(i) {
                skipped += 1;
                continue;
            }

            let date = match dates.value(i) {
                Ok(Some(date)) => date,
                Ok(None) => {
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(row = i, error = %e, "Skipping observation row");
                    skipped += 1;
                    continue;
                }
            };

            if !window.contains(date) {
                continue;
            }

            match ObservationBuilder::new()
                .date(date)
                .latitude(latitudes.value(i))
                .longitude(longitudes.value(i))
                .temperature(temperatures.value(i))
                .build()
            {
                Ok(obs) => out.push(obs),
                Err(e) => {
                    warn!(row = i, error = %e, "Skipping invalid observation");
                    skipped += 1;
                }
            }
        }

        Ok(skipped)
    }
}

fn required_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ProcessingError::MissingData(format!("Parquet column '{}' not found", name)))
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let column = required_column(batch, name)?;
    let widened = cast(column.as_ref(), &DataType::Float64)?;
    widened
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| ProcessingError::Config(format!("Invalid {} column type", name)))
}

impl TemperatureSource for ParquetSource {
    fn cumulative_window(&self, window: &PeriodWindow) -> Result<Vec<CumulativeReading>> {
        let observations = self.read_observations(window)?;
        Ok(self.accumulator.accumulate(window, &observations))
    }

    fn describe(&self) -> String {
        format!("parquet {}", self.path.display())
    }
}
