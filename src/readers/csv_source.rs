use crate::error::Result;
use crate::models::{CumulativeReading, Observation, ObservationBuilder, PeriodWindow};
use crate::processors::Accumulator;
use crate::readers::TemperatureSource;
use crate::utils::parse_date;
use memmap2::Mmap;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ObservationRow {
    date: String,
    latitude: f64,
    longitude: f64,
    temperature: f64,
}

/// Raw daily observations in a CSV file with a
/// `date,latitude,longitude,temperature` header. The file is reopened for
/// every query and accumulated client-side.
pub struct CsvSource {
    path: PathBuf,
    use_mmap: bool,
    accumulator: Accumulator,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            use_mmap: false,
            accumulator: Accumulator::new(),
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn with_accumulator(mut self, accumulator: Accumulator) -> Self {
        self.accumulator = accumulator;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read observations dated inside `window`. Malformed rows are logged
    /// with their line number and skipped.
    pub fn read_observations(&self, window: &PeriodWindow) -> Result<Vec<Observation>> {
        let file = File::open(&self.path)?;

        if self.use_mmap {
            let mmap = unsafe { Mmap::map(&file)? };
            self.parse(&mmap[..], window)
        } else {
            self.parse(file, window)
        }
    }

    fn parse<R: Read>(&self, input: R, window: &PeriodWindow) -> Result<Vec<Observation>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut observations = Vec::new();
        let mut skipped = 0usize;

        for (i, row) in reader.deserialize::<ObservationRow>().enumerate() {
            // header is line 1
            let line = i + 2;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(line, error = %e, "Skipping malformed observation row");
                    skipped += 1;
                    continue;
                }
            };

            let date = match parse_date(&row.date) {
                Ok(date) => date,
                Err(e) => {
                    warn!(line, error = %e, "Skipping observation row");
                    skipped += 1;
                    continue;
                }
            };

            if !window.contains(date) {
                continue;
            }

            match ObservationBuilder::new()
                .date(date)
                .latitude(row.latitude)
                .longitude(row.longitude)
                .temperature(row.temperature)
                .build()
            {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    warn!(line, error = %e, "Skipping invalid observation");
                    skipped += 1;
                }
            }
        }

        debug!(
            path = %self.path.display(),
            period = %window.label,
            rows = observations.len(),
            skipped,
            "Read CSV observations"
        );

        Ok(observations)
    }
}

impl TemperatureSource for CsvSource {
    fn cumulative_window(&self, window: &PeriodWindow) -> Result<Vec<CumulativeReading>> {
        let observations = self.read_observations(window)?;
        Ok(self.accumulator.accumulate(window, &observations))
    }

    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }
}
