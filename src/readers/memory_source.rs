use crate::error::Result;
use crate::models::{CumulativeReading, Observation, PeriodWindow};
use crate::processors::Accumulator;
use crate::readers::TemperatureSource;

/// Observations held in memory, accumulated on each query.
pub struct MemorySource {
    observations: Vec<Observation>,
    accumulator: Accumulator,
}

impl MemorySource {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            accumulator: Accumulator::new(),
        }
    }

    pub fn with_accumulator(mut self, accumulator: Accumulator) -> Self {
        self.accumulator = accumulator;
        self
    }
}

impl TemperatureSource for MemorySource {
    fn cumulative_window(&self, window: &PeriodWindow) -> Result<Vec<CumulativeReading>> {
        Ok(self.accumulator.accumulate(window, &self.observations))
    }

    fn describe(&self) -> String {
        format!("memory ({} observations)", self.observations.len())
    }
}
