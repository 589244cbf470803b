use crate::models::{Frame, GridPoint, PeriodFrames, PeriodWindow, PointSeries};
use crate::utils::constants::{FIRST_SAMPLE_OFFSET_DAYS, SAMPLE_INTERVAL_DAYS};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::info;

/// Weekly sample dates: start+6, start+13, ... up to `end`, with `end`
/// appended when it is not already the last sample.
pub fn sample_dates(window: &PeriodWindow) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut sample = window.offset(FIRST_SAMPLE_OFFSET_DAYS);
    while sample <= window.end {
        dates.push(sample);
        sample += Duration::days(SAMPLE_INTERVAL_DAYS);
    }

    if dates.last() != Some(&window.end) {
        dates.push(window.end);
    }

    dates
}

/// Samples accumulated series at weekly offsets, carrying the latest known
/// value forward when a point has no entry on the sample date.
pub struct WeeklyResampler;

impl WeeklyResampler {
    pub fn new() -> Self {
        Self
    }

    pub fn resample(
        &self,
        window: &PeriodWindow,
        series: &BTreeMap<GridPoint, PointSeries>,
    ) -> PeriodFrames {
        let points: Vec<GridPoint> = series.keys().copied().collect();
        let dates = sample_dates(window);

        let frames: Vec<Frame> = dates
            .iter()
            .map(|&date| {
                let values = series
                    .values()
                    .map(|s| s.value_at_or_before(date))
                    .collect();
                Frame::new(date, values)
            })
            .collect();

        let total = points.len();
        for frame in &frames {
            let valid = frame.valid_count();
            if valid < total {
                info!(
                    period = %window.label,
                    date = %frame.date,
                    valid,
                    total,
                    "Frame has points without data"
                );
            }
        }

        info!(period = %window.label, frames = frames.len(), points = total, "Resampled period");

        PeriodFrames {
            label: window.label.clone(),
            points,
            frames,
        }
    }
}

impl Default for WeeklyResampler {
    fn default() -> Self {
        Self::new()
    }
}
