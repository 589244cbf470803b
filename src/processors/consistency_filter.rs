use crate::models::{GridPoint, PeriodWindow, PointSeries};
use crate::utils::constants::MAX_ONSET_DAYS;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::info;

/// Excludes points whose series starts too late in the period, so the
/// number of active points does not jump part-way through the animation.
pub struct ConsistencyFilter {
    max_onset_days: i64,
}

impl ConsistencyFilter {
    pub fn new() -> Self {
        Self {
            max_onset_days: MAX_ONSET_DAYS,
        }
    }

    pub fn with_max_onset_days(max_onset_days: i64) -> Self {
        Self { max_onset_days }
    }

    pub fn cutoff(&self, window: &PeriodWindow) -> NaiveDate {
        window.start + Duration::days(self.max_onset_days)
    }

    /// Keep only series whose first entry is on or before the cutoff.
    pub fn filter(
        &self,
        window: &PeriodWindow,
        series: BTreeMap<GridPoint, PointSeries>,
    ) -> BTreeMap<GridPoint, PointSeries> {
        let cutoff = self.cutoff(window);
        let before = series.len();

        let kept: BTreeMap<GridPoint, PointSeries> = series
            .into_iter()
            .filter(|(_, s)| s.first_date() <= cutoff)
            .collect();

        let excluded = before - kept.len();
        if excluded > 0 {
            info!(
                period = %window.label,
                excluded,
                cutoff = %cutoff,
                "Excluded late-onset points"
            );
        }

        kept
    }
}

impl Default for ConsistencyFilter {
    fn default() -> Self {
        Self::new()
    }
}
