use crate::models::{CumulativeReading, Observation, PeriodWindow};
use tracing::{debug, warn};

/// Running sum of daily effective temperature per point, restarting at zero
/// at the start of the window.
pub struct Accumulator {
    base_temperature: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            base_temperature: 0.0,
        }
    }

    /// Development threshold subtracted before clamping at zero.
    pub fn with_base_temperature(base_temperature: f64) -> Self {
        Self { base_temperature }
    }

    pub fn effective(&self, temperature: f64) -> f64 {
        (temperature - self.base_temperature).max(0.0)
    }

    /// Accumulate the observations falling inside `window`.
    ///
    /// Output is ordered by point, then date. Repeated observations of the
    /// same point and date count once (the last one supplied). Points with no
    /// observations in the window produce no readings.
    pub fn accumulate(
        &self,
        window: &PeriodWindow,
        observations: &[Observation],
    ) -> Vec<CumulativeReading> {
        let mut in_window: Vec<&Observation> = observations
            .iter()
            .filter(|o| window.contains(o.date))
            .filter(|o| {
                if o.temperature.is_finite() {
                    true
                } else {
                    warn!(
                        latitude = o.point.latitude,
                        longitude = o.point.longitude,
                        date = %o.date,
                        "Skipping non-finite temperature"
                    );
                    false
                }
            })
            .collect();

        in_window.sort_by(|a, b| a.point.cmp(&b.point).then_with(|| a.date.cmp(&b.date)));

        // keep the last of each (point, date) run
        let mut unique: Vec<&Observation> = Vec::with_capacity(in_window.len());
        for obs in in_window {
            match unique.last_mut() {
                Some(last) if last.point == obs.point && last.date == obs.date => *last = obs,
                _ => unique.push(obs),
            }
        }

        let mut readings = Vec::with_capacity(unique.len());
        let mut current_point = None;
        let mut cumulative = 0.0;

        for obs in unique {
            if current_point != Some(obs.point) {
                current_point = Some(obs.point);
                cumulative = 0.0;
            }
            cumulative += self.effective(obs.temperature);
            readings.push(CumulativeReading {
                date: obs.date,
                point: obs.point,
                value: cumulative,
            });
        }

        debug!(
            period = %window.label,
            observations = observations.len(),
            readings = readings.len(),
            "Accumulated period"
        );

        readings
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{group_readings, GridPoint};
    use chrono::{Duration, NaiveDate};

    fn window() -> PeriodWindow {
        PeriodWindow::new(
            "prior",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 28).unwrap(),
        )
        .unwrap()
    }

    fn obs(day: i64, lat: f64, temp: f64) -> Observation {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(day - 1);
        Observation::new(date, lat, 139.0, temp).unwrap()
    }

    #[test]
    fn test_prefix_sum_of_clamped_temperatures() {
        let temps = [5.0, -3.0, 2.5, 0.0, -10.0, 7.0];
        let observations: Vec<Observation> = temps
            .iter()
            .enumerate()
            .map(|(i, t)| obs(i as i64 + 1, 35.0, *t))
            .collect();

        let readings = Accumulator::new().accumulate(&window(), &observations);
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();

        let mut expected = Vec::new();
        let mut sum = 0.0;
        for t in temps {
            sum += f64::max(0.0, t);
            expected.push(sum);
        }
        assert_eq!(values, expected);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_restarts_per_point_and_ignores_outside_window() {
        let observations = vec![
            obs(1, 36.0, 4.0),
            obs(0, 35.0, 100.0), // Dec 31, outside the window
            obs(2, 35.0, 3.0),
            obs(1, 35.0, 1.0),
            obs(2, 36.0, 4.0),
        ];
        let series = group_readings(Accumulator::new().accumulate(&window(), &observations));

        assert_eq!(series.len(), 2);
        assert_eq!(series[&GridPoint::new(35.0, 139.0)].last_value(), 4.0);
        assert_eq!(series[&GridPoint::new(36.0, 139.0)].last_value(), 8.0);
    }

    #[test]
    fn test_point_without_observations_is_absent() {
        let observations = vec![obs(40, 35.0, 10.0)];
        let readings = Accumulator::new().accumulate(&window(), &observations);
        assert!(readings.is_empty());
    }

    #[test]
    fn test_base_temperature() {
        let observations = vec![obs(1, 35.0, 12.0), obs(2, 35.0, 8.0), obs(3, 35.0, 15.0)];
        let readings = Accumulator::with_base_temperature(10.0).accumulate(&window(), &observations);
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.0, 2.0, 7.0]);
    }

    #[test]
    fn test_duplicate_dates_count_once() {
        let observations = vec![obs(1, 35.0, 2.0), obs(1, 35.0, 6.0), obs(2, 35.0, 1.0)];
        let readings = Accumulator::new().accumulate(&window(), &observations);
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![6.0, 7.0]);
    }
}
