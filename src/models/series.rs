use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::models::GridPoint;

/// One row of the cumulative-sum window: the running total at `point` up to
/// and including `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativeReading {
    pub date: NaiveDate,
    pub point: GridPoint,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub date: NaiveDate,
    pub value: f64,
}

/// Accumulated series for one point. Dates strictly increase and values
/// never decrease.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSeries {
    point: GridPoint,
    entries: Vec<SeriesEntry>,
}

impl PointSeries {
    /// Build a series from entries already in date order. Returns `None` if
    /// the entries are empty, out of order, or decreasing.
    pub fn from_entries(point: GridPoint, entries: Vec<SeriesEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let ordered = entries
            .windows(2)
            .all(|w| w[0].date < w[1].date && w[0].value <= w[1].value);

        if ordered && entries.iter().all(|e| e.value.is_finite()) {
            Some(Self { point, entries })
        } else {
            None
        }
    }

    pub fn point(&self) -> GridPoint {
        self.point
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.entries[0].date
    }

    pub fn last_value(&self) -> f64 {
        self.entries[self.entries.len() - 1].value
    }

    /// Latest value observed on or before `date` (carry-forward lookup).
    pub fn value_at_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.entries.partition_point(|e| e.date <= date);
        if idx == 0 {
            None
        } else {
            Some(self.entries[idx - 1].value)
        }
    }
}

/// Group cumulative readings into one series per point, keyed in canonical
/// point order.
///
/// Readings with the same point and date collapse to the last one supplied.
/// A point whose readings decrease over time is logged and dropped.
pub fn group_readings(readings: Vec<CumulativeReading>) -> BTreeMap<GridPoint, PointSeries> {
    let mut grouped: BTreeMap<GridPoint, Vec<SeriesEntry>> = BTreeMap::new();
    for reading in readings {
        grouped.entry(reading.point).or_default().push(SeriesEntry {
            date: reading.date,
            value: reading.value,
        });
    }

    let mut series = BTreeMap::new();
    for (point, mut entries) in grouped {
        entries.sort_by_key(|e| e.date);

        let mut deduped: Vec<SeriesEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match deduped.last_mut() {
                Some(last) if last.date == entry.date => *last = entry,
                _ => deduped.push(entry),
            }
        }

        match PointSeries::from_entries(point, deduped) {
            Some(s) => {
                series.insert(point, s);
            }
            None => warn!(
                latitude = point.latitude,
                longitude = point.longitude,
                "Dropping point with a non-monotonic accumulated series"
            ),
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn reading(d: u32, lat: f64, value: f64) -> CumulativeReading {
        CumulativeReading {
            date: date(d),
            point: GridPoint::new(lat, 139.0),
            value,
        }
    }

    #[test]
    fn test_predecessor_lookup() {
        let series = PointSeries::from_entries(
            GridPoint::new(35.0, 139.0),
            vec![
                SeriesEntry { date: date(1), value: 4.0 },
                SeriesEntry { date: date(20), value: 90.0 },
            ],
        )
        .unwrap();

        assert_eq!(series.value_at_or_before(date(13)), Some(4.0));
        assert_eq!(series.value_at_or_before(date(1)), Some(4.0));
        assert_eq!(series.value_at_or_before(date(20)), Some(90.0));
        assert_eq!(series.value_at_or_before(date(28)), Some(90.0));

        let late = PointSeries::from_entries(
            GridPoint::new(35.0, 139.0),
            vec![SeriesEntry { date: date(5), value: 1.0 }],
        )
        .unwrap();
        assert_eq!(late.value_at_or_before(date(4)), None);
    }

    #[test]
    fn test_from_entries_rejects_unordered() {
        let point = GridPoint::new(35.0, 139.0);
        assert!(PointSeries::from_entries(point, vec![]).is_none());
        assert!(PointSeries::from_entries(
            point,
            vec![
                SeriesEntry { date: date(2), value: 5.0 },
                SeriesEntry { date: date(1), value: 6.0 },
            ]
        )
        .is_none());
        assert!(PointSeries::from_entries(
            point,
            vec![
                SeriesEntry { date: date(1), value: 5.0 },
                SeriesEntry { date: date(2), value: 4.0 },
            ]
        )
        .is_none());
    }

    #[test]
    fn test_group_readings() {
        let grouped = group_readings(vec![
            reading(2, 36.0, 3.0),
            reading(1, 35.0, 1.0),
            reading(1, 36.0, 1.5),
            reading(2, 35.0, 2.0),
            reading(2, 35.0, 2.5),
            // decreasing series is dropped
            reading(1, 37.0, 5.0),
            reading(2, 37.0, 4.0),
        ]);

        assert_eq!(grouped.len(), 2);
        let keys: Vec<f64> = grouped.keys().map(|p| p.latitude).collect();
        assert_eq!(keys, vec![35.0, 36.0]);

        let first = &grouped[&GridPoint::new(35.0, 139.0)];
        assert_eq!(first.len(), 2);
        assert_eq!(first.last_value(), 2.5);
        assert_eq!(grouped[&GridPoint::new(36.0, 139.0)].first_date(), date(1));
    }
}
