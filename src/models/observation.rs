use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// A grid location. Identity is the exact (latitude, longitude) pair.
///
/// Ordering is latitude first, then longitude, which is the canonical point
/// order used everywhere a point index is assigned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct GridPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl GridPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        // Adding 0.0 folds -0.0 into 0.0 so both hash the same.
        Self {
            latitude: latitude + 0.0,
            longitude: longitude + 0.0,
        }
    }

    pub fn checked(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(ProcessingError::InvalidCoordinate(format!(
                "non-finite coordinate ({}, {})",
                latitude, longitude
            )));
        }

        let point = Self::new(latitude, longitude);
        point.validate().map_err(|e| {
            ProcessingError::InvalidCoordinate(format!("({}, {}): {}", latitude, longitude, e))
        })?;
        Ok(point)
    }
}

impl PartialEq for GridPoint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GridPoint {}

impl PartialOrd for GridPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

impl Hash for GridPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

/// One daily temperature reading at one grid point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub point: GridPoint,
    pub temperature: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, latitude: f64, longitude: f64, temperature: f64) -> Result<Self> {
        ObservationBuilder::new()
            .date(date)
            .latitude(latitude)
            .longitude(longitude)
            .temperature(temperature)
            .build()
    }
}

pub struct ObservationBuilder {
    date: Option<NaiveDate>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    temperature: Option<f64>,
}

impl Default for ObservationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self {
            date: None,
            latitude: None,
            longitude: None,
            temperature: None,
        }
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn latitude(mut self, latitude: f64) -> Self {
        self.latitude = Some(latitude);
        self
    }

    pub fn longitude(mut self, longitude: f64) -> Self {
        self.longitude = Some(longitude);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn build(self) -> Result<Observation> {
        let date = self
            .date
            .ok_or_else(|| ProcessingError::MissingData("date".to_string()))?;
        let latitude = self
            .latitude
            .ok_or_else(|| ProcessingError::MissingData("latitude".to_string()))?;
        let longitude = self
            .longitude
            .ok_or_else(|| ProcessingError::MissingData("longitude".to_string()))?;
        let temperature = self
            .temperature
            .ok_or_else(|| ProcessingError::MissingData("temperature".to_string()))?;

        if !temperature.is_finite() {
            return Err(ProcessingError::InvalidFormat(format!(
                "non-finite temperature {} on {}",
                temperature, date
            )));
        }

        Ok(Observation {
            date,
            point: GridPoint::checked(latitude, longitude)?,
            temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_point_identity_is_structural() {
        let a = GridPoint::new(35.5, 139.7);
        let b = GridPoint::new(35.5, 139.7);
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
        assert_eq!(GridPoint::new(-0.0, 0.0), GridPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_point_ordering_latitude_first() {
        let mut points = vec![
            GridPoint::new(36.0, 139.0),
            GridPoint::new(35.0, 140.0),
            GridPoint::new(35.0, 139.5),
        ];
        points.sort();
        assert_eq!(points[0], GridPoint::new(35.0, 139.5));
        assert_eq!(points[1], GridPoint::new(35.0, 140.0));
        assert_eq!(points[2], GridPoint::new(36.0, 139.0));
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert!(Observation::new(date(1), 91.0, 0.0, 5.0).is_err());
        assert!(Observation::new(date(1), 35.0, f64::NAN, 5.0).is_err());
        assert!(Observation::new(date(1), 35.0, 139.0, f64::INFINITY).is_err());
        assert!(ObservationBuilder::new().latitude(1.0).build().is_err());

        let obs = Observation::new(date(2), 35.0, 139.0, -3.5).unwrap();
        assert_eq!(obs.point, GridPoint::new(35.0, 139.0));
        assert_eq!(obs.temperature, -3.5);
    }
}
