use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::GridPoint;

/// Values of every active point at one sample date. `None` is "no data",
/// which is kept distinct from an accumulated value of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl Frame {
    pub fn new(date: NaiveDate, values: Vec<Option<f64>>) -> Self {
        Self { date, values }
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Frames of one resampled period, indexed against that period's own point
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodFrames {
    pub label: String,
    pub points: Vec<GridPoint>,
    pub frames: Vec<Frame>,
}

impl PeriodFrames {
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            points: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Geographic extent of the canonical point set, in the shape the map
/// overlay expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a GridPoint>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds {
                    south: p.latitude,
                    north: p.latitude,
                    west: p.longitude,
                    east: p.longitude,
                },
                Some(b) => Bounds {
                    south: b.south.min(p.latitude),
                    north: b.north.max(p.latitude),
                    west: b.west.min(p.longitude),
                    east: b.east.max(p.longitude),
                },
            })
        })
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }
}

/// Prior and current periods stitched onto one canonical point index space.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub points: Vec<GridPoint>,
    pub frames: Vec<Frame>,
    /// Index of the first current-period frame; equals the prior frame count.
    pub year_boundary_index: usize,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.frames.iter().map(|f| f.date).collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Series of one canonical point across all frames.
    pub fn point_values(&self, index: usize) -> Vec<Option<f64>> {
        self.frames.iter().map(|f| f.values[index]).collect()
    }
}
