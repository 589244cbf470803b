use crate::error::{ProcessingError, Result};
use crate::models::{Bounds, Timeline};
use crate::utils::constants::VALUE_DECIMALS;
use chrono::NaiveDate;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

fn round_value(value: f64) -> f64 {
    let factor = 10f64.powi(VALUE_DECIMALS);
    (value * factor).round() / factor
}

#[derive(Deserialize)]
struct RawPoint(f64, f64, Vec<f64>);

/// One point's per-frame series, serialized as `[lat, lon, [v, ...]]`.
/// "No data" is written as `0`, so a genuine zero reads back as no data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPoint")]
pub struct PointRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub values: Vec<Option<f64>>,
}

impl From<RawPoint> for PointRecord {
    fn from(raw: RawPoint) -> Self {
        Self {
            latitude: raw.0,
            longitude: raw.1,
            values: raw
                .2
                .into_iter()
                .map(|v| if v == 0.0 { None } else { Some(v) })
                .collect(),
        }
    }
}

impl Serialize for PointRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let values: Vec<FrameValue> = self.values.iter().map(|v| FrameValue(*v)).collect();
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.latitude)?;
        tuple.serialize_element(&self.longitude)?;
        tuple.serialize_element(&values)?;
        tuple.end()
    }
}

struct FrameValue(Option<f64>);

impl Serialize for FrameValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Some(v) if v.is_finite() => serializer.serialize_f64(round_value(v)),
            _ => serializer.serialize_u8(0),
        }
    }
}

/// The JSON dataset consumed by the map player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDataset {
    pub dates: Vec<NaiveDate>,
    pub year_boundary_index: usize,
    pub bounds: Bounds,
    pub pest_ids: Vec<String>,
    pub total_frames: usize,
    pub points: Vec<PointRecord>,
}

impl AnimationDataset {
    pub fn from_timeline(timeline: &Timeline, pest_ids: Vec<String>) -> Result<Self> {
        let bounds = timeline.bounds().ok_or_else(|| {
            ProcessingError::MissingData("timeline has no points to bound".to_string())
        })?;

        let points = timeline
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| PointRecord {
                latitude: p.latitude,
                longitude: p.longitude,
                values: timeline.point_values(i),
            })
            .collect();

        Ok(Self {
            dates: timeline.dates(),
            year_boundary_index: timeline.year_boundary_index,
            bounds,
            pest_ids,
            total_frames: timeline.len(),
            points,
        })
    }

    pub fn summary(&self) -> String {
        let first = self.dates.first().map(|d| d.to_string()).unwrap_or_default();
        let last = self.dates.last().map(|d| d.to_string()).unwrap_or_default();
        let filled: usize = self
            .points
            .iter()
            .map(|p| p.values.iter().filter(|v| v.is_some()).count())
            .sum();
        let cells = self.points.len() * self.total_frames;

        let mut s = String::new();
        s.push_str(&format!("Frames: {} ({} to {})\n", self.total_frames, first, last));
        s.push_str(&format!(
            "Year boundary: frame {}\n",
            self.year_boundary_index
        ));
        s.push_str(&format!("Points: {}\n", self.points.len()));
        s.push_str(&format!(
            "Bounds: lat {:.4}..{:.4}, lon {:.4}..{:.4}\n",
            self.bounds.south, self.bounds.north, self.bounds.west, self.bounds.east
        ));
        s.push_str(&format!("Pests: {}\n", self.pest_ids.join(", ")));
        if cells > 0 {
            s.push_str(&format!(
                "Non-zero values: {}/{} ({:.1}%)",
                filled,
                cells,
                filled as f64 / cells as f64 * 100.0
            ));
        }
        s
    }
}

pub struct DatasetWriter {
    pretty: bool,
}

impl DatasetWriter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Write the dataset and return the file size in bytes.
    pub fn write(&self, dataset: &AnimationDataset, path: &Path) -> Result<u64> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, dataset)?;
        } else {
            serde_json::to_writer(&mut writer, dataset)?;
        }
        writer.flush()?;

        let size = fs::metadata(path)?.len();
        info!(
            "Wrote dataset {} ({:.1} KB, {} frames, {} points)",
            path.display(),
            size as f64 / 1024.0,
            dataset.total_frames,
            dataset.points.len()
        );
        Ok(size)
    }

    pub fn read(&self, path: &Path) -> Result<AnimationDataset> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Default for DatasetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frame, GridPoint};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn timeline() -> Timeline {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        Timeline {
            points: vec![GridPoint::new(35.0, 139.0), GridPoint::new(35.5, 139.25)],
            frames: vec![
                Frame::new(d(1, 7), vec![Some(12.345), None]),
                Frame::new(d(1, 14), vec![Some(20.0), Some(3.96)]),
            ],
            year_boundary_index: 1,
        }
    }

    #[test]
    fn test_json_shape() -> Result<()> {
        let dataset = AnimationDataset::from_timeline(&timeline(), vec!["aphid".to_string()])?;
        let value = serde_json::to_value(&dataset)?;

        assert_eq!(
            value,
            json!({
                "dates": ["2025-01-07", "2025-01-14"],
                "year_boundary_index": 1,
                "bounds": {"south": 35.0, "north": 35.5, "west": 139.0, "east": 139.25},
                "pest_ids": ["aphid"],
                "total_frames": 2,
                "points": [
                    [35.0, 139.0, [12.3, 20.0]],
                    [35.5, 139.25, [0, 4.0]]
                ]
            })
        );
        Ok(())
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("animation_data.json");
        let dataset = AnimationDataset::from_timeline(&timeline(), vec!["aphid".to_string()])?;

        let writer = DatasetWriter::new();
        let size = writer.write(&dataset, &path)?;
        assert!(size > 0);

        let back = writer.read(&path)?;
        assert_eq!(back.points[1].values, vec![None, Some(4.0)]);
        assert_eq!(back.dates, dataset.dates);
        assert!(back.summary().contains("Frames: 2"));
        Ok(())
    }
}
