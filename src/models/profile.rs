use serde::{Deserialize, Serialize};
use validator::Validate;

/// One contour boundary of a risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Threshold {
    pub value: f64,

    #[serde(default)]
    pub label: String,

    #[validate(length(min = 1))]
    pub color: String,
}

impl Threshold {
    pub fn new(value: f64, label: &str, color: &str) -> Self {
        Self {
            value,
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// A pest and the accumulated-temperature thresholds that define its risk
/// bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PestRiskProfile {
    #[validate(length(min = 1))]
    pub id: String,

    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    #[validate(nested)]
    pub thresholds: Vec<Threshold>,
}

impl PestRiskProfile {
    pub fn new(id: &str, name: &str, thresholds: Vec<Threshold>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            thresholds,
        }
    }

    /// Thresholds sorted by value with duplicates removed (first one wins).
    /// Falls back to the default two-band scheme when fewer than two
    /// distinct values remain.
    pub fn bands(&self) -> Vec<Threshold> {
        let mut sorted: Vec<Threshold> = self
            .thresholds
            .iter()
            .filter(|t| t.value.is_finite())
            .cloned()
            .collect();
        sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
        sorted.dedup_by(|later, earlier| later.value == earlier.value);

        if sorted.len() < 2 {
            default_bands()
        } else {
            sorted
        }
    }
}

pub fn default_bands() -> Vec<Threshold> {
    vec![
        Threshold::new(0.0, "low", "#CCCCCC"),
        Threshold::new(5000.0, "high", "#FF0000"),
    ]
}

/// Shape of the profile configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileSet {
    #[serde(default)]
    #[validate(nested)]
    pub pests: Vec<PestRiskProfile>,
}
