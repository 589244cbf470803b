use crate::error::{ProcessingError, Result};
use crate::models::{PeriodWindow, Periods, CURRENT_LABEL, PRIOR_LABEL};
use crate::processors::Accumulator;
use crate::readers::{CsvSource, ParquetSource, TemperatureSource};
use crate::rendering::RenderOptions;
use crate::utils::constants::{
    DATASET_FILE, DEFAULT_GRID_SIZE, DEFAULT_IMAGE_WIDTH, DEFAULT_OUTPUT_DIR,
    DEFAULT_SMOOTHING_SIGMA, ENV_PREFIX, FRAMES_DIR, MIN_VALID_POINTS,
};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Parquet,
}

impl SourceKind {
    /// Guess from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => SourceKind::Parquet,
            _ => SourceKind::Csv,
        }
    }
}

/// Observation file and how it is accumulated. `base_temperature` is
/// subtracted from every daily temperature by the source's accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub use_mmap: bool,
    pub base_temperature: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Csv,
            path: PathBuf::from("observations.csv"),
            use_mmap: false,
            base_temperature: 0.0,
        }
    }
}

impl SourceConfig {
    pub fn accumulator(&self) -> Accumulator {
        Accumulator::with_base_temperature(self.base_temperature)
    }

    pub fn open(&self) -> Box<dyn TemperatureSource> {
        let path = self.path.clone();
        match self.kind {
            SourceKind::Csv => Box::new(
                CsvSource::new(path)
                    .with_mmap(self.use_mmap)
                    .with_accumulator(self.accumulator()),
            ),
            SourceKind::Parquet => {
                Box::new(ParquetSource::new(path).with_accumulator(self.accumulator()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub path: PathBuf,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pest_profiles.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[validate(length(min = 1))]
    pub frames_subdir: String,
    #[validate(length(min = 1))]
    pub dataset_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            frames_subdir: FRAMES_DIR.to_string(),
            dataset_file: DATASET_FILE.to_string(),
        }
    }
}

impl OutputConfig {
    pub fn frames_dir(&self) -> PathBuf {
        self.dir.join(&self.frames_subdir)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.dir.join(&self.dataset_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RenderConfig {
    #[validate(range(min = 2, max = 2000))]
    pub grid_size: usize,
    #[validate(range(min = 0.0, max = 50.0))]
    pub sigma: f64,
    #[validate(range(min = 1))]
    pub min_valid_points: usize,
    #[validate(range(min = 16, max = 4096))]
    pub image_width: u32,
    #[validate(range(min = 1, max = 256))]
    pub render_workers: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            sigma: DEFAULT_SMOOTHING_SIGMA,
            min_valid_points: MIN_VALID_POINTS,
            image_width: DEFAULT_IMAGE_WIDTH,
            render_workers: 1,
        }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            grid_size: self.grid_size,
            sigma: self.sigma,
            min_valid_points: self.min_valid_points,
            image_width: self.image_width,
        }
    }
}

/// Run date and optional explicit period bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodsConfig {
    pub as_of: Option<NaiveDate>,
    pub prior_start: Option<NaiveDate>,
    pub prior_end: Option<NaiveDate>,
    pub current_start: Option<NaiveDate>,
    pub current_end: Option<NaiveDate>,
}

impl PeriodsConfig {
    /// Periods derived from `as_of` (or `today`), with any explicit bound
    /// taking precedence over the derived one.
    pub fn resolve(&self, today: NaiveDate) -> Result<Periods> {
        let derived = Periods::from_as_of(self.as_of.unwrap_or(today))?;

        let prior = PeriodWindow::new(
            PRIOR_LABEL,
            self.prior_start.unwrap_or(derived.prior.start),
            self.prior_end.unwrap_or(derived.prior.end),
        )?;

        let current = match (self.current_start, self.current_end, derived.current) {
            (None, None, derived) => derived,
            (start, end, derived) => {
                let start = start.or(derived.as_ref().map(|w| w.start));
                let end = end.or(derived.as_ref().map(|w| w.end));
                match (start, end) {
                    (Some(start), Some(end)) => Some(PeriodWindow::new(CURRENT_LABEL, start, end)?),
                    _ => {
                        return Err(ProcessingError::Config(
                            "current_start and current_end must both be set when the run date \
                             leaves no current period"
                                .to_string(),
                        ))
                    }
                }
            }
        };

        Ok(Periods { prior, current })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub profiles: ProfilesConfig,
    #[validate(nested)]
    pub output: OutputConfig,
    #[validate(nested)]
    pub render: RenderConfig,
    pub periods: PeriodsConfig,
}

impl PipelineConfig {
    /// Layer an optional config file (TOML, JSON or YAML by extension) and
    /// `GDD__SECTION__KEY` environment variables over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.render.grid_size, 200);
        assert_eq!(config.render.render_workers, 1);
        assert_eq!(
            config.output.dataset_path(),
            PathBuf::from("output/animation_data.json")
        );
        assert_eq!(
            config.output.frames_dir(),
            PathBuf::from("output/animation_frames")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            r#"
[source]
kind = "parquet"
path = "obs.parquet"

[render]
grid_size = 64
render_workers = 4

[periods]
as_of = "2026-01-11"
"#
        )?;
        file.flush()?;

        let config = PipelineConfig::load(Some(file.path()))?;
        assert_eq!(config.source.kind, SourceKind::Parquet);
        assert_eq!(config.render.grid_size, 64);
        assert_eq!(config.render.render_workers, 4);
        assert_eq!(config.render.sigma, 4.0);
        assert_eq!(config.periods.as_of, Some(d(2026, 1, 11)));
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() -> Result<()> {
        let mut file = Builder::new().suffix(".json").tempfile()?;
        write!(file, r#"{{"render": {{"grid_size": 1}}}}"#)?;
        file.flush()?;
        assert!(PipelineConfig::load(Some(file.path())).is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_periods() -> Result<()> {
        let periods = PeriodsConfig::default().resolve(d(2026, 3, 15))?;
        assert_eq!(periods.prior.start, d(2025, 1, 1));
        assert_eq!(periods.prior.end, d(2025, 12, 31));
        assert_eq!(periods.current.unwrap().end, d(2026, 3, 14));

        let overridden = PeriodsConfig {
            as_of: Some(d(2026, 1, 1)),
            prior_end: Some(d(2025, 1, 21)),
            current_start: Some(d(2026, 1, 1)),
            current_end: Some(d(2026, 1, 10)),
            ..PeriodsConfig::default()
        }
        .resolve(d(2000, 1, 1))?;
        assert_eq!(overridden.prior.end, d(2025, 1, 21));
        assert_eq!(overridden.current.unwrap().days(), 10);

        let bad = PeriodsConfig {
            prior_start: Some(d(2025, 6, 1)),
            prior_end: Some(d(2025, 1, 1)),
            ..PeriodsConfig::default()
        };
        assert!(bad.resolve(d(2026, 3, 15)).is_err());
        Ok(())
    }

    #[test]
    fn test_half_current_override_without_derived_period() {
        let half = PeriodsConfig {
            as_of: Some(d(2026, 1, 1)),
            current_start: Some(d(2026, 1, 1)),
            ..PeriodsConfig::default()
        };
        assert!(matches!(
            half.resolve(d(2026, 1, 1)),
            Err(ProcessingError::Config(_))
        ));

        // a derived current period fills the missing bound
        let filled = PeriodsConfig {
            current_start: Some(d(2026, 2, 1)),
            ..PeriodsConfig::default()
        }
        .resolve(d(2026, 3, 15))
        .unwrap();
        assert_eq!(filled.current.unwrap().end, d(2026, 3, 14));
    }

    #[test]
    fn test_sigma_upper_bound() -> Result<()> {
        let mut file = Builder::new().suffix(".json").tempfile()?;
        write!(file, r#"{{"render": {{"sigma": 1e9}}}}"#)?;
        file.flush()?;
        assert!(PipelineConfig::load(Some(file.path())).is_err());
        Ok(())
    }

    #[test]
    fn test_source_applies_base_temperature() -> Result<()> {
        let mut csv = Builder::new().suffix(".csv").tempfile()?;
        writeln!(csv, "date,latitude,longitude,temperature")?;
        writeln!(csv, "2025-01-01,35.0,139.0,12.0")?;
        writeln!(csv, "2025-01-02,35.0,139.0,8.0")?;
        writeln!(csv, "2025-01-03,35.0,139.0,15.5")?;
        csv.flush()?;

        let source = SourceConfig {
            path: csv.path().to_path_buf(),
            base_temperature: 10.0,
            ..SourceConfig::default()
        };
        let window = PeriodWindow::new(PRIOR_LABEL, d(2025, 1, 1), d(2025, 1, 31))?;
        let values: Vec<f64> = source
            .open()
            .cumulative_window(&window)?
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![2.0, 2.0, 7.5]);
        Ok(())
    }

    #[test]
    fn test_source_kind_from_path() {
        assert_eq!(SourceKind::from_path(Path::new("a.PARQUET")), SourceKind::Parquet);
        assert_eq!(SourceKind::from_path(Path::new("a.csv")), SourceKind::Csv);
    }
}
