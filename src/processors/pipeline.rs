use crate::config::{OutputConfig, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::models::{
    group_readings, PeriodFrames, PeriodWindow, Periods, PestRiskProfile, Timeline, CURRENT_LABEL,
};
use crate::processors::{ConsistencyFilter, Reconciler, WeeklyResampler};
use crate::readers::TemperatureSource;
use crate::rendering::{FrameRenderer, ProfileReport, RenderOptions};
use crate::utils::ProgressReporter;
use crate::writers::{AnimationDataset, DatasetWriter};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub prior_frames: usize,
    pub current_frames: usize,
    pub points: usize,
    pub dataset_path: PathBuf,
    pub dataset_bytes: u64,
    pub reports: Vec<ProfileReport>,
}

impl RunSummary {
    pub fn total_frames(&self) -> usize {
        self.prior_frames + self.current_frames
    }

    pub fn summary(&self) -> String {
        let mut s = format!(
            "Frames: {} ({} prior, {} current), points: {}\nDataset: {} ({} bytes)",
            self.total_frames(),
            self.prior_frames,
            self.current_frames,
            self.points,
            self.dataset_path.display(),
            self.dataset_bytes
        );
        for r in &self.reports {
            s.push_str(&format!(
                "\n  {}: {} rendered, {} ramp, {} reused, {} skipped",
                r.profile_id, r.rendered, r.ramp_fallbacks, r.reused, r.skipped
            ));
        }
        s
    }
}

/// Query, resample, reconcile, render and serialize one time-lapse.
pub struct Pipeline {
    periods: Periods,
    resampler: WeeklyResampler,
    filter: ConsistencyFilter,
    reconciler: Reconciler,
    renderer: FrameRenderer,
    render_workers: usize,
    frames_dir: PathBuf,
    dataset_path: PathBuf,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(periods: Periods, options: RenderOptions, output: &OutputConfig) -> Self {
        Self {
            periods,
            resampler: WeeklyResampler::new(),
            filter: ConsistencyFilter::new(),
            reconciler: Reconciler::new(),
            renderer: FrameRenderer::new(options),
            render_workers: 1,
            frames_dir: output.frames_dir(),
            dataset_path: output.dataset_path(),
            show_progress: false,
        }
    }

    pub fn from_config(config: &PipelineConfig, today: NaiveDate) -> Result<Self> {
        let periods = config.periods.resolve(today)?;
        Ok(Self::new(periods, config.render.options(), &config.output)
            .with_render_workers(config.render.render_workers))
    }

    pub fn with_render_workers(mut self, workers: usize) -> Self {
        self.render_workers = workers.max(1);
        self
    }

    pub fn with_consistency_filter(mut self, filter: ConsistencyFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn periods(&self) -> &Periods {
        &self.periods
    }

    fn process_period(
        &self,
        source: &dyn TemperatureSource,
        window: &PeriodWindow,
    ) -> Result<PeriodFrames> {
        info!(
            "Querying {} period {}..{} from {}",
            window.label,
            window.start,
            window.end,
            source.describe()
        );

        let series = group_readings(source.cumulative_window(window)?);
        if series.is_empty() {
            warn!(period = %window.label, "No temperature data for period");
            return Ok(PeriodFrames::empty(&window.label));
        }

        let series = self.filter.filter(window, series);
        if series.is_empty() {
            warn!(period = %window.label, "Every point started too late in the period");
            return Ok(PeriodFrames::empty(&window.label));
        }

        let frames = self.resampler.resample(window, &series);
        info!(
            period = %window.label,
            points = frames.points.len(),
            frames = frames.frames.len(),
            "Resampled period"
        );
        Ok(frames)
    }

    /// Resample both periods and stitch them into one timeline. Fails with
    /// `NoData` when neither period has any data.
    pub fn build_timeline(&self, source: &dyn TemperatureSource) -> Result<Timeline> {
        let prior = self.process_period(source, &self.periods.prior)?;
        let current = match &self.periods.current {
            Some(window) => self.process_period(source, window)?,
            None => {
                info!("Current period is empty, using the prior period only");
                PeriodFrames::empty(CURRENT_LABEL)
            }
        };

        if prior.is_empty() && current.is_empty() {
            error!("No data in either period, nothing to render");
            return Err(ProcessingError::NoData);
        }

        self.reconciler.reconcile(prior, current)
    }

    pub fn run(
        &self,
        source: &dyn TemperatureSource,
        profiles: &[PestRiskProfile],
    ) -> Result<RunSummary> {
        if profiles.is_empty() {
            return Err(ProcessingError::NoProfiles(
                "no pest risk profiles supplied".to_string(),
            ));
        }

        let timeline = self.build_timeline(source)?;

        fs::create_dir_all(&self.frames_dir)?;
        let total = (timeline.len() * profiles.len()) as u64;
        let progress = ProgressReporter::new(total, "Rendering frames...", !self.show_progress);
        let reports = self.renderer.render_all(
            &timeline,
            profiles,
            &self.frames_dir,
            self.render_workers,
            &progress,
        )?;
        progress.finish_with_message("Rendering complete");

        let pest_ids = profiles.iter().map(|p| p.id.clone()).collect();
        let dataset = AnimationDataset::from_timeline(&timeline, pest_ids)?;
        let dataset_bytes = DatasetWriter::new().write(&dataset, &self.dataset_path)?;

        Ok(RunSummary {
            prior_frames: timeline.year_boundary_index,
            current_frames: timeline.len() - timeline.year_boundary_index,
            points: timeline.points.len(),
            dataset_path: self.dataset_path.clone(),
            dataset_bytes,
            reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, Threshold};
    use crate::readers::MemorySource;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn periods() -> Periods {
        Periods {
            prior: PeriodWindow::new("prior", d(2025, 1, 1), d(2025, 1, 21)).unwrap(),
            current: Some(PeriodWindow::new("current", d(2026, 1, 1), d(2026, 1, 10)).unwrap()),
        }
    }

    fn output(dir: &TempDir) -> OutputConfig {
        OutputConfig {
            dir: dir.path().to_path_buf(),
            ..OutputConfig::default()
        }
    }

    fn profile() -> PestRiskProfile {
        PestRiskProfile::new(
            "aphid",
            "Aphid",
            vec![Threshold::new(10.0, "low", "green"), Threshold::new(50.0, "high", "red")],
        )
    }

    #[test]
    fn test_no_profiles_checked_first() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(periods(), RenderOptions::default(), &output(&dir));
        let source = MemorySource::new(vec![]);
        assert!(matches!(
            pipeline.run(&source, &[]),
            Err(ProcessingError::NoProfiles(_))
        ));
    }

    #[test]
    fn test_no_data_aborts_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let out = output(&dir);
        let pipeline = Pipeline::new(periods(), RenderOptions::default(), &out);
        let source = MemorySource::new(vec![
            Observation::new(d(2024, 6, 1), 35.0, 139.0, 20.0).unwrap(),
        ]);

        assert!(matches!(
            pipeline.run(&source, &[profile()]),
            Err(ProcessingError::NoData)
        ));
        assert!(!out.dataset_path().exists());
    }

    #[test]
    fn test_current_only_timeline() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(periods(), RenderOptions::default(), &output(&dir));
        let source = MemorySource::new(vec![
            Observation::new(d(2026, 1, 1), 35.0, 139.0, 3.0).unwrap(),
        ]);

        let timeline = pipeline.build_timeline(&source).unwrap();
        assert_eq!(timeline.year_boundary_index, 0);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.frames[1].values, vec![Some(3.0)]);
    }
}
