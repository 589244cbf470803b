use crate::error::{ProcessingError, Result};
use crate::models::{Frame, GridPoint, PestRiskProfile, Timeline};
use crate::rendering::raster::{encode_png, image_size, render_banded, render_ramp};
use crate::rendering::{
    gaussian_filter, interpolate, BandScheme, GridSpec, RenderError, RenderResult, Sample,
};
use crate::utils::constants::{
    DEFAULT_GRID_SIZE, DEFAULT_IMAGE_WIDTH, DEFAULT_SMOOTHING_SIGMA, MIN_VALID_POINTS,
};
use crate::utils::{frame_path, profile_frames_dir, ProgressReporter};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub grid_size: usize,
    pub sigma: f64,
    pub min_valid_points: usize,
    pub image_width: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            sigma: DEFAULT_SMOOTHING_SIGMA,
            min_valid_points: MIN_VALID_POINTS,
            image_width: DEFAULT_IMAGE_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    RampFallback,
    Reused,
    Skipped,
}

/// Per-profile tally of frame outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileReport {
    pub profile_id: String,
    pub rendered: usize,
    pub ramp_fallbacks: usize,
    pub reused: usize,
    pub skipped: usize,
}

impl ProfileReport {
    fn new(profile_id: &str) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Rendered => self.rendered += 1,
            FrameOutcome::RampFallback => self.ramp_fallbacks += 1,
            FrameOutcome::Reused => self.reused += 1,
            FrameOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn written(&self) -> usize {
        self.rendered + self.ramp_fallbacks + self.reused
    }
}

pub struct FrameRenderer {
    options: RenderOptions,
}

impl FrameRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one frame to PNG bytes. `scheme` of `None` renders the generic
    /// ramp. Too few valid points or an interpolation failure is an error;
    /// a banded failure falls back to the ramp.
    pub fn render_frame(
        &self,
        points: &[GridPoint],
        frame: &Frame,
        scheme: Option<&BandScheme>,
    ) -> RenderResult<(Vec<u8>, FrameOutcome)> {
        let samples: Vec<Sample> = points
            .iter()
            .zip(&frame.values)
            .filter_map(|(p, v)| v.map(|value| Sample::new(p.latitude, p.longitude, value)))
            .collect();

        if samples.len() < self.options.min_valid_points {
            return Err(RenderError::TooFewPoints {
                valid: samples.len(),
                required: self.options.min_valid_points,
            });
        }

        let spec = GridSpec::covering(&samples, self.options.grid_size)?;
        let grid = gaussian_filter(&interpolate(&samples, &spec)?, self.options.sigma);
        let (width, height) = image_size(&spec, self.options.image_width);

        let banded = match scheme {
            Some(scheme) => render_banded(&grid, scheme, width, height),
            None => Err(RenderError::InvalidColor("no usable band colors".to_string())),
        };

        let (pixmap, outcome) = match banded {
            Ok(pixmap) => (pixmap, FrameOutcome::Rendered),
            Err(e) => {
                debug!(date = %frame.date, reason = %e, "Using generic ramp");
                (render_ramp(&grid, width, height)?, FrameOutcome::RampFallback)
            }
        };

        Ok((encode_png(&pixmap)?, outcome))
    }

    /// Render every frame of one profile. Frames that cannot be rendered
    /// reuse the image written for the previous frame in this run, or are
    /// left absent when there is none.
    pub fn render_profile(
        &self,
        timeline: &Timeline,
        profile: &PestRiskProfile,
        frames_root: &Path,
        progress: &ProgressReporter,
    ) -> Result<ProfileReport> {
        fs::create_dir_all(profile_frames_dir(frames_root, &profile.id))?;

        let scheme = match BandScheme::from_thresholds(&profile.bands()) {
            Ok(scheme) => Some(scheme),
            Err(e) => {
                warn!(profile = %profile.id, error = %e, "Profile colors unusable, rendering ramp only");
                None
            }
        };

        let mut report = ProfileReport::new(&profile.id);
        let mut previous: Option<PathBuf> = None;

        for (index, frame) in timeline.frames.iter().enumerate() {
            let path = frame_path(frames_root, &profile.id, index);
            let outcome = match self.render_frame(&timeline.points, frame, scheme.as_ref()) {
                Ok((bytes, outcome)) => match fs::write(&path, bytes) {
                    Ok(()) => outcome,
                    Err(e) => {
                        warn!(profile = %profile.id, frame = index, error = %e, "Failed to write frame");
                        self.reuse_or_skip(previous.as_deref(), &path)
                    }
                },
                Err(e) => {
                    warn!(profile = %profile.id, frame = index, reason = %e, "Frame not rendered");
                    self.reuse_or_skip(previous.as_deref(), &path)
                }
            };

            previous = match outcome {
                FrameOutcome::Skipped => None,
                _ => Some(path),
            };
            report.record(outcome);
            progress.increment(1);
        }

        info!(
            profile = %profile.id,
            rendered = report.rendered,
            ramp = report.ramp_fallbacks,
            reused = report.reused,
            skipped = report.skipped,
            "Profile frames done"
        );

        Ok(report)
    }

    fn reuse_or_skip(&self, previous: Option<&Path>, target: &Path) -> FrameOutcome {
        if let Some(prev) = previous {
            match fs::copy(prev, target) {
                Ok(_) => return FrameOutcome::Reused,
                Err(e) => warn!(from = %prev.display(), error = %e, "Failed to reuse previous frame"),
            }
        }

        // a file left by an earlier run must not pass for this frame
        if target.exists() {
            if let Err(e) = fs::remove_file(target) {
                warn!(path = %target.display(), error = %e, "Failed to remove stale frame");
            }
        }
        FrameOutcome::Skipped
    }

    /// Render all profiles, sequentially or on a pool of `workers` threads.
    /// Frames within a profile are always rendered in order.
    pub fn render_all(
        &self,
        timeline: &Timeline,
        profiles: &[PestRiskProfile],
        frames_root: &Path,
        workers: usize,
        progress: &ProgressReporter,
    ) -> Result<Vec<ProfileReport>> {
        if workers <= 1 || profiles.len() <= 1 {
            return profiles
                .iter()
                .map(|profile| self.render_profile(timeline, profile, frames_root, progress))
                .collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ProcessingError::WorkerPool(e.to_string()))?;

        pool.install(|| {
            profiles
                .par_iter()
                .map(|profile| self.render_profile(timeline, profile, frames_root, progress))
                .collect()
        })
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}
