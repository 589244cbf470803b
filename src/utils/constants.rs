/// Weekly sampling
pub const FIRST_SAMPLE_OFFSET_DAYS: i64 = 6;
pub const SAMPLE_INTERVAL_DAYS: i64 = 7;

/// Points whose first reading is later than start + this many days are
/// left out of the period
pub const MAX_ONSET_DAYS: i64 = 14;

/// Rendering defaults
pub const DEFAULT_GRID_SIZE: usize = 200;
pub const DEFAULT_SMOOTHING_SIGMA: f64 = 4.0;
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;
pub const MIN_VALID_POINTS: usize = 10;
pub const DEFAULT_IMAGE_WIDTH: u32 = 576;
pub const MIN_IMAGE_SIDE: u32 = 16;
pub const MAX_IMAGE_SIDE: u32 = 4096;
pub const IDW_NEIGHBORS: usize = 8;
pub const IDW_POWER: f64 = 2.0;
pub const FILL_ALPHA: f32 = 0.7;
pub const CONTOUR_LINE_WIDTH: f32 = 1.0;
pub const LABEL_FONT_SIZE: f32 = 8.0;
pub const LABEL_SPACING: f32 = 150.0;
pub const RAMP_STEPS: usize = 50;

/// Output layout
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DATASET_FILE: &str = "animation_data.json";
pub const FRAMES_DIR: &str = "animation_frames";

/// Serialized values are rounded to this many decimals
pub const VALUE_DECIMALS: i32 = 1;

/// Environment override prefix for configuration
pub const ENV_PREFIX: &str = "GDD";
