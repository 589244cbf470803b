//! Contour frame rendering: interpolation of scattered point values onto a
//! regular grid, Gaussian smoothing, banded fills with labeled isolines and
//! PNG output.

pub mod colors;
pub mod contour;
pub mod interpolation;
pub mod raster;
pub mod renderer;
pub mod smoothing;

pub use colors::{parse_color, BandScheme, Ramp};
pub use contour::{contour_lines, march_squares, Contour, Point, Segment};
pub use interpolation::{convex_hull, interpolate, Grid, GridSpec, Sample};
pub use raster::{encode_png, image_size, render_banded, render_ramp};
pub use renderer::{FrameOutcome, FrameRenderer, ProfileReport, RenderOptions};
pub use smoothing::{gaussian_filter, gaussian_kernel};

use thiserror::Error;

/// Failures local to rendering one frame. None of these abort a run; the
/// renderer maps them to the ramp fallback, frame reuse or a skip.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Only {valid} valid points, at least {required} needed")]
    TooFewPoints { valid: usize, required: usize },

    #[error("Sample points span no area ({lat_span} x {lon_span} degrees)")]
    DegenerateExtent { lat_span: f64, lon_span: f64 },

    #[error("Unrecognized color '{0}'")]
    InvalidColor(String),

    #[error("Grid range [{min}, {max}] does not reach levels [{first}, {last}]")]
    OutOfRange {
        min: f64,
        max: f64,
        first: f64,
        last: f64,
    },

    #[error("Grid contains no finite values")]
    EmptyGrid,

    #[error("Cannot allocate a {width}x{height} image")]
    Pixmap { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
