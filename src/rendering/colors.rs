use crate::models::Threshold;
use crate::rendering::{RenderError, RenderResult};
use crate::utils::constants::RAMP_STEPS;
use tiny_skia::ColorU8;

/// Red-yellow-green anchors, reversed so low values are green and high
/// values red.
const RDYLGN_R: [(u8, u8, u8); 11] = [
    (0x00, 0x68, 0x37),
    (0x1a, 0x98, 0x50),
    (0x66, 0xbd, 0x63),
    (0xa6, 0xd9, 0x6a),
    (0xd9, 0xef, 0x8b),
    (0xff, 0xff, 0xbf),
    (0xfe, 0xe0, 0x8b),
    (0xfd, 0xae, 0x61),
    (0xf4, 0x6d, 0x43),
    (0xd7, 0x30, 0x27),
    (0xa5, 0x00, 0x26),
];

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("darkred", (139, 0, 0)),
    ("orangered", (255, 69, 0)),
    ("orange", (255, 165, 0)),
    ("gold", (255, 215, 0)),
    ("yellow", (255, 255, 0)),
    ("yellowgreen", (154, 205, 50)),
    ("lime", (0, 255, 0)),
    ("green", (0, 128, 0)),
    ("lightgreen", (144, 238, 144)),
    ("darkgreen", (0, 100, 0)),
    ("cyan", (0, 255, 255)),
    ("blue", (0, 0, 255)),
    ("navy", (0, 0, 128)),
    ("purple", (128, 0, 128)),
    ("magenta", (255, 0, 255)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("lightgray", (211, 211, 211)),
    ("lightgrey", (211, 211, 211)),
];

/// Parse `#RGB`, `#RRGGBB`, `#RRGGBBAA` or a basic color name.
pub fn parse_color(value: &str) -> RenderResult<ColorU8> {
    let trimmed = value.trim();
    let invalid = || RenderError::InvalidColor(value.to_string());

    if let Some(hex) = trimmed.strip_prefix('#') {
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        return match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    channels[i] = v * 17;
                }
                Ok(ColorU8::from_rgba(channels[0], channels[1], channels[2], 255))
            }
            6 => Ok(ColorU8::from_rgba(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                255,
            )),
            8 => Ok(ColorU8::from_rgba(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => Err(invalid()),
        };
    }

    let lower = trimmed.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, (r, g, b))| ColorU8::from_rgba(*r, *g, *b, 255))
        .ok_or_else(invalid)
}

/// Threshold levels and the fill color of each band between them.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScheme {
    levels: Vec<f64>,
    colors: Vec<ColorU8>,
}

impl BandScheme {
    /// Build from sorted, distinct thresholds (at least two). Band `i` spans
    /// `[levels[i], levels[i + 1])` and takes the color of threshold `i`, so
    /// the last threshold's color goes unused.
    pub fn from_thresholds(thresholds: &[Threshold]) -> RenderResult<Self> {
        if thresholds.len() < 2 {
            return Err(RenderError::InvalidColor(
                "at least two thresholds are required".to_string(),
            ));
        }

        let levels: Vec<f64> = thresholds.iter().map(|t| t.value).collect();
        let colors = thresholds[..thresholds.len() - 1]
            .iter()
            .map(|t| parse_color(&t.color))
            .collect::<RenderResult<Vec<_>>>()?;

        Ok(Self { levels, colors })
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn first_level(&self) -> f64 {
        self.levels[0]
    }

    pub fn last_level(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// Values below the first level use the first band, values at or above
    /// the last level use the last band.
    pub fn color_for(&self, value: f64) -> ColorU8 {
        let above = self.levels.partition_point(|&level| level <= value);
        let band = above.saturating_sub(1).min(self.colors.len() - 1);
        self.colors[band]
    }

    /// Whether `[min, max]` reaches any part of `[first level, last level]`.
    pub fn covers(&self, min: f64, max: f64) -> bool {
        max >= self.first_level() && min <= self.last_level()
    }
}

/// Evenly stepped color ramp over a value range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    min: f64,
    max: f64,
    steps: usize,
}

impl Ramp {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            steps: RAMP_STEPS,
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps.max(1);
        self
    }

    pub fn color_for(&self, value: f64) -> ColorU8 {
        let span = self.max - self.min;
        let step = if span > 0.0 {
            let t = ((value - self.min) / span).clamp(0.0, 1.0);
            ((t * self.steps as f64) as usize).min(self.steps - 1)
        } else {
            0
        };
        colormap((step as f64 + 0.5) / self.steps as f64)
    }
}

/// Linear interpolation through the reversed red-yellow-green anchors.
fn colormap(t: f64) -> ColorU8 {
    let scaled = t.clamp(0.0, 1.0) * (RDYLGN_R.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(RDYLGN_R.len() - 2);
    let frac = scaled - lower as f64;
    let (r0, g0, b0) = RDYLGN_R[lower];
    let (r1, g1, b1) = RDYLGN_R[lower + 1];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    ColorU8::from_rgba(mix(r0, r1), mix(g0, g1), mix(b0, b1), 255)
}
