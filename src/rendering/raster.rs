use crate::rendering::colors::{BandScheme, Ramp};
use crate::rendering::contour::{contour_lines, Contour, Point};
use crate::rendering::{Grid, GridSpec, RenderError, RenderResult};
use crate::utils::constants::{
    CONTOUR_LINE_WIDTH, FILL_ALPHA, LABEL_FONT_SIZE, LABEL_SPACING, MAX_IMAGE_SIDE,
    MIN_IMAGE_SIDE,
};
use tiny_skia::{
    ColorU8, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

/// Image dimensions for a grid extent: `width` pixels across, height from
/// the latitude/longitude aspect ratio.
pub fn image_size(spec: &GridSpec, width: u32) -> (u32, u32) {
    let width = width.clamp(MIN_IMAGE_SIDE, MAX_IMAGE_SIDE);
    let aspect = spec.lat_span() / spec.lon_span();
    let height = (width as f64 * aspect).round();
    let height = if height.is_finite() {
        (height as u32).clamp(MIN_IMAGE_SIDE, MAX_IMAGE_SIDE)
    } else {
        width
    };
    (width, height)
}

fn new_pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })
}

fn with_fill_alpha(color: ColorU8) -> ColorU8 {
    let alpha = (color.alpha() as f32 * FILL_ALPHA).round() as u8;
    ColorU8::from_rgba(color.red(), color.green(), color.blue(), alpha)
}

/// Paint every pixel from the bilinearly sampled grid value.
fn fill_pixels<F>(pixmap: &mut Pixmap, grid: &Grid, color_for: F)
where
    F: Fn(f64) -> ColorU8,
{
    let (width, height) = (pixmap.width() as usize, pixmap.height() as usize);
    let sx = (grid.width - 1) as f64 / width as f64;
    let sy = (grid.height - 1) as f64 / height as f64;

    let pixels = pixmap.pixels_mut();
    for row in 0..height {
        let gy = (row as f64 + 0.5) * sy;
        for col in 0..width {
            let gx = (col as f64 + 0.5) * sx;
            let value = grid.sample(gx, gy);
            pixels[row * width + col] = with_fill_alpha(color_for(value)).premultiply();
        }
    }
}

fn to_pixels(point: Point, scale_x: f32, scale_y: f32) -> (f32, f32) {
    (point.x * scale_x, point.y * scale_y)
}

fn stroke_contours(pixmap: &mut Pixmap, contours: &[Contour], scale_x: f32, scale_y: f32) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: CONTOUR_LINE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for contour in contours.iter().filter(|c| c.points.len() >= 2) {
        let mut pb = PathBuilder::new();
        let (x, y) = to_pixels(contour.points[0], scale_x, scale_y);
        pb.move_to(x, y);
        for &p in &contour.points[1..] {
            let (x, y) = to_pixels(p, scale_x, scale_y);
            pb.line_to(x, y);
        }
        if contour.closed {
            pb.close();
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

struct Label {
    x: f32,
    y: f32,
    text: String,
}

/// Evenly spaced label anchors along a contour, skipping positions near the
/// image edge or an earlier label.
fn place_labels(
    contour: &Contour,
    scale_x: f32,
    scale_y: f32,
    bounds: (f32, f32),
    labels: &mut Vec<Label>,
) {
    let pixels: Vec<(f32, f32)> = contour
        .points
        .iter()
        .map(|&p| to_pixels(p, scale_x, scale_y))
        .collect();
    let total: f32 = pixels
        .windows(2)
        .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
        .sum();
    if total < LABEL_SPACING * 0.5 {
        return;
    }

    let count = ((total / LABEL_SPACING).floor() as usize).max(1);
    let spacing = total / (count as f32 + 1.0);
    let margin = LABEL_FONT_SIZE * 2.0;
    let min_distance = LABEL_FONT_SIZE * 4.0;
    let text = format!("{:.0}", contour.level);

    let mut travelled = 0.0;
    let mut next_at = spacing;
    let mut placed = 0;

    for w in pixels.windows(2) {
        let (dx, dy) = (w[1].0 - w[0].0, w[1].1 - w[0].1);
        let length = (dx * dx + dy * dy).sqrt();

        while placed < count && length > 0.0 && travelled + length >= next_at {
            let t = (next_at - travelled) / length;
            let (x, y) = (w[0].0 + t * dx, w[0].1 + t * dy);

            let inside = x > margin && x < bounds.0 - margin && y > margin && y < bounds.1 - margin;
            let crowded = labels
                .iter()
                .any(|l| (l.x - x).powi(2) + (l.y - y).powi(2) < min_distance * min_distance);
            if inside && !crowded {
                labels.push(Label {
                    x,
                    y,
                    text: text.clone(),
                });
            }

            next_at += spacing;
            placed += 1;
        }
        travelled += length;
    }
}

// Seven-segment glyphs: a top, b upper right, c lower right, d bottom,
// e lower left, f upper left, g middle.
const SEG_A: u8 = 1;
const SEG_B: u8 = 1 << 1;
const SEG_C: u8 = 1 << 2;
const SEG_D: u8 = 1 << 3;
const SEG_E: u8 = 1 << 4;
const SEG_F: u8 = 1 << 5;
const SEG_G: u8 = 1 << 6;

fn glyph(ch: char) -> u8 {
    match ch {
        '0' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
        '1' => SEG_B | SEG_C,
        '2' => SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
        '3' => SEG_A | SEG_B | SEG_G | SEG_C | SEG_D,
        '4' => SEG_F | SEG_G | SEG_B | SEG_C,
        '5' => SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
        '6' => SEG_A | SEG_F | SEG_G | SEG_E | SEG_D | SEG_C,
        '7' => SEG_A | SEG_B | SEG_C,
        '8' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
        '9' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
        '-' => SEG_G,
        _ => 0,
    }
}

fn draw_labels(pixmap: &mut Pixmap, labels: &[Label]) {
    let char_w = LABEL_FONT_SIZE * 0.6;
    let char_h = LABEL_FONT_SIZE;
    let gap = LABEL_FONT_SIZE * 0.2;
    let pad = LABEL_FONT_SIZE * 0.2;

    let mut background = Paint::default();
    background.set_color_rgba8(255, 255, 255, 220);

    let mut ink = Paint::default();
    ink.set_color_rgba8(0, 0, 0, 255);
    ink.anti_alias = true;

    let stroke = Stroke {
        width: (char_w * 0.18).max(1.0),
        line_cap: LineCap::Round,
        ..Stroke::default()
    };

    for label in labels {
        let n = label.text.chars().count() as f32;
        let text_w = n * char_w + (n - 1.0).max(0.0) * gap;
        let left = label.x - text_w / 2.0;
        let top = label.y - char_h / 2.0;

        if let Some(rect) = Rect::from_xywh(left - pad, top - pad, text_w + 2.0 * pad, char_h + 2.0 * pad) {
            pixmap.fill_rect(rect, &background, Transform::identity(), None);
        }

        for (i, ch) in label.text.chars().enumerate() {
            let x0 = left + i as f32 * (char_w + gap);
            let (x1, ym, y1) = (x0 + char_w, top + char_h / 2.0, top + char_h);
            let mask = glyph(ch);

            let strokes = [
                (SEG_A, (x0, top), (x1, top)),
                (SEG_B, (x1, top), (x1, ym)),
                (SEG_C, (x1, ym), (x1, y1)),
                (SEG_D, (x0, y1), (x1, y1)),
                (SEG_E, (x0, ym), (x0, y1)),
                (SEG_F, (x0, top), (x0, ym)),
                (SEG_G, (x0, ym), (x1, ym)),
            ];

            let mut pb = PathBuilder::new();
            for (bit, from, to) in strokes {
                if mask & bit != 0 {
                    pb.move_to(from.0, from.1);
                    pb.line_to(to.0, to.1);
                }
            }
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &ink, &stroke, Transform::identity(), None);
            }
        }
    }
}

/// Threshold-banded fill with black isolines at every level, labeled with
/// the level value. Fails with `OutOfRange` when the grid never reaches the
/// threshold range.
pub fn render_banded(
    grid: &Grid,
    scheme: &BandScheme,
    width: u32,
    height: u32,
) -> RenderResult<Pixmap> {
    let (min, max) = grid.range().ok_or(RenderError::EmptyGrid)?;
    if !scheme.covers(min, max) {
        return Err(RenderError::OutOfRange {
            min,
            max,
            first: scheme.first_level(),
            last: scheme.last_level(),
        });
    }

    let mut pixmap = new_pixmap(width, height)?;
    fill_pixels(&mut pixmap, grid, |v| scheme.color_for(v));

    let scale_x = width as f32 / (grid.width - 1) as f32;
    let scale_y = height as f32 / (grid.height - 1) as f32;
    let bounds = (width as f32, height as f32);

    let mut labels = Vec::new();
    for &level in scheme.levels() {
        let contours = contour_lines(grid, level);
        stroke_contours(&mut pixmap, &contours, scale_x, scale_y);
        for contour in &contours {
            place_labels(contour, scale_x, scale_y, bounds, &mut labels);
        }
    }
    draw_labels(&mut pixmap, &labels);

    Ok(pixmap)
}

/// Stepped red-yellow-green ramp over the grid's own range.
pub fn render_ramp(grid: &Grid, width: u32, height: u32) -> RenderResult<Pixmap> {
    let (min, max) = grid.range().ok_or(RenderError::EmptyGrid)?;
    let ramp = Ramp::new(min, max);

    let mut pixmap = new_pixmap(width, height)?;
    fill_pixels(&mut pixmap, grid, |v| ramp.color_for(v));
    Ok(pixmap)
}

pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}
