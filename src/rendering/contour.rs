//! Isolines by marching squares. Segment endpoints are keyed by the grid edge
//! they cross, so neighboring cells share endpoints exactly and chaining is a
//! lookup rather than a distance search.

use crate::rendering::Grid;
use std::collections::HashMap;

/// A position in grid coordinates (column, row).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Grid edge crossed by an isoline: horizontal edges start at (col, row) and
/// run east, vertical edges start at (col, row) and run south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeId {
    Horizontal(usize, usize),
    Vertical(usize, usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    start_edge: EdgeId,
    end_edge: EdgeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub level: f64,
    pub points: Vec<Point>,
    pub closed: bool,
}

fn crossing(a: f64, b: f64, level: f64) -> f32 {
    if (b - a).abs() < 1e-12 {
        return 0.5;
    }
    ((level - a) / (b - a)).clamp(0.0, 1.0) as f32
}

/// Segments of the `level` isoline, one or two per grid cell.
pub fn march_squares(grid: &Grid, level: f64) -> Vec<Segment> {
    let (w, h) = (grid.width, grid.height);
    if w < 2 || h < 2 {
        return Vec::new();
    }

    let mut segments = Vec::new();

    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let tl = grid.get(x, y);
            let tr = grid.get(x + 1, y);
            let bl = grid.get(x, y + 1);
            let br = grid.get(x + 1, y + 1);

            if !(tl.is_finite() && tr.is_finite() && bl.is_finite() && br.is_finite()) {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }

            if case == 0 || case == 15 {
                continue;
            }

            let (xf, yf) = (x as f32, y as f32);
            let top = (
                Point::new(xf + crossing(tl, tr, level), yf),
                EdgeId::Horizontal(x, y),
            );
            let bottom = (
                Point::new(xf + crossing(bl, br, level), yf + 1.0),
                EdgeId::Horizontal(x, y + 1),
            );
            let left = (
                Point::new(xf, yf + crossing(tl, bl, level)),
                EdgeId::Vertical(x, y),
            );
            let right = (
                Point::new(xf + 1.0, yf + crossing(tr, br, level)),
                EdgeId::Vertical(x + 1, y),
            );

            let mut push = |a: (Point, EdgeId), b: (Point, EdgeId)| {
                segments.push(Segment {
                    start: a.0,
                    end: b.0,
                    start_edge: a.1,
                    end_edge: b.1,
                });
            };

            match case {
                1 | 14 => push(left, top),
                2 | 13 => push(top, right),
                3 | 12 => push(left, right),
                4 | 11 => push(right, bottom),
                6 | 9 => push(top, bottom),
                7 | 8 => push(left, bottom),
                5 | 10 => {
                    // saddle: resolve by the cell-center average
                    let center = (tl + tr + bl + br) / 4.0;
                    let center_high = center >= level;
                    if (case == 5) == center_high {
                        push(left, bottom);
                        push(top, right);
                    } else {
                        push(left, top);
                        push(right, bottom);
                    }
                }
                _ => {}
            }
        }
    }

    segments
}

/// Join segments that share a crossed edge into polylines.
pub fn connect_segments(segments: &[Segment], level: f64) -> Vec<Contour> {
    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_edge.entry(seg.start_edge).or_default().push(i);
        by_edge.entry(seg.end_edge).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    let next_unused = |edge: EdgeId, used: &[bool]| -> Option<usize> {
        by_edge
            .get(&edge)
            .and_then(|ids| ids.iter().copied().find(|&i| !used[i]))
    };

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let seg = &segments[first];
        let mut forward = vec![seg.end];
        let mut edge = seg.end_edge;
        while let Some(i) = next_unused(edge, &used) {
            used[i] = true;
            let s = &segments[i];
            let (point, far) = if s.start_edge == edge {
                (s.end, s.end_edge)
            } else {
                (s.start, s.start_edge)
            };
            forward.push(point);
            edge = far;
        }

        let closed = edge == seg.start_edge;

        let mut backward = Vec::new();
        if !closed {
            let mut edge = seg.start_edge;
            while let Some(i) = next_unused(edge, &used) {
                used[i] = true;
                let s = &segments[i];
                let (point, far) = if s.start_edge == edge {
                    (s.end, s.end_edge)
                } else {
                    (s.start, s.start_edge)
                };
                backward.push(point);
                edge = far;
            }
        }

        let mut points: Vec<Point> = backward.into_iter().rev().collect();
        points.push(seg.start);
        if closed {
            // last forward point repeats the start
            forward.pop();
        }
        points.extend(forward);

        contours.push(Contour {
            level,
            points,
            closed,
        });
    }

    contours
}

/// All polylines of the `level` isoline.
pub fn contour_lines(grid: &Grid, level: f64) -> Vec<Contour> {
    connect_segments(&march_squares(grid, level), level)
}
