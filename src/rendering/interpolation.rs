use crate::rendering::{RenderError, RenderResult};
use crate::utils::constants::{IDW_NEIGHBORS, IDW_POWER};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// One valid point value, positioned as `[latitude, longitude]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            latitude,
            longitude,
            value,
        }
    }

    fn position(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

impl RTreeObject for Sample {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position())
    }
}

impl PointDistance for Sample {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.latitude - point[0];
        let dlon = self.longitude - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Regular grid spanning the bounding box of the samples. Row 0 is the
/// northern edge, column 0 the western edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
    pub size: usize,
}

impl GridSpec {
    pub fn covering(samples: &[Sample], size: usize) -> RenderResult<Self> {
        let mut south = f64::INFINITY;
        let mut north = f64::NEG_INFINITY;
        let mut west = f64::INFINITY;
        let mut east = f64::NEG_INFINITY;
        for s in samples {
            south = south.min(s.latitude);
            north = north.max(s.latitude);
            west = west.min(s.longitude);
            east = east.max(s.longitude);
        }

        let lat_span = north - south;
        let lon_span = east - west;
        if !(lat_span > 0.0 && lon_span > 0.0) {
            return Err(RenderError::DegenerateExtent {
                lat_span: lat_span.max(0.0),
                lon_span: lon_span.max(0.0),
            });
        }

        Ok(Self {
            south,
            north,
            west,
            east,
            size: size.max(2),
        })
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn latitude(&self, row: usize) -> f64 {
        self.north - self.lat_span() * row as f64 / (self.size - 1) as f64
    }

    pub fn longitude(&self, col: usize) -> f64 {
        self.west + self.lon_span() * col as f64 / (self.size - 1) as f64
    }
}

/// Row-major field of interpolated values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl Grid {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), width * height);
        Self {
            width,
            height,
            values,
        }
    }

    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.width + col]
    }

    /// Bilinear sample at fractional grid coordinates, clamped to the edges.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x = x.clamp(0.0, (self.width - 1) as f64);
        let y = y.clamp(0.0, (self.height - 1) as f64);
        let x0 = (x.floor() as usize).min(self.width.saturating_sub(2));
        let y0 = (y.floor() as usize).min(self.height.saturating_sub(2));
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x1, y0) * fx;
        let bottom = self.get(x0, y1) * (1.0 - fx) + self.get(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Convex hull in counter-clockwise order (monotone chain). Collinear
/// points are dropped; fewer than three distinct points yield them as-is.
pub fn convex_hull(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<[f64; 2]> = Vec::with_capacity(sorted.len() * 2);
    for &p in &sorted {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    hull.pop();
    hull
}

fn inside_hull(hull: &[[f64; 2]], p: [f64; 2]) -> bool {
    if hull.len() < 3 {
        return false;
    }
    let eps = 1e-12;
    (0..hull.len()).all(|i| cross(hull[i], hull[(i + 1) % hull.len()], p) >= -eps)
}

/// Fill every cell of `spec`. Cells inside the samples' convex hull get an
/// inverse-distance weighted mean of the nearest samples; cells outside get
/// the nearest sample's value. No cell is left undefined.
pub fn interpolate(samples: &[Sample], spec: &GridSpec) -> RenderResult<Grid> {
    if samples.is_empty() {
        return Err(RenderError::EmptyGrid);
    }

    let positions: Vec<[f64; 2]> = samples.iter().map(Sample::position).collect();
    let hull = convex_hull(&positions);
    let tree = RTree::bulk_load(samples.to_vec());

    let size = spec.size;
    let mut values = Vec::with_capacity(size * size);

    for row in 0..size {
        let lat = spec.latitude(row);
        for col in 0..size {
            let query = [lat, spec.longitude(col)];
            let value = if inside_hull(&hull, query) {
                idw(&tree, &query)
            } else {
                tree.nearest_neighbor(&query).map(|s| s.value)
            };
            values.push(value.ok_or(RenderError::EmptyGrid)?);
        }
    }

    Ok(Grid::new(size, size, values))
}

fn idw(tree: &RTree<Sample>, query: &[f64; 2]) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;

    for sample in tree.nearest_neighbor_iter(query).take(IDW_NEIGHBORS) {
        let d2 = sample.distance_2(query);
        if d2 < 1e-18 {
            return Some(sample.value);
        }
        let w = 1.0 / d2.powf(IDW_POWER / 2.0);
        weighted += w * sample.value;
        total += w;
    }

    if total > 0.0 {
        Some(weighted / total)
    } else {
        None
    }
}
