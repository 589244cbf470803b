use crate::rendering::Grid;
use crate::utils::constants::GAUSSIAN_TRUNCATE;

/// Normalized 1-D Gaussian kernel with radius `truncate * sigma` rounded to
/// the nearest cell.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as usize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-(x * x) / denom).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Map an out-of-range index back into `0..len` by mirroring about the
/// edge, `-1 -> 0`, `-2 -> 1`, `len -> len - 1`.
fn reflect(i: isize, len: usize) -> usize {
    let len = len as isize;
    let m = i.rem_euclid(2 * len);
    (if m < len { m } else { 2 * len - 1 - m }) as usize
}

/// Separable Gaussian blur. Cells beyond the grid edge mirror the cells
/// inside it (`d c b a | a b c d | d c b a`).
pub fn gaussian_filter(grid: &Grid, sigma: f64) -> Grid {
    if !(sigma > 0.0) || grid.width == 0 || grid.height == 0 {
        return grid.clone();
    }

    let kernel = gaussian_kernel(sigma, GAUSSIAN_TRUNCATE);
    let radius = (kernel.len() / 2) as isize;
    let (w, h) = (grid.width, grid.height);

    let mut horizontal = vec![0.0; w * h];
    for row in 0..h {
        let line = &grid.values[row * w..(row + 1) * w];
        for col in 0..w {
            horizontal[row * w + col] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| weight * line[reflect(col as isize + k as isize - radius, w)])
                .sum();
        }
    }

    let mut out = vec![0.0; w * h];
    for row in 0..h {
        for col in 0..w {
            out[row * w + col] = kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    weight * horizontal[reflect(row as isize + k as isize - radius, h) * w + col]
                })
                .sum();
        }
    }

    Grid::new(w, h, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_shape() {
        let kernel = gaussian_kernel(4.0, 4.0);
        assert_eq!(kernel.len(), 33);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(kernel[16] > kernel[0]);
        assert_eq!(kernel[0], kernel[32]);
    }

    #[test]
    fn test_constant_field_is_unchanged() {
        let grid = Grid::new(10, 10, vec![42.0; 100]);
        let smoothed = gaussian_filter(&grid, 4.0);
        assert!(smoothed.values.iter().all(|v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn test_spike_is_spread() {
        let mut values = vec![0.0; 81];
        values[40] = 81.0;
        let grid = Grid::new(9, 9, values);
        let smoothed = gaussian_filter(&grid, 1.0);

        assert!(smoothed.get(4, 4) < 81.0);
        assert!(smoothed.get(3, 4) > 0.0);
        let total: f64 = smoothed.values.iter().sum();
        assert!((total - 81.0).abs() < 1e-6);
    }

    #[test]
    fn test_reflect_index() {
        let mapped: Vec<usize> = [-5, -4, -2, -1, 0, 3, 4, 5, 7, 8]
            .iter()
            .map(|&i| reflect(i, 4))
            .collect();
        assert_eq!(mapped, vec![3, 3, 1, 0, 0, 3, 3, 2, 0, 0]);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn test_edge_mirrors_inner_cells() {
        let grid = Grid::new(6, 1, vec![0.0, 100.0, 0.0, 0.0, 0.0, 0.0]);
        let kernel = gaussian_kernel(1.0, GAUSSIAN_TRUNCATE);
        let r = kernel.len() / 2;
        let smoothed = gaussian_filter(&grid, 1.0);

        // col 0 sees cell 1 at offset +1 and again, mirrored, at offset -2
        let expected = 100.0 * (kernel[r + 1] + kernel[r + 2]);
        assert!((smoothed.get(0, 0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let grid = Grid::new(2, 1, vec![1.0, 2.0]);
        assert_eq!(gaussian_filter(&grid, 0.0), grid);
    }
}
