// Height-field grid: validation, resampling and normalization.
//
// Input layout: `y[i][j]` is the height at (x[j], z[i]), so rows run along Z and
// columns along X. After `Grid::build` the grid is always square (M x M with
// M = max(Nx, Nz)) and every axis sits in [-scale, scale] for its own scale factor.

use glam::Vec3;
use super::error::{PlotError, Result};

// ============================================================================
// RAW INPUT
// ============================================================================

/// Unvalidated sample data as handed in by the caller.
#[derive(Debug, Clone)]
pub struct GridData {
    /// X coordinates, one per column. `None` = symmetric linspace.
    pub x: Option<Vec<f32>>,
    /// Z coordinates, one per row. `None` = symmetric linspace.
    pub z: Option<Vec<f32>>,
    /// Height matrix, Nz rows of Nx samples each.
    pub y: Vec<Vec<f32>>,
}

impl GridData {
    pub fn new(x: Vec<f32>, z: Vec<f32>, y: Vec<Vec<f32>>) -> Self {
        Self { x: Some(x), z: Some(z), y }
    }

    /// Heights only; both axes default to `linspace(-1, 1, n)`.
    pub fn from_heights(y: Vec<Vec<f32>>) -> Self {
        Self { x: None, z: None, y }
    }

    /// Sample `f(x, z)` on the outer product of the two axes.
    pub fn from_fn(x: Vec<f32>, z: Vec<f32>, f: impl Fn(f32, f32) -> f32) -> Self {
        let y = z.iter()
            .map(|&zz| x.iter().map(|&xx| f(xx, zz)).collect())
            .collect();
        Self::new(x, z, y)
    }
}

// ============================================================================
// NORMALIZED GRID
// ============================================================================

/// Validated, square, normalized grid ready for meshing.
#[derive(Debug, Clone)]
pub struct Grid {
    x: Vec<f32>,
    z: Vec<f32>,
    /// Row-major, `heights[i * nx + j]`
    heights: Vec<f32>,
    ylim: (f32, f32),
}

impl Grid {
    /// Validate, resample to a square grid and rescale every axis into `[-scale, scale]`.
    /// Fails before anything is allocated for rendering.
    pub fn build(data: GridData, scale: Vec3) -> Result<Grid> {
        let GridData { x, z, y } = data;

        let nz = y.len();
        if nz < 2 {
            return Err(PlotError::InvalidGrid(format!(
                "height matrix needs at least 2 rows, got {nz}"
            )));
        }
        let nx = y[0].len();
        if nx < 2 {
            return Err(PlotError::InvalidGrid(format!(
                "height matrix needs at least 2 columns, got {nx}"
            )));
        }
        if let Some((i, row)) = y.iter().enumerate().find(|(_, row)| row.len() != nx) {
            return Err(PlotError::InvalidGrid(format!(
                "row {i} has {} samples, expected {nx}", row.len()
            )));
        }

        let x = x.unwrap_or_else(|| linspace(-1.0, 1.0, nx));
        let z = z.unwrap_or_else(|| linspace(-1.0, 1.0, nz));
        if x.len() != nx || z.len() != nz {
            return Err(PlotError::InvalidGrid(format!(
                "{} x {} axes do not match {} height samples ({nz} rows of {nx})",
                x.len(), z.len(), nx * nz
            )));
        }
        check_axis("x", &x)?;
        check_axis("z", &z)?;
        if let Some(v) = y.iter().flatten().find(|v| !v.is_finite()) {
            return Err(PlotError::InvalidGrid(format!("non-finite height sample {v}")));
        }

        let (x, z, rows) = resample_square(x, z, y);
        let m = x.len();

        let x = normalize_axis(&x, scale.x);
        let z = normalize_axis(&z, scale.z);
        let heights = normalize_axis(&rows.concat(), scale.y);

        let ylim = heights.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });

        log::debug!("grid normalized to {m} x {m}, y range [{:.3}, {:.3}]", ylim.0, ylim.1);

        Ok(Grid { x, z, heights, ylim })
    }

    pub fn nx(&self) -> usize { self.x.len() }
    pub fn nz(&self) -> usize { self.z.len() }
    pub fn x(&self) -> &[f32] { &self.x }
    pub fn z(&self) -> &[f32] { &self.z }
    pub fn heights(&self) -> &[f32] { &self.heights }

    /// Height at row `i` (Z index), column `j` (X index).
    #[inline]
    pub fn height(&self, i: usize, j: usize) -> f32 {
        self.heights[i * self.nx() + j]
    }

    /// World-space position of grid point (i, j).
    #[inline]
    pub fn position(&self, i: usize, j: usize) -> Vec3 {
        Vec3::new(self.x[j], self.height(i, j), self.z[i])
    }

    pub fn xlim(&self) -> (f32, f32) { (self.x[0], self.x[self.nx() - 1]) }
    pub fn zlim(&self) -> (f32, f32) { (self.z[0], self.z[self.nz() - 1]) }

    /// Observed height range after scaling; this is the color-mapping domain.
    pub fn ylim(&self) -> (f32, f32) { self.ylim }
}

fn check_axis(name: &str, axis: &[f32]) -> Result<()> {
    if let Some(v) = axis.iter().find(|v| !v.is_finite()) {
        return Err(PlotError::InvalidGrid(format!("non-finite {name} coordinate {v}")));
    }
    if let Some(k) = axis.windows(2).position(|w| w[1] <= w[0]) {
        return Err(PlotError::InvalidGrid(format!(
            "{name} axis must be strictly increasing (index {k}: {} then {})",
            axis[k], axis[k + 1]
        )));
    }
    Ok(())
}

/// Stretch the shorter axis (and the matching direction of `rows`) to the longer length.
fn resample_square(x: Vec<f32>, z: Vec<f32>, rows: Vec<Vec<f32>>) -> (Vec<f32>, Vec<f32>, Vec<Vec<f32>>) {
    let (nx, nz) = (x.len(), z.len());
    let m = nx.max(nz);

    if nx < m {
        log::debug!("resampling x axis {nx} -> {m}");
        let new_x = linspace(x[0], x[nx - 1], m);
        let rows = rows.iter().map(|row| interp(&new_x, &x, row)).collect();
        (new_x, z, rows)
    } else if nz < m {
        log::debug!("resampling z axis {nz} -> {m}");
        let new_z = linspace(z[0], z[nz - 1], m);
        let columns: Vec<Vec<f32>> = (0..nx)
            .map(|j| {
                let column: Vec<f32> = rows.iter().map(|row| row[j]).collect();
                interp(&new_z, &z, &column)
            })
            .collect();
        let rows = (0..m).map(|i| columns.iter().map(|c| c[i]).collect()).collect();
        (x, new_z, rows)
    } else {
        (x, z, rows)
    }
}

/// Map `values` linearly onto `[-half_extent, half_extent]`. A constant input maps to 0.
/// Works in f64: the span of two finite f32 samples can exceed f32::MAX.
fn normalize_axis(values: &[f32], half_extent: f32) -> Vec<f32> {
    let (lo, hi) = values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v as f64), hi.max(v as f64))
    });
    let range = hi - lo;
    if range <= 0.0 {
        return vec![0.0; values.len()];
    }
    let half_extent = half_extent as f64;
    values.iter()
        .map(|&v| (((v as f64 - lo) / range * 2.0 - 1.0) * half_extent) as f32)
        .collect()
}

// ============================================================================
// HELPERS
// ============================================================================

/// `n` evenly spaced samples from `start` to `end` inclusive.
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let (start64, step) = (start as f64, (end as f64 - start as f64) / (n - 1) as f64);
            let mut out: Vec<f32> = (0..n).map(|i| (start64 + step * i as f64) as f32).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Piecewise-linear interpolation of (`xs`, `ys`) at each of `new_xs`.
/// Queries outside the sampled range clamp to the end values. `xs` must be increasing.
pub fn interp(new_xs: &[f32], xs: &[f32], ys: &[f32]) -> Vec<f32> {
    debug_assert_eq!(xs.len(), ys.len());
    let last = xs.len() - 1;
    new_xs.iter()
        .map(|&q| {
            if q <= xs[0] {
                return ys[0];
            }
            if q >= xs[last] {
                return ys[last];
            }
            // first sample strictly greater than q; always in 1..=last here
            let k = xs.partition_point(|&x| x <= q);
            let (x0, x1) = (xs[k - 1] as f64, xs[k] as f64);
            let (y0, y1) = (ys[k - 1] as f64, ys[k] as f64);
            let t = (q as f64 - x0) / (x1 - x0);
            (y0 + (y1 - y0) * t) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: Vec3 = Vec3::new(5.0, 1.5, 5.0);

    fn expect_invalid(data: GridData) {
        match Grid::build(data, SCALE) {
            Err(PlotError::InvalidGrid(_)) => {}
            other => panic!("expected InvalidGrid, got {other:?}"),
        }
    }

    #[test]
    fn linspace_hits_both_ends() {
        let v = linspace(-6.0, 6.0, 5);
        assert_eq!(v, vec![-6.0, -3.0, 0.0, 3.0, 6.0]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn interp_is_linear_and_clamps() {
        let xs = [0.0, 1.0, 3.0];
        let ys = [0.0, 10.0, 30.0];
        let out = interp(&[-1.0, 0.5, 2.0, 3.0, 9.0], &xs, &ys);
        assert_eq!(out, vec![0.0, 5.0, 20.0, 30.0, 30.0]);
    }

    #[test]
    fn rejects_too_few_samples() {
        expect_invalid(GridData::from_heights(vec![vec![1.0, 2.0]]));
        expect_invalid(GridData::from_heights(vec![vec![1.0], vec![2.0]]));
        expect_invalid(GridData::from_heights(vec![]));
    }

    #[test]
    fn rejects_ragged_rows() {
        expect_invalid(GridData::from_heights(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]]));
    }

    #[test]
    fn rejects_axis_length_mismatch() {
        let y = vec![vec![0.0; 3]; 4];
        expect_invalid(GridData::new(vec![0.0, 1.0], linspace(0.0, 1.0, 4), y.clone()));
        expect_invalid(GridData::new(linspace(0.0, 1.0, 3), vec![0.0, 1.0], y));
    }

    #[test]
    fn rejects_non_increasing_axis() {
        let y = vec![vec![0.0; 3]; 3];
        expect_invalid(GridData::new(vec![0.0, 2.0, 1.0], linspace(0.0, 1.0, 3), y.clone()));
        expect_invalid(GridData::new(linspace(0.0, 1.0, 3), vec![0.0, 0.0, 1.0], y));
    }

    #[test]
    fn rejects_non_finite_heights() {
        let mut y = vec![vec![0.0; 3]; 3];
        y[1][2] = f32::NAN;
        expect_invalid(GridData::from_heights(y));
    }

    #[test]
    fn default_axes_are_symmetric() {
        let grid = Grid::build(GridData::from_heights(vec![vec![0.0, 1.0, 2.0]; 3]), SCALE).unwrap();
        assert_eq!(grid.xlim(), (-5.0, 5.0));
        assert_eq!(grid.zlim(), (-5.0, 5.0));
        assert_eq!(grid.x()[1], 0.0);
    }

    #[test]
    fn axes_are_scaled_independently() {
        let data = GridData::from_fn(linspace(-6.0, 6.0, 5), linspace(-10.0, 10.0, 5), |x, z| x.sin() * z.cos());
        let grid = Grid::build(data, SCALE).unwrap();
        assert_eq!(grid.xlim(), (-5.0, 5.0));
        assert_eq!(grid.zlim(), (-5.0, 5.0));
        let (lo, hi) = grid.ylim();
        assert!((lo + 1.5).abs() < 1e-5 && (hi - 1.5).abs() < 1e-5);
    }

    #[test]
    fn flat_heights_normalize_to_zero() {
        let grid = Grid::build(GridData::from_heights(vec![vec![3.0; 4]; 4]), SCALE).unwrap();
        assert!(grid.heights().iter().all(|&h| h == 0.0));
        assert_eq!(grid.ylim(), (0.0, 0.0));
    }

    #[test]
    fn extreme_finite_samples_stay_finite() {
        let mut y = vec![vec![0.0; 4]; 4];
        y[0][0] = 3e38;
        y[0][1] = -3e38;
        let data = GridData::new(vec![-3e38, -1.0, 1.0, 3e38], linspace(0.0, 1.0, 4), y);
        let grid = Grid::build(data, SCALE).unwrap();

        assert!(grid.heights().iter().all(|h| h.is_finite()));
        assert!(grid.x().iter().all(|x| x.is_finite()));
        assert_eq!(grid.height(0, 0), 1.5);
        assert_eq!(grid.height(0, 1), -1.5);
        assert!(grid.height(2, 2).abs() < 1e-6);
        assert_eq!(grid.ylim(), (-1.5, 1.5));
        assert_eq!(grid.xlim(), (-5.0, 5.0));
    }

    #[test]
    fn extreme_axis_is_resampled_without_overflow() {
        // 3 columns spanning the whole f32 range, 4 rows: x gets resampled to 4 samples
        let data = GridData::new(vec![-3e38, 0.0, 3e38], linspace(0.0, 1.0, 4), vec![vec![-3e38, 0.0, 3e38]; 4]);
        let grid = Grid::build(data, SCALE).unwrap();
        assert_eq!((grid.nx(), grid.nz()), (4, 4));
        assert!(grid.heights().iter().all(|h| h.is_finite()));
        assert_eq!(grid.ylim(), (-1.5, 1.5));
    }

    #[test]
    fn shorter_x_axis_is_resampled() {
        // plane y = x on 3 columns, 5 rows
        let data = GridData::from_fn(linspace(0.0, 2.0, 3), linspace(0.0, 4.0, 5), |x, _| x);
        let grid = Grid::build(data, SCALE).unwrap();
        assert_eq!((grid.nx(), grid.nz()), (5, 5));
        for i in 0..5 {
            for j in 0..5 {
                let expected = grid.x()[j] * SCALE.y / SCALE.x;
                assert!((grid.height(i, j) - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn shorter_z_axis_is_resampled() {
        // plane y = z on 6 columns, 2 rows
        let data = GridData::from_fn(linspace(0.0, 5.0, 6), vec![0.0, 1.0], |_, z| z);
        let grid = Grid::build(data, SCALE).unwrap();
        assert_eq!((grid.nx(), grid.nz()), (6, 6));
        for i in 0..6 {
            let expected = grid.z()[i] * SCALE.y / SCALE.z;
            for j in 0..6 {
                assert!((grid.height(i, j) - expected).abs() < 1e-5);
            }
        }
    }
}
