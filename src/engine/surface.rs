// Height-field surface mesh.
//
// Grid → SurfaceMesh:
//   1. Per grid point: position (x[j], y[i][j], z[i]), finite-difference normal, colormap color.
//   2. Per cell: two triangles on a fixed diagonal, CCW seen from +Y.
//   3. Flatten to one SurfaceVertex per triangle corner (no index buffer) so each
//      triangle can carry its own barycentric tuple for the wireframe overlay.

use glam::Vec3;
use super::colormap::ColorMap;
use super::grid::Grid;
use super::mesh::{Bounds, SurfaceVertex};

// ============================================================================
// SURFACE MESH
// ============================================================================

pub struct SurfaceMesh {
    pub vertices: Vec<SurfaceVertex>,
    pub bounds: Bounds,
    nx: usize,
    nz: usize,
}

impl SurfaceMesh {
    pub fn build(grid: &Grid, colormap: ColorMap) -> Self {
        let (nx, nz) = (grid.nx(), grid.nz());
        let (ymin, ymax) = grid.ylim();

        let normals = vertex_normals(grid);
        let colors: Vec<Vec3> = grid.heights().iter()
            .map(|&h| colormap.map_range(h, ymin, ymax))
            .collect();

        let triangles = cell_triangles(nx, nz);
        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        for (t, tri) in triangles.iter().enumerate() {
            let bary = barycentric(t);
            for (corner, &k) in tri.iter().enumerate() {
                vertices.push(SurfaceVertex {
                    position:    grid.position(k / nx, k % nx).to_array(),
                    normal:      normals[k].to_array(),
                    barycentric: bary[corner],
                    color:       colors[k].to_array(),
                });
            }
        }

        log::debug!(
            "surface mesh {nx} x {nz}: {} triangles, {} vertices",
            triangles.len(),
            vertices.len()
        );

        Self {
            vertices,
            bounds: Bounds::from_limits(grid.xlim(), grid.ylim(), grid.zlim()),
            nx,
            nz,
        }
    }

    /// Cast vertex slice to raw bytes for wgpu buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn triangle_count(&self) -> usize { self.vertices.len() / 3 }
    pub fn resolution(&self) -> (usize, usize) { (self.nx, self.nz) }
}

// ============================================================================
// TRIANGULATION
// ============================================================================

/// Two triangles per cell as grid indices (`i * nx + j`), cells in row-major order.
///
/// Cell (i, j) with k = i * nx + j:
///   [k, k + nx, k + 1]          (i,j)   (i+1,j) (i,j+1)
///   [k + 1, k + nx, k + nx + 1] (i,j+1) (i+1,j) (i+1,j+1)
/// Both share the (i+1,j)–(i,j+1) diagonal. With X and Z increasing, each triangle's
/// (b - a) × (c - a) points along +Y.
pub fn cell_triangles(nx: usize, nz: usize) -> Vec<[usize; 3]> {
    let mut triangles = Vec::with_capacity(2 * (nx - 1) * (nz - 1));
    for i in 0..nz - 1 {
        for j in 0..nx - 1 {
            let k = i * nx + j;
            triangles.push([k, k + nx, k + 1]);
            triangles.push([k + 1, k + nx, k + nx + 1]);
        }
    }
    triangles
}

/// Per-corner barycentric tuples for triangle `t` of the flattened list.
///
/// The fragment stage draws an edge where a component falls to zero along it. Both
/// sets leave the shared diagonal (corners 1–2 on even triangles, 0–1 on odd ones)
/// without a common zero component, so only the grid lines are drawn.
pub fn barycentric(t: usize) -> [[f32; 3]; 3] {
    const EVEN: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    const ODD:  [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 1.0], [0.0, 0.0, 1.0]];
    if t % 2 == 0 { EVEN } else { ODD }
}

// ============================================================================
// NORMALS
// ============================================================================

/// Where an index sits along one grid direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    First,
    Inner,
    Last,
}

impl Span {
    pub fn of(idx: usize, n: usize) -> Span {
        if idx == 0 {
            Span::First
        } else if idx == n - 1 {
            Span::Last
        } else {
            Span::Inner
        }
    }
}

/// Smooth normals for every grid point, row-major.
pub fn vertex_normals(grid: &Grid) -> Vec<Vec3> {
    let (nx, nz) = (grid.nx(), grid.nz());
    (0..nz)
        .flat_map(|i| (0..nx).map(move |j| (i, j)))
        .map(|(i, j)| vertex_normal(grid, i, j))
        .collect()
}

/// Normal at grid point (i, j) from finite differences to its 4-neighbourhood.
///
/// Edge vectors: `up` = P - P(i-1), `down` = P(i+1) - P, `left` = P - P(j-1),
/// `right` = P(j+1) - P. Every available (vertical × horizontal) cross product is
/// summed, approximating the area-weighted mean of the adjacent face normals:
/// four terms inside, two on a border, one in a corner.
pub fn vertex_normal(grid: &Grid, i: usize, j: usize) -> Vec3 {
    let p = grid.position(i, j);
    // lazily evaluated: border branches never touch the missing neighbour
    let up    = || p - grid.position(i - 1, j);
    let down  = || grid.position(i + 1, j) - p;
    let left  = || p - grid.position(i, j - 1);
    let right = || grid.position(i, j + 1) - p;

    let sum = match (Span::of(i, grid.nz()), Span::of(j, grid.nx())) {
        (Span::Inner, Span::Inner) => {
            up().cross(left()) + up().cross(right()) + down().cross(left()) + down().cross(right())
        }

        // first/last column: forward or backward difference along X
        (Span::Inner, Span::First) => up().cross(right()) + down().cross(right()),
        (Span::Inner, Span::Last)  => up().cross(left()) + down().cross(left()),

        // first/last row: forward or backward difference along Z
        (Span::First, Span::Inner) => down().cross(left()) + down().cross(right()),
        (Span::Last, Span::Inner)  => up().cross(left()) + up().cross(right()),

        (Span::First, Span::First) => down().cross(right()),
        (Span::First, Span::Last)  => down().cross(left()),
        (Span::Last, Span::First)  => up().cross(right()),
        (Span::Last, Span::Last)   => up().cross(left()),
    };

    sum.normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grid::{linspace, GridData};

    const SCALE: Vec3 = Vec3::new(5.0, 1.5, 5.0);

    fn build(data: GridData) -> (Grid, SurfaceMesh) {
        let grid = Grid::build(data, SCALE).unwrap();
        let mesh = SurfaceMesh::build(&grid, ColorMap::Jet);
        (grid, mesh)
    }

    fn sine_grid() -> (Grid, SurfaceMesh) {
        build(GridData::from_fn(
            linspace(-6.0, 6.0, 5),
            linspace(-10.0, 10.0, 5),
            |x, z| x.sin() * z.cos(),
        ))
    }

    #[test]
    fn sine_scenario_counts() {
        let (_, mesh) = sine_grid();
        assert_eq!(mesh.triangle_count(), 32);
        assert_eq!(mesh.vertex_count(), 96);
        assert_eq!(mesh.vertex_bytes().len(), 96 * std::mem::size_of::<SurfaceVertex>());
    }

    #[test]
    fn vertex_count_follows_cell_count() {
        for (nx, nz) in [(2, 2), (3, 3), (10, 10), (3, 7)] {
            let (grid, mesh) = build(GridData::from_fn(
                linspace(0.0, 1.0, nx),
                linspace(0.0, 1.0, nz),
                |x, z| x * z,
            ));
            // unequal axes are resampled to a square grid first
            let m = nx.max(nz);
            assert_eq!((grid.nx(), grid.nz()), (m, m));
            assert_eq!(mesh.vertex_count(), 6 * (m - 1) * (m - 1));
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let (grid, mesh) = sine_grid();
        for n in vertex_normals(&grid) {
            assert!((n.length() - 1.0).abs() < 1e-5, "{n}");
        }
        for v in &mesh.vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn corner_normals_use_single_cross_product() {
        let (grid, _) = sine_grid();
        let p = |i, j| grid.position(i, j);

        let expected = (p(1, 0) - p(0, 0)).cross(p(0, 1) - p(0, 0)).normalize();
        assert!(vertex_normal(&grid, 0, 0).abs_diff_eq(expected, 1e-6));

        let expected = (p(4, 4) - p(3, 4)).cross(p(4, 4) - p(4, 3)).normalize();
        assert!(vertex_normal(&grid, 4, 4).abs_diff_eq(expected, 1e-6));

        let expected = (p(1, 4) - p(0, 4)).cross(p(0, 4) - p(0, 3)).normalize();
        assert!(vertex_normal(&grid, 0, 4).abs_diff_eq(expected, 1e-6));

        let expected = (p(4, 0) - p(3, 0)).cross(p(4, 1) - p(4, 0)).normalize();
        assert!(vertex_normal(&grid, 4, 0).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn interior_normals_sum_four_cross_products() {
        let (grid, _) = sine_grid();
        let p = |i, j| grid.position(i, j);
        let (i, j) = (2, 1);
        let up = p(i, j) - p(i - 1, j);
        let down = p(i + 1, j) - p(i, j);
        let left = p(i, j) - p(i, j - 1);
        let right = p(i, j + 1) - p(i, j);
        let expected = (up.cross(left) + up.cross(right) + down.cross(left) + down.cross(right)).normalize();
        assert!(vertex_normal(&grid, i, j).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn border_normals_sum_two_cross_products() {
        let (grid, _) = sine_grid();
        let p = |i, j| grid.position(i, j);

        // first column, interior row
        let right = p(2, 1) - p(2, 0);
        let expected = ((p(2, 0) - p(1, 0)).cross(right) + (p(3, 0) - p(2, 0)).cross(right)).normalize();
        assert!(vertex_normal(&grid, 2, 0).abs_diff_eq(expected, 1e-6));

        // last row, interior column
        let up = p(4, 2) - p(3, 2);
        let expected = (up.cross(p(4, 2) - p(4, 1)) + up.cross(p(4, 3) - p(4, 2))).normalize();
        assert!(vertex_normal(&grid, 4, 2).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn flat_grid_points_straight_up() {
        let (grid, mesh) = build(GridData::from_heights(vec![vec![0.25; 6]; 6]));
        for n in vertex_normals(&grid) {
            assert!(n.abs_diff_eq(Vec3::Y, 1e-6));
        }
        let low = ColorMap::Jet.map_value(0.0).to_array();
        assert!(mesh.vertices.iter().all(|v| v.color == low));
    }

    #[test]
    fn tilted_plane_has_constant_normal() {
        // y = x: after scaling the slope is SCALE.y / SCALE.x
        let (grid, _) = build(GridData::from_fn(linspace(0.0, 1.0, 4), linspace(0.0, 1.0, 4), |x, _| x));
        let slope = SCALE.y / SCALE.x;
        let expected = Vec3::new(-slope, 1.0, 0.0).normalize();
        for n in vertex_normals(&grid) {
            assert!(n.abs_diff_eq(expected, 1e-5), "{n} vs {expected}");
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_above() {
        let (_, mesh) = sine_grid();
        for tri in mesh.vertices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from(v.position));
            // project onto the XZ plane so height does not matter
            let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z);
            let n = (flat(b) - flat(a)).cross(flat(c) - flat(a));
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn barycentric_alternates_by_parity() {
        assert_eq!(barycentric(0), barycentric(2));
        assert_eq!(barycentric(1), barycentric(3));
        assert_ne!(barycentric(0), barycentric(1));
    }

    #[test]
    fn wireframe_skips_the_diagonal() {
        let (_, mesh) = sine_grid();
        let shares_zero = |a: [f32; 3], b: [f32; 3]| (0..3).any(|c| a[c] == 0.0 && b[c] == 0.0);

        for tri in mesh.vertices.chunks(3) {
            for (a, b) in [(0, 1), (1, 2), (0, 2)] {
                let (va, vb) = (tri[a], tri[b]);
                let diagonal = va.position[0] != vb.position[0] && va.position[2] != vb.position[2];
                // grid-aligned edges get drawn, the diagonal does not
                assert_eq!(shares_zero(va.barycentric, vb.barycentric), !diagonal);
            }
        }
    }

    #[test]
    fn colors_span_the_colormap() {
        let (grid, mesh) = sine_grid();
        let (ymin, ymax) = grid.ylim();
        let at = |y: f32| mesh.vertices.iter().find(|v| v.position[1] == y).map(|v| v.color);
        assert_eq!(at(ymin), Some(ColorMap::Jet.map_value(0.0).to_array()));
        assert_eq!(at(ymax), Some(ColorMap::Jet.map_value(1.0).to_array()));
    }

    #[test]
    fn bounds_follow_grid_limits() {
        let (grid, mesh) = sine_grid();
        assert_eq!(mesh.bounds.min, Vec3::new(-5.0, grid.ylim().0, -5.0));
        assert_eq!(mesh.bounds.max, Vec3::new(5.0, grid.ylim().1, 5.0));
        assert_eq!(mesh.resolution(), (5, 5));
    }
}
