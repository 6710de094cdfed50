//! Terrain height queries for camera collision.
//!
//! Heights are bilinearly interpolated from the four grid vertices around the
//! query point, so the result agrees exactly with the mesh at every vertex and
//! is continuous across cell borders. Queries outside the terrain footprint
//! never fail; they resolve through an [`OutOfBounds`] policy instead.

use serde::{Deserialize, Serialize};

use crate::world::terrain::TerrainMesh;

/// Height reported for points outside the terrain when no policy is given.
pub const DEFAULT_FALLBACK_HEIGHT: f32 = 0.0;

/// Grid coordinates this close to a grid line (in multiples of the grid size)
/// are snapped onto it, so a vertex's own world position maps back to the
/// vertex despite float round-off.
const GRID_SNAP_ULPS: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfBounds {
    /// Report a fixed height outside the terrain.
    Fallback(f32),
    /// No floor outside the terrain: report negative infinity.
    Unclamped,
}

impl Default for OutOfBounds {
    fn default() -> Self {
        OutOfBounds::Fallback(DEFAULT_FALLBACK_HEIGHT)
    }
}

impl OutOfBounds {
    fn resolve(self) -> f32 {
        match self {
            OutOfBounds::Fallback(height) => height,
            OutOfBounds::Unclamped => f32::NEG_INFINITY,
        }
    }
}

/// Read-only height lookup over a built terrain.
#[derive(Debug, Clone, Copy)]
pub struct HeightQuery<'a> {
    mesh: &'a TerrainMesh,
    out_of_bounds: OutOfBounds,
}

impl<'a> HeightQuery<'a> {
    pub fn new(mesh: &'a TerrainMesh, out_of_bounds: OutOfBounds) -> Self {
        Self { mesh, out_of_bounds }
    }

    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.mesh
            .try_height_at(world_x, world_z)
            .unwrap_or_else(|| self.out_of_bounds.resolve())
    }

    pub fn contains(&self, world_x: f32, world_z: f32) -> bool {
        self.mesh.try_height_at(world_x, world_z).is_some()
    }
}

/// Terrain height at `(world_x, world_z)`, or [`DEFAULT_FALLBACK_HEIGHT`]
/// outside the `world_extent` square.
pub fn height_at(mesh: &TerrainMesh, world_x: f32, world_z: f32, world_extent: f32) -> f32 {
    interpolate(mesh, world_x, world_z, world_extent).unwrap_or(DEFAULT_FALLBACK_HEIGHT)
}

impl TerrainMesh {
    /// Interpolated height, `None` outside the terrain footprint.
    pub fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        interpolate(self, world_x, world_z, self.world_extent())
    }
}

fn interpolate(mesh: &TerrainMesh, world_x: f32, world_z: f32, world_extent: f32) -> Option<f32> {
    if !(world_extent.is_finite() && world_extent > 0.0) {
        return None;
    }
    let cells_x = mesh.grid_width() - 1;
    let cells_z = mesh.grid_height() - 1;
    let grid_x = to_grid(world_x, world_extent, cells_x)?;
    let grid_z = to_grid(world_z, world_extent, cells_z)?;

    // The far edge belongs to the last cell, with a fraction of 1.
    let x0 = (grid_x.floor() as usize).min(cells_x - 1);
    let z0 = (grid_z.floor() as usize).min(cells_z - 1);
    let fx = grid_x - x0 as f32;
    let fz = grid_z - z0 as f32;

    let h = |i: usize, j: usize| mesh.vertex(i, j).position[1];
    Some(bilinear(
        h(x0, z0),
        h(x0 + 1, z0),
        h(x0, z0 + 1),
        h(x0 + 1, z0 + 1),
        fx,
        fz,
    ))
}

/// Maps a world coordinate onto `[0, cells]` grid space.
fn to_grid(world: f32, world_extent: f32, cells: usize) -> Option<f32> {
    let cells = cells as f32;
    let grid = (world + world_extent * 0.5) / world_extent * cells;
    let nearest = grid.round();
    let grid = if (grid - nearest).abs() <= GRID_SNAP_ULPS * f32::EPSILON * cells.max(1.0) {
        nearest
    } else {
        grid
    };
    // NaN fails both comparisons.
    (grid >= 0.0 && grid <= cells).then_some(grid)
}

/// Bilinear interpolation of the corner values `h00` (fx=0, fz=0), `h10`
/// (fx=1, fz=0), `h01` (fx=0, fz=1) and `h11`.
pub fn bilinear(h00: f32, h10: f32, h01: f32, h11: f32, fx: f32, fz: f32) -> f32 {
    let h0 = lerp(h00, h10, fx);
    let h1 = lerp(h01, h11, fx);
    lerp(h0, h1, fz)
}

// Weighted form: exact at t = 0 and t = 1.
#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::heightmap::HeightmapImage;
    use crate::world::terrain::TerrainParams;
    use approx::assert_abs_diff_eq;

    /// 2x2 grid over [-1, 1] with corner heights 0, 2, 4, 6.
    fn ramp() -> TerrainMesh {
        let image = HeightmapImage::from_raw(2, 2, vec![0, 85, 170, 255]).unwrap();
        let params = TerrainParams {
            stride: 1,
            world_extent: 2.0,
            height_scale: 6.0,
        };
        TerrainMesh::build(&image, &params).unwrap()
    }

    #[test]
    fn test_bilinear_midpoint() {
        assert_eq!(bilinear(0.0, 2.0, 4.0, 6.0, 0.5, 0.5), 3.0);
    }

    #[test]
    fn test_bilinear_exact_at_corners() {
        let (h00, h10, h01, h11) = (0.3, 1.7, -2.5, 9.1);
        assert_eq!(bilinear(h00, h10, h01, h11, 0.0, 0.0), h00);
        assert_eq!(bilinear(h00, h10, h01, h11, 1.0, 0.0), h10);
        assert_eq!(bilinear(h00, h10, h01, h11, 0.0, 1.0), h01);
        assert_eq!(bilinear(h00, h10, h01, h11, 1.0, 1.0), h11);
    }

    #[test]
    fn test_cell_centre_of_mesh() {
        let mesh = ramp();
        assert_abs_diff_eq!(height_at(&mesh, 0.0, 0.0, 2.0), 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(mesh.try_height_at(0.0, 0.0).unwrap(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_linear_along_edges() {
        let mesh = ramp();
        // Along z = -1 the height runs 0 -> 2.
        assert_abs_diff_eq!(height_at(&mesh, -0.5, -1.0, 2.0), 0.5, epsilon = 1e-5);
        // Along x = 1 the height runs 2 -> 6.
        assert_abs_diff_eq!(height_at(&mesh, 1.0, 0.5, 2.0), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_out_of_bounds_fallback() {
        let mesh = ramp();
        assert_eq!(height_at(&mesh, 1.0e6, 0.0, 2.0), DEFAULT_FALLBACK_HEIGHT);
        assert_eq!(height_at(&mesh, 0.0, -1.01, 2.0), DEFAULT_FALLBACK_HEIGHT);
        assert_eq!(height_at(&mesh, f32::NAN, 0.0, 2.0), DEFAULT_FALLBACK_HEIGHT);
        assert_eq!(mesh.try_height_at(-3.0, -3.0), None);
    }

    #[test]
    fn test_query_policy() {
        let mesh = ramp();
        let fallback = HeightQuery::new(&mesh, OutOfBounds::Fallback(-7.5));
        assert_eq!(fallback.height_at(50.0, 50.0), -7.5);
        assert!(!fallback.contains(50.0, 50.0));
        assert!(fallback.contains(0.0, 0.0));

        let unclamped = HeightQuery::new(&mesh, OutOfBounds::Unclamped);
        assert_eq!(unclamped.height_at(50.0, 50.0), f32::NEG_INFINITY);
        assert_abs_diff_eq!(unclamped.height_at(0.0, 0.0), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_continuous_across_cell_edges() {
        // 5x5 grid over [-2, 2], one world unit per cell.
        #[rustfmt::skip]
        let data = vec![
            10, 200,  40, 255,   0,
            90,   5, 180,  60, 220,
           250,  70,   0, 130,  30,
            15, 160, 240,  20, 110,
           200,  45,  80, 190,  55,
        ];
        let image = HeightmapImage::from_raw(5, 5, data).unwrap();
        let params = TerrainParams {
            stride: 1,
            world_extent: 4.0,
            height_scale: 10.0,
        };
        let mesh = TerrainMesh::build(&image, &params).unwrap();

        // Heights change by at most `height_scale` per cell, in either axis.
        let delta = 1.0e-4;
        let tolerance = 2.0 * 2.0 * delta * params.height_scale + 1.0e-4;

        for k in 1..4 {
            let edge = -2.0 + k as f32;
            for &t in &[-1.7, -0.5, 0.25, 0.9, 1.33] {
                let below = height_at(&mesh, edge - delta, t, 4.0);
                let on = height_at(&mesh, edge, t, 4.0);
                let above = height_at(&mesh, edge + delta, t, 4.0);
                assert_abs_diff_eq!(below, on, epsilon = tolerance);
                assert_abs_diff_eq!(above, on, epsilon = tolerance);

                let below = height_at(&mesh, t, edge - delta, 4.0);
                let on = height_at(&mesh, t, edge, 4.0);
                let above = height_at(&mesh, t, edge + delta, 4.0);
                assert_abs_diff_eq!(below, on, epsilon = tolerance);
                assert_abs_diff_eq!(above, on, epsilon = tolerance);
            }
        }
    }

    #[test]
    fn test_invalid_extent_falls_back() {
        let mesh = ramp();
        assert_eq!(height_at(&mesh, 0.0, 0.0, 0.0), DEFAULT_FALLBACK_HEIGHT);
        assert_eq!(height_at(&mesh, 0.0, 0.0, -2.0), DEFAULT_FALLBACK_HEIGHT);
    }
}
