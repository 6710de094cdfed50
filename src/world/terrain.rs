//! Heightmap to terrain mesh conversion.
//!
//! The heightmap is subsampled every `stride` pixels into a regular grid which
//! is stretched over a square of side `world_extent` centred on the origin.
//! The resulting [`TerrainMesh`] is the single source of geometry for both the
//! renderer and the collision queries in [`crate::world::collision`].

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::world::heightmap::HeightmapImage;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    #[error("Stride must be at least 1")]
    InvalidStride,

    #[error(
        "Heightmap {width}x{height} with stride {stride} gives a {grid_width}x{grid_height} grid, at least 2x2 is required"
    )]
    DegenerateGrid {
        width: u32,
        height: u32,
        stride: u32,
        grid_width: usize,
        grid_height: usize,
    },

    #[error("World extent must be a positive finite number, got {0}")]
    InvalidExtent(f32),

    #[error("Terrain grid of {vertices} vertices cannot be addressed with 32-bit indices")]
    TooManyVertices { vertices: usize },
}

/// Interleaved vertex as uploaded to the GPU: position@0, normal@1, uv@2.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Pixels between neighbouring grid vertices.
    pub stride: u32,
    /// Side length of the square the grid is mapped onto.
    pub world_extent: f32,
    /// World height of a white (255) pixel.
    pub height_scale: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            stride: 8,
            world_extent: 60.0,
            height_scale: 8.0,
        }
    }
}

impl TerrainParams {
    /// Grid dimensions for an image of `width` x `height` pixels.
    pub fn grid_dimensions(&self, width: u32, height: u32) -> Result<(usize, usize), TerrainError> {
        if self.stride == 0 {
            return Err(TerrainError::InvalidStride);
        }
        let grid_width = (width / self.stride) as usize;
        let grid_height = (height / self.stride) as usize;
        if grid_width < 2 || grid_height < 2 {
            return Err(TerrainError::DegenerateGrid {
                width,
                height,
                stride: self.stride,
                grid_width,
                grid_height,
            });
        }
        Ok((grid_width, grid_height))
    }
}

/// Immutable terrain grid. Vertices are row-major: `vertices[j * grid_width + i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
    grid_width: usize,
    grid_height: usize,
    world_extent: f32,
}

impl TerrainMesh {
    pub fn build(image: &HeightmapImage, params: &TerrainParams) -> Result<Self, TerrainError> {
        if !(params.world_extent.is_finite() && params.world_extent > 0.0) {
            return Err(TerrainError::InvalidExtent(params.world_extent));
        }
        let (grid_width, grid_height) = params.grid_dimensions(image.width(), image.height())?;
        let vertex_count = grid_width * grid_height;
        if vertex_count > u32::MAX as usize {
            return Err(TerrainError::TooManyVertices { vertices: vertex_count });
        }

        debug!(
            "Building terrain grid {}x{} (stride {}, extent {}, height scale {})",
            grid_width, grid_height, params.stride, params.world_extent, params.height_scale
        );

        let stride = params.stride;
        let mut heights = Vec::with_capacity(vertex_count);
        for j in 0..grid_height {
            for i in 0..grid_width {
                let brightness = image.sample(i as u32 * stride, j as u32 * stride);
                heights.push(brightness as f32 / 255.0 * params.height_scale);
            }
        }

        let extent = params.world_extent;
        let half = extent * 0.5;
        let last_i = (grid_width - 1) as f32;
        let last_j = (grid_height - 1) as f32;
        let height_at = |i: usize, j: usize| heights[j * grid_width + i];

        let mut vertices = Vec::with_capacity(vertex_count);
        for j in 0..grid_height {
            for i in 0..grid_width {
                let u = i as f32 / last_i;
                let v = j as f32 / last_j;

                // Missing neighbours at the border fall back to the vertex itself.
                let left = height_at(i.saturating_sub(1), j);
                let right = height_at((i + 1).min(grid_width - 1), j);
                let up = height_at(i, j.saturating_sub(1));
                let down = height_at(i, (j + 1).min(grid_height - 1));

                let tangent_x = Vec3::new(2.0, right - left, 0.0);
                let tangent_z = Vec3::new(0.0, down - up, 2.0);
                let normal = tangent_z.cross(tangent_x).normalize();

                vertices.push(TerrainVertex {
                    position: [u * extent - half, height_at(i, j), v * extent - half],
                    normal: normal.to_array(),
                    uv: [u, v],
                });
            }
        }

        let indices = grid_indices(grid_width, grid_height);

        Ok(Self {
            vertices,
            indices,
            grid_width,
            grid_height,
            world_extent: extent,
        })
    }

    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn grid_width(&self) -> usize {
        self.grid_width
    }

    pub fn grid_height(&self) -> usize {
        self.grid_height
    }

    pub fn world_extent(&self) -> f32 {
        self.world_extent
    }

    /// Vertex at grid column `i`, row `j`.
    pub fn vertex(&self, i: usize, j: usize) -> &TerrainVertex {
        &self.vertices[j * self.grid_width + i]
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Lowest and highest vertex `y`.
    pub fn height_range(&self) -> (f32, f32) {
        self.vertices
            .iter()
            .map(|v| v.position[1])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)))
    }

    pub fn log_stats(&self) {
        let (lo, hi) = self.height_range();
        info!("Terrain grid: {} x {}", self.grid_width, self.grid_height);
        info!("Terrain vertices: {}", self.vertices.len());
        info!("Terrain triangles: {}", self.triangle_count());
        info!("Terrain height range: {:.3} .. {:.3}", lo, hi);
    }
}

/// Two triangles per cell, counter-clockwise seen from +Y:
///
/// ```text
///   tl──tr
///   │ ╱ │   (tl, bl, tr) and (tr, bl, br)
///   bl──br
/// ```
fn grid_indices(grid_width: usize, grid_height: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity((grid_width - 1) * (grid_height - 1) * 6);
    for j in 0..grid_height - 1 {
        for i in 0..grid_width - 1 {
            let top_left = (j * grid_width + i) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((j + 1) * grid_width + i) as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }
    indices
}
