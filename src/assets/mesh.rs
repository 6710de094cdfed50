use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages};
use tracing::info;

use crate::world::terrain::{TerrainMesh, TerrainVertex};

/// Terrain geometry resident on the GPU.
pub struct Mesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub num_indices: u32,
}

impl Mesh {
    pub fn from_terrain(device: &wgpu::Device, terrain: &TerrainMesh) -> Self {
        let vertex_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Terrain Vertex Buffer"),
                contents: bytemuck::cast_slice(terrain.vertices()),
                usage: BufferUsages::VERTEX,
            }
        );
        let index_buffer = device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Terrain Index Buffer"),
                contents: bytemuck::cast_slice(terrain.indices()),
                usage: BufferUsages::INDEX,
            }
        );
        let num_indices = terrain.indices().len() as u32;

        info!(
            "Uploaded terrain mesh: {} vertices, {} indices",
            terrain.vertices().len(),
            num_indices
        );

        Self {
            vertex_buffer,
            index_buffer,
            num_indices,
        }
    }
}

impl TerrainVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}
