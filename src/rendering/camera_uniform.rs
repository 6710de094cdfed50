use bytemuck::{Pod, Zeroable};

use crate::rendering::camera::Camera;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Used by the sky pass to recover view rays.
    pub inv_view_proj: [[f32; 4]; 4],
    /// xyz = eye position, w unused.
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        let view_proj = camera.build_view_projection_matrix();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            eye: camera.eye.extend(1.0).to_array(),
        }
    }
}
