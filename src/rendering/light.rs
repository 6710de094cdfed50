use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::settings::RenderingSettings;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightUniform {
    /// Direction the light travels, normalized.
    pub direction: [f32; 3],
    // Due to uniforms requiring 16 byte alignment, we need to add some padding.
    pub _padding: u32,
    pub color: [f32; 3],
    pub _padding2: u32,
    pub sky_zenith: [f32; 4],
    pub sky_horizon: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct Light {
    pub direction: Vec3,
    pub color: Vec3,
    pub sky_zenith: Vec3,
    pub sky_horizon: Vec3,
}

impl Light {
    pub fn from_settings(settings: &RenderingSettings) -> Self {
        let direction = Vec3::from(settings.sun_direction).try_normalize().unwrap_or(Vec3::NEG_Y);
        Self {
            direction,
            color: Vec3::from(settings.sun_color),
            sky_zenith: Vec3::from(settings.sky_zenith_color),
            sky_horizon: Vec3::from(settings.sky_horizon_color),
        }
    }

    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            direction: self.direction.into(),
            _padding: 0,
            color: self.color.into(),
            _padding2: 0,
            sky_zenith: self.sky_zenith.extend(1.0).into(),
            sky_horizon: self.sky_horizon.extend(1.0).into(),
        }
    }
}
