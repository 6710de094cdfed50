use glam::{Mat4, Vec3};

use crate::config::settings::CameraSettings;
use crate::world::scene::CameraState;

/// Projection parameters plus the current eye pose.
#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            eye: Vec3::from(settings.start_position),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            aspect,
            fovy: settings.fov_y_degrees,
            znear: settings.z_near,
            zfar: settings.z_far,
        }
    }

    pub fn sync(&mut self, state: &CameraState) {
        self.eye = state.position;
        self.front = state.front();
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.eye, self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy.to_radians(), self.aspect, self.znear, self.zfar)
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    fn camera() -> Camera {
        Camera::new(&CameraSettings::default(), 16.0 / 9.0)
    }

    #[test]
    fn test_point_ahead_projects_to_screen_centre() {
        let mut cam = camera();
        cam.sync(&CameraState {
            position: Vec3::new(0.0, 5.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
        });

        let clip = cam.build_view_projection_matrix() * Vec4::new(10.0, 5.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_point_behind_is_clipped() {
        let mut cam = camera();
        cam.sync(&CameraState {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        });
        let clip = cam.build_view_projection_matrix() * Vec4::new(-10.0, 0.0, 0.0, 1.0);
        assert!(clip.w < 0.0);
    }

    #[test]
    fn test_zero_sized_resize_keeps_aspect() {
        let mut cam = camera();
        cam.set_aspect(0, 600);
        assert_relative_eq!(cam.aspect, 16.0 / 9.0);
        cam.set_aspect(800, 400);
        assert_relative_eq!(cam.aspect, 2.0);
    }
}
