//! Per-frame scene state: the first-person camera, view toggles and a shared
//! handle to the terrain used for collision.
//!
//! [`Scene::update`] is the only place this state changes. It runs once per
//! frame on the render thread with that frame's [`InputSnapshot`].

use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, info};

use crate::config::settings::CameraSettings;
use crate::input::InputSnapshot;
use crate::world::collision::{HeightQuery, OutOfBounds};
use crate::world::terrain::TerrainMesh;

const MAX_PITCH_DEGREES: f32 = 89.0;
/// Longest time step applied in one update, in seconds.
const MAX_FRAME_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    /// Radians around +Y, 0 looks down +X.
    pub yaw: f32,
    /// Radians, positive looks up.
    pub pitch: f32,
}

impl CameraState {
    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Horizontal walking direction.
    fn walk_forward(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    fn walk_right(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos())
    }
}

pub struct Scene {
    camera: CameraState,
    terrain: Arc<TerrainMesh>,
    out_of_bounds: OutOfBounds,
    controls: CameraSettings,
    wireframe: bool,
    quit_requested: bool,
}

impl Scene {
    pub fn new(
        terrain: Arc<TerrainMesh>,
        controls: CameraSettings,
        out_of_bounds: OutOfBounds,
        wireframe: bool,
    ) -> Self {
        let camera = CameraState {
            position: Vec3::from(controls.start_position),
            yaw: controls.yaw_degrees.to_radians(),
            pitch: controls
                .pitch_degrees
                .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES)
                .to_radians(),
        };
        let mut scene = Self {
            camera,
            terrain,
            out_of_bounds,
            controls,
            wireframe,
            quit_requested: false,
        };
        scene.clamp_to_ground();
        info!("Camera starts at {:?}", scene.camera.position);
        scene
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn terrain(&self) -> &Arc<TerrainMesh> {
        &self.terrain
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn height_query(&self) -> HeightQuery<'_> {
        HeightQuery::new(&self.terrain, self.out_of_bounds)
    }

    /// Lowest eye height allowed at `(x, z)`.
    pub fn floor_at(&self, x: f32, z: f32) -> f32 {
        self.height_query().height_at(x, z) + self.controls.eye_height
    }

    pub fn update(&mut self, input: &InputSnapshot, dt: f32) {
        if input.quit {
            self.quit_requested = true;
        }
        if input.toggle_wireframe {
            self.wireframe = !self.wireframe;
            debug!("Wireframe {}", if self.wireframe { "on" } else { "off" });
        }

        let (dx, dy) = input.look_delta;
        let sensitivity = self.controls.mouse_sensitivity.to_radians();
        let max_pitch = MAX_PITCH_DEGREES.to_radians();
        self.camera.yaw += dx * sensitivity;
        self.camera.pitch = (self.camera.pitch - dy * sensitivity).clamp(-max_pitch, max_pitch);

        let axis = |positive: bool, negative: bool| positive as i32 as f32 - negative as i32 as f32;
        let mut speed = self.controls.move_speed * dt.clamp(0.0, MAX_FRAME_STEP);
        if input.sprint {
            speed *= self.controls.sprint_multiplier;
        }
        let step = (self.camera.walk_forward() * axis(input.forward, input.back)
            + self.camera.walk_right() * axis(input.right, input.left))
            .normalize_or_zero()
            * speed
            + Vec3::Y * axis(input.up, input.down) * speed;

        // One axis at a time, each checked against the ground.
        self.camera.position.x += step.x;
        self.clamp_to_ground();
        self.camera.position.z += step.z;
        self.clamp_to_ground();
        self.camera.position.y += step.y;
        self.clamp_to_ground();
    }

    fn clamp_to_ground(&mut self) {
        let floor = self.floor_at(self.camera.position.x, self.camera.position.z);
        if self.camera.position.y < floor {
            self.camera.position.y = floor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::heightmap::HeightmapImage;
    use crate::world::terrain::TerrainParams;
    use approx::assert_abs_diff_eq;

    /// 20x20 world, ground rising linearly from 0 at x = -10 to 10 at x = 10.
    fn slope() -> Arc<TerrainMesh> {
        let data: Vec<u8> = (0..3).flat_map(|_| [0u8, 255 / 2, 255]).collect();
        let image = HeightmapImage::from_raw(3, 3, data).unwrap();
        let params = TerrainParams {
            stride: 1,
            world_extent: 20.0,
            height_scale: 10.0,
        };
        Arc::new(TerrainMesh::build(&image, &params).unwrap())
    }

    fn controls() -> CameraSettings {
        CameraSettings {
            start_position: [0.0, 50.0, 0.0],
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            move_speed: 10.0,
            sprint_multiplier: 2.0,
            eye_height: 1.5,
            ..CameraSettings::default()
        }
    }

    #[test]
    fn test_start_position_is_lifted_above_ground() {
        let mut start = controls();
        start.start_position = [-10.0, -100.0, 0.0];
        let scene = Scene::new(slope(), start, OutOfBounds::default(), false);
        assert_abs_diff_eq!(scene.camera().position.y, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_descending_stops_at_eye_height() {
        let mut scene = Scene::new(slope(), controls(), OutOfBounds::default(), false);
        let input = InputSnapshot {
            down: true,
            ..InputSnapshot::default()
        };
        for _ in 0..200 {
            scene.update(&input, 0.1);
            let p = scene.camera().position;
            assert!(p.y >= scene.floor_at(p.x, p.z) - 1e-5);
        }
        let p = scene.camera().position;
        assert_abs_diff_eq!(p.y, scene.floor_at(p.x, p.z), epsilon = 1e-4);
    }

    #[test]
    fn test_walking_uphill_raises_camera() {
        let mut start = controls();
        start.start_position = [-9.0, 0.0, 0.0];
        let mut scene = Scene::new(slope(), start, OutOfBounds::default(), false);
        let before = scene.camera().position;

        // Yaw 0 walks along +X, up the slope.
        let input = InputSnapshot {
            forward: true,
            ..InputSnapshot::default()
        };
        scene.update(&input, 0.1);
        let after = scene.camera().position;

        assert_abs_diff_eq!(after.x - before.x, 1.0, epsilon = 1e-5);
        assert!(after.y > before.y);
        assert_abs_diff_eq!(after.y, scene.floor_at(after.x, after.z), epsilon = 1e-4);
    }

    #[test]
    fn test_sprint_scales_speed() {
        let mut scene = Scene::new(slope(), controls(), OutOfBounds::default(), false);
        let input = InputSnapshot {
            forward: true,
            sprint: true,
            ..InputSnapshot::default()
        };
        scene.update(&input, 0.1);
        assert_abs_diff_eq!(scene.camera().position.x, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_outside_terrain_uses_fallback_floor() {
        let mut start = controls();
        start.start_position = [100.0, -50.0, 100.0];
        let scene = Scene::new(slope(), start, OutOfBounds::Fallback(-3.0), false);
        assert_abs_diff_eq!(scene.camera().position.y, -1.5, epsilon = 1e-5);

        let mut start = controls();
        start.start_position = [100.0, -50.0, 100.0];
        let scene = Scene::new(slope(), start, OutOfBounds::Unclamped, false);
        assert_eq!(scene.camera().position.y, -50.0);
    }

    #[test]
    fn test_look_clamps_pitch() {
        let mut scene = Scene::new(slope(), controls(), OutOfBounds::default(), false);
        let input = InputSnapshot {
            look_delta: (0.0, -100_000.0),
            ..InputSnapshot::default()
        };
        scene.update(&input, 0.016);
        assert_abs_diff_eq!(
            scene.camera().pitch,
            MAX_PITCH_DEGREES.to_radians(),
            epsilon = 1e-6
        );
        assert!(scene.camera().front().y > 0.99);
    }

    #[test]
    fn test_toggles() {
        let mut scene = Scene::new(slope(), controls(), OutOfBounds::default(), false);
        let toggle = InputSnapshot {
            toggle_wireframe: true,
            ..InputSnapshot::default()
        };
        scene.update(&toggle, 0.016);
        assert!(scene.wireframe());
        scene.update(&InputSnapshot::default(), 0.016);
        assert!(scene.wireframe());
        scene.update(&toggle, 0.016);
        assert!(!scene.wireframe());

        assert!(!scene.quit_requested());
        let quit = InputSnapshot {
            quit: true,
            ..InputSnapshot::default()
        };
        scene.update(&quit, 0.016);
        assert!(scene.quit_requested());
    }
}
