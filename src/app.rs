use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::settings::{TerrainSettings, ViewerSettings};
use crate::input::InputCollector;
use crate::rendering::engine::RenderEngine;
use crate::world::heightmap::HeightmapImage;
use crate::world::scene::Scene;
use crate::world::terrain::TerrainMesh;

/// Loads the heightmap and builds the terrain mesh. The decoded image is
/// dropped before returning; only the mesh is kept.
pub fn build_terrain(settings: &TerrainSettings) -> anyhow::Result<Arc<TerrainMesh>> {
    let heightmap = HeightmapImage::load(&settings.heightmap_path, settings.image_origin())
        .with_context(|| format!("loading heightmap {}", settings.heightmap_path.display()))?;
    heightmap.log_corner_samples();

    let mesh = TerrainMesh::build(&heightmap, &settings.mesh_params())
        .context("building terrain mesh")?;
    mesh.log_stats();
    Ok(Arc::new(mesh))
}

pub struct ViewerApp {
    settings: ViewerSettings,
    scene: Scene,
    input: InputCollector,
    window: Option<Arc<Window>>,
    renderer: Option<RenderEngine>,
    cursor_captured: bool,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    pub fn new(settings: ViewerSettings, terrain: Arc<TerrainMesh>) -> Self {
        let scene = Scene::new(
            terrain,
            settings.camera.clone(),
            settings.terrain.out_of_bounds,
            settings.rendering.wireframe,
        );
        Self {
            settings,
            scene,
            input: InputCollector::new(),
            window: None,
            renderer: None,
            cursor_captured: false,
            last_frame: Instant::now(),
            error: None,
        }
    }

    /// Error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if captured {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                warn!("Cursor grab unavailable: {}", e);
                return;
            }
        } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            warn!("Failed to release cursor: {}", e);
        }
        window.set_cursor_visible(!captured);
        self.cursor_captured = captured;
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let mut snapshot = self.input.snapshot();
        if !self.cursor_captured {
            snapshot.look_delta = (0.0, 0.0);
        }
        self.scene.update(&snapshot, dt);

        if self.scene.quit_requested() {
            info!("Quit requested");
            event_loop.exit();
            return;
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.update_camera(self.scene.camera());
        if let Err(e) = renderer.render_frame(self.scene.wireframe()) {
            self.fail(event_loop, e.into());
            return;
        }
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.settings.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window.width,
                self.settings.window.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("creating window"));
                return;
            }
        };

        let renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            self.scene.terrain(),
            &self.settings,
        ));
        match renderer {
            Ok(renderer) => {
                info!("Render engine ready, click the window to capture the mouse");
                if !renderer.supports_wireframe() {
                    warn!("Adapter lacks line polygon mode, wireframe toggle draws filled terrain");
                }
                self.renderer = Some(renderer);
                self.window = Some(window.clone());
                self.last_frame = Instant::now();
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("initializing renderer")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map_or(true, |w| w.id() != window_id) {
            return;
        }

        if self.input.process_events(&event) {
            if self.input.take_capture_request() && !self.cursor_captured {
                self.set_cursor_captured(true);
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::Focused(false) if self.cursor_captured => {
                self.set_cursor_captured(false);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.cursor_captured {
                self.input.mouse_motion(delta.0, delta.1);
            }
        }
    }
}
