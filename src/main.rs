use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use winit::event_loop::{ControlFlow, EventLoop};

use terrain_viewer::app::{build_terrain, ViewerApp};
use terrain_viewer::config::load_settings;
use terrain_viewer::utils::logging::{init_logging, log_system_info};

fn main() -> anyhow::Result<()> {
    init_logging();
    log_system_info();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = load_settings(config_path.as_deref()).context("loading settings")?;

    // Geometry is ready before any window or GPU resource exists.
    let terrain = build_terrain(&settings.terrain)?;

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(settings, terrain);
    event_loop.run_app(&mut app).context("running event loop")?;

    if let Some(err) = app.take_error() {
        return Err(err);
    }
    info!("Exiting cleanly");
    Ok(())
}
