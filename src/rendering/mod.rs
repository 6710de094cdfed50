pub mod camera;
pub mod camera_uniform;
pub mod engine;
pub mod light;

pub use engine::{RenderEngine, RenderError};
