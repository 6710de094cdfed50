// Terrain Viewer: heightmap terrain with a first-person camera

pub mod utils;
pub mod config;
pub mod input;
pub mod app;

pub mod rendering;
pub mod assets;
pub mod world;

// Re-export commonly used types for convenience
pub use config::{ViewerSettings, load_settings};
pub use world::{HeightmapImage, Scene, TerrainMesh, TerrainParams, TerrainVertex};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
