pub mod collision;
pub mod heightmap;
pub mod scene;
pub mod terrain;

// Re-export the terrain pipeline types for easier access
pub use collision::{DEFAULT_FALLBACK_HEIGHT, HeightQuery, OutOfBounds, bilinear, height_at};
pub use heightmap::{HeightmapError, HeightmapImage, ImageOrigin};
pub use scene::{CameraState, Scene};
pub use terrain::{TerrainError, TerrainMesh, TerrainParams, TerrainVertex};
