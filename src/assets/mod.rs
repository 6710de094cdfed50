pub mod mesh;
pub mod texture;

pub use mesh::Mesh;
pub use texture::{Texture, TextureError};
