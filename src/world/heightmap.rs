//! Decoded grayscale heightmap and point sampling.
//!
//! The terrain builder only ever sees a [`HeightmapImage`]: a single-channel
//! `u8` buffer in row-major order. File I/O and format decoding stop here.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum HeightmapError {
    #[error("Failed to load heightmap {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Heightmap has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("Heightmap buffer holds {actual} samples, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Which corner of the source image becomes row 0 of the heightmap.
///
/// Image files store the top row first. `BottomLeft` flips the rows on load so
/// row 0 is the bottom of the picture, matching a GL-style texture origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    TopLeft,
    #[default]
    BottomLeft,
}

/// Immutable 8-bit grayscale heightmap, `index = y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightmapImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl HeightmapImage {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, HeightmapError> {
        if width == 0 || height == 0 {
            return Err(HeightmapError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(HeightmapError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn from_luma(mut image: GrayImage, origin: ImageOrigin) -> Result<Self, HeightmapError> {
        if origin == ImageOrigin::BottomLeft {
            image::imageops::flip_vertical_in_place(&mut image);
        }
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }

    /// Converts any decoded image to 8-bit luma. Colour inputs are reduced to
    /// their luminance, wider bit depths are truncated to 8 bits.
    pub fn from_dynamic(image: DynamicImage, origin: ImageOrigin) -> Result<Self, HeightmapError> {
        Self::from_luma(image.into_luma8(), origin)
    }

    pub fn from_bytes(bytes: &[u8], origin: ImageOrigin) -> Result<Self, HeightmapError> {
        let image = image::load_from_memory(bytes).map_err(|source| HeightmapError::Decode {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        Self::from_dynamic(image, origin)
    }

    pub fn load(path: impl AsRef<Path>, origin: ImageOrigin) -> Result<Self, HeightmapError> {
        let path = path.as_ref();
        debug!("Decoding heightmap {:?} (origin {:?})", path, origin);
        let image = image::open(path).map_err(|source| HeightmapError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let heightmap = Self::from_dynamic(image, origin)?;
        info!(
            "Loaded heightmap {:?}: {} x {}",
            path, heightmap.width, heightmap.height
        );
        Ok(heightmap)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Brightness at `(x, y)`. Both coordinates must already be in range.
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.width && y < self.height, "sample ({x}, {y}) outside heightmap");
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Brightness at `(x, y)` with both coordinates clamped to the image.
    pub fn sample_clamped(&self, x: i64, y: i64) -> u8 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.sample(x, y)
    }

    /// Logs the first, centre and last pixel. Handy for spotting an inverted
    /// or blank export before the mesh is built.
    pub fn log_corner_samples(&self) {
        let probes = [
            (0, 0),
            (self.width / 2, self.height / 2),
            (self.width - 1, self.height - 1),
        ];
        for (x, y) in probes {
            info!("  pixel({}, {}) = {}", x, y, self.sample(x, y));
        }
    }
}
