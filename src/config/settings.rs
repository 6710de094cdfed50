use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::world::collision::OutOfBounds;
use crate::world::heightmap::ImageOrigin;
use crate::world::terrain::TerrainParams;

const CONFIG_FILE: &str = "viewer.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write settings {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// =============================================================================
// Settings sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub heightmap_path: PathBuf,
    /// Optional colour texture stretched over the terrain via its UVs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_path: Option<PathBuf>,
    pub stride: u32,
    pub world_extent: f32,
    pub height_scale: f32,
    /// Flip image rows on load so row 0 is the bottom of the picture.
    pub flip_vertical: bool,
    pub out_of_bounds: OutOfBounds,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        let params = TerrainParams::default();
        Self {
            heightmap_path: PathBuf::from("assets/heightmap.png"),
            texture_path: None,
            stride: params.stride,
            world_extent: params.world_extent,
            height_scale: params.height_scale,
            flip_vertical: true,
            out_of_bounds: OutOfBounds::default(),
        }
    }
}

impl TerrainSettings {
    pub fn mesh_params(&self) -> TerrainParams {
        TerrainParams {
            stride: self.stride,
            world_extent: self.world_extent,
            height_scale: self.height_scale,
        }
    }

    pub fn image_origin(&self) -> ImageOrigin {
        if self.flip_vertical {
            ImageOrigin::BottomLeft
        } else {
            ImageOrigin::TopLeft
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub start_position: [f32; 3],
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// World units per second.
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Minimum distance kept between the eye and the ground.
    pub eye_height: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            start_position: [0.0, 12.0, 28.0],
            yaw_degrees: -90.0,
            pitch_degrees: -15.0,
            fov_y_degrees: 60.0,
            z_near: 0.1,
            z_far: 500.0,
            move_speed: 10.0,
            sprint_multiplier: 3.0,
            mouse_sensitivity: 0.1,
            eye_height: 1.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Terrain Viewer".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingSettings {
    pub vsync: bool,
    /// Start with the terrain drawn as lines.
    pub wireframe: bool,
    pub sky_zenith_color: [f32; 3],
    pub sky_horizon_color: [f32; 3],
    /// Direction the sunlight travels, normalised on upload.
    pub sun_direction: [f32; 3],
    pub sun_color: [f32; 3],
}

impl Default for RenderingSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            wireframe: false,
            sky_zenith_color: [0.18, 0.36, 0.68],
            sky_horizon_color: [0.72, 0.82, 0.92],
            sun_direction: [-0.4, -1.0, -0.3],
            sun_color: [1.0, 0.96, 0.88],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub terrain: TerrainSettings,
    pub camera: CameraSettings,
    pub window: WindowSettings,
    pub rendering: RenderingSettings,
}

impl ViewerSettings {
    /// Rejects values that would only fail later, after the window is up.
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {}", value),
                })
            }
        }

        if self.terrain.stride == 0 {
            return Err(SettingsError::Invalid {
                field: "terrain.stride",
                reason: "must be at least 1".to_string(),
            });
        }
        positive("terrain.world_extent", self.terrain.world_extent)?;
        if !self.terrain.height_scale.is_finite() {
            return Err(SettingsError::Invalid {
                field: "terrain.height_scale",
                reason: format!("must be finite, got {}", self.terrain.height_scale),
            });
        }
        positive("camera.fov_y_degrees", self.camera.fov_y_degrees)?;
        positive("camera.z_near", self.camera.z_near)?;
        positive("camera.move_speed", self.camera.move_speed)?;
        positive("camera.sprint_multiplier", self.camera.sprint_multiplier)?;
        positive("camera.mouse_sensitivity", self.camera.mouse_sensitivity)?;
        if self.camera.z_far <= self.camera.z_near {
            return Err(SettingsError::Invalid {
                field: "camera.z_far",
                reason: format!("must exceed z_near ({})", self.camera.z_near),
            });
        }
        if self.camera.eye_height < 0.0 {
            return Err(SettingsError::Invalid {
                field: "camera.eye_height",
                reason: format!("must not be negative, got {}", self.camera.eye_height),
            });
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(SettingsError::Invalid {
                field: "window",
                reason: format!("size {}x{} is empty", self.window.width, self.window.height),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Settings file management
// =============================================================================

pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "terrain-viewer", "terrain-viewer")
        .map(|proj| proj.config_dir().join(CONFIG_FILE))
}

pub fn parse_settings(text: &str) -> Result<ViewerSettings, SettingsError> {
    let settings: ViewerSettings = toml::from_str(text)?;
    settings.validate()?;
    Ok(settings)
}

pub fn load_settings_from(path: &Path) -> Result<ViewerSettings, SettingsError> {
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_settings(&text)?;
    info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Loads `path` if given. Otherwise tries the per-user settings file and falls
/// back to defaults when there is none.
pub fn load_settings(path: Option<&Path>) -> Result<ViewerSettings, SettingsError> {
    if let Some(path) = path {
        return load_settings_from(path);
    }
    match settings_path() {
        Some(path) if path.is_file() => load_settings_from(&path),
        other => {
            debug!("No settings file at {:?}, using defaults", other);
            Ok(ViewerSettings::default())
        }
    }
}

pub fn save_settings(settings: &ViewerSettings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let toml = toml::to_string_pretty(settings)?;
    fs::write(path, toml).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
