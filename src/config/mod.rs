pub mod settings;

// Re-export commonly used types
pub use settings::{
    CameraSettings, RenderingSettings, SettingsError, TerrainSettings, ViewerSettings,
    WindowSettings, load_settings, load_settings_from, parse_settings, save_settings,
    settings_path,
};
