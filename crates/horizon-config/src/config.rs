//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Renderer settings.
    pub render: RenderConfig,
    /// Initial sky parameters.
    pub sky: SkyConfig,
    /// Scene content settings.
    pub scene: SceneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in borderless fullscreen.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Tone mapping operator applied after the sky and mesh passes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToneMappingMode {
    /// Pass HDR values straight through (clamped by the surface).
    None,
    /// Multiply by exposure only.
    Linear,
    /// ACES filmic curve.
    #[default]
    AcesFilmic,
}

/// Renderer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Output pixels per logical pixel. `0.0` follows the display scale factor.
    pub pixel_ratio: f64,
    /// Tone mapping operator.
    pub tone_mapping: ToneMappingMode,
}

/// Sky parameters used at start-up. Field ranges match the debug panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Sun elevation above the horizon, degrees.
    pub elevation: f32,
    /// Sun azimuth, degrees.
    pub azimuth: f32,
    /// Tone mapping exposure in `[0, 1]`.
    pub exposure: f32,
    /// Keep turbidity, rayleigh and both Mie terms at their built-in values
    /// regardless of panel edits.
    pub pin_scattering: bool,
}

/// Scene content configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// glTF/GLB model inserted once it loads.
    pub model_path: PathBuf,
    /// Spin the decorative box every frame.
    pub animate_box: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the sky parameter panel on start-up.
    pub show_panel: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Horizon".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 0.0,
            tone_mapping: ToneMappingMode::AcesFilmic,
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            turbidity: 30.0,
            rayleigh: 1.492,
            mie_coefficient: 0.001,
            mie_directional_g: 0.705,
            elevation: 10.3,
            azimuth: 153.4,
            exposure: 1.0,
            pin_scattering: false,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets").join("M-Logo.glb"),
            animate_box: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_panel: false,
            log_level: "info".to_string(),
        }
    }
}

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

impl Config {
    /// Path of `config.ron` inside `config_dir`.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Read and validate `config.ron` from `config_dir`, writing the defaults
    /// there first if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(config_dir);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }
        let config = Self::read_from(&path)?;
        log::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Write `config.ron` (pretty RON), creating `config_dir` if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .struct_names(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(Self::path_in(config_dir), text).map_err(ConfigError::WriteError)
    }

    /// Re-read `config.ron`. `Ok(None)` means the file matches `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read_from(&Self::path_in(config_dir))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Config changed on disk");
        Ok(Some(fresh))
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Self = ron::from_str(&text).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce a degenerate window or renderer.
    ///
    /// Sky values are not checked here; the panel owns their ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window",
                reason: format!(
                    "size must be non-zero, got {}x{}",
                    self.window.width, self.window.height
                ),
            });
        }
        if !self.render.pixel_ratio.is_finite() || self.render.pixel_ratio < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "render.pixel_ratio",
                reason: format!("expected 0 or a positive ratio, got {}", self.render.pixel_ratio),
            });
        }
        if self.scene.model_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scene.model_path",
                reason: "path is empty".to_string(),
            });
        }
        Ok(())
    }
}
