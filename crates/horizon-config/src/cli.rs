//! Command-line argument parsing for Horizon.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, ConfigError};

/// Horizon command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "horizon", about = "Atmospheric sky scene viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Output pixels per logical pixel (0 follows the display).
    #[arg(long)]
    pub pixel_ratio: Option<f64>,

    /// Path to the glTF/GLB model.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Show the sky parameter panel on start-up.
    #[arg(long)]
    pub show_panel: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render this many frames without a window, then exit.
    #[arg(long)]
    pub headless_frames: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(ratio) = args.pixel_ratio {
            self.render.pixel_ratio = ratio;
        }
        if let Some(ref model) = args.model {
            self.scene.model_path = model.clone();
        }
        if let Some(show) = args.show_panel {
            self.debug.show_panel = show;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }

    /// A copy of `self` with `args` applied, validated.
    ///
    /// `self` stays the file's view of the settings, which is what
    /// [`Config::reload`] must compare against.
    pub fn with_cli_overrides(&self, args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        config.apply_cli_overrides(args);
        config.validate()?;
        Ok(config)
    }
}
