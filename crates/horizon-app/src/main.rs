//! The `horizon` binary.

use clap::Parser;
use horizon_config::{CliArgs, Config};
use tracing::info;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .expect("Failed to resolve config directory")
            .join("horizon")
    });

    let file_config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let config = file_config.with_cli_overrides(&args).unwrap_or_else(|e| {
        eprintln!("Ignoring command-line overrides: {e}");
        file_config.clone()
    });

    let log_dir = config_dir.join("logs");
    horizon_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        "Horizon {}x{} | model: {}",
        config.window.width,
        config.window.height,
        config.scene.model_path.display()
    );

    if let Some(frames) = args.headless_frames {
        let summary = horizon_app::headless::run_headless(&config, frames);
        info!(?summary, "headless summary");
        return;
    }

    horizon_app::app::run(file_config, args, config_dir);
}
