//! Windowless runs for CI and smoke tests.
//!
//! Builds the same scene as the windowed app against a
//! [`HeadlessRenderer`], waits for the model, then ticks a fixed number of
//! frames.

use std::thread;
use std::time::{Duration, Instant};

use horizon_config::Config;
use horizon_scene::{
    AssetLoader, FrameDriver, FrameStats, GltfLoader, HeadlessRenderer, SceneAssembler,
    SceneContext, StopToken,
};
use tracing::{info, instrument, warn};

use crate::settings::scene_settings;

/// How long a headless run waits for the model before rendering without it.
pub const MODEL_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Outcome of [`run_headless`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessSummary {
    /// Frames ticked by the driver, excluding the one rendered at assembly.
    pub frames: u64,
    pub model_loaded: bool,
    pub stats: FrameStats,
}

/// Render `frames` frames of the configured scene without a window.
pub fn run_headless(config: &Config, frames: u64) -> HeadlessSummary {
    run_headless_with(config, frames, &GltfLoader::new(), MODEL_LOAD_TIMEOUT)
}

#[instrument(skip(config, loader))]
pub fn run_headless_with(
    config: &Config,
    frames: u64,
    loader: &dyn AssetLoader,
    timeout: Duration,
) -> HeadlessSummary {
    let settings = scene_settings(config, 1.0);
    let viewport = (config.window.width, config.window.height);
    let mut context = SceneAssembler::build_scene(&settings, HeadlessRenderer::new(), viewport);

    context.request_model(loader, &config.scene.model_path);
    wait_for_model(&mut context, timeout);

    let mut driver = FrameDriver::new(StopToken::new());
    let rendered = driver.run_frames(&mut context, frames);
    let stats = driver.stats();
    let model_loaded = context.handles().model.is_some();

    info!(
        frames = rendered,
        slow_frames = stats.slow_frames,
        longest_gap_ms = stats.longest_gap.as_secs_f64() * 1000.0,
        model_loaded,
        total_renders = context.renderer().frames_rendered(),
        "headless run finished"
    );

    HeadlessSummary {
        frames: rendered,
        model_loaded,
        stats,
    }
}

fn wait_for_model(context: &mut SceneContext<HeadlessRenderer>, timeout: Duration) {
    let start = Instant::now();
    loop {
        context.poll_model_load();
        if !context.model_pending() {
            return;
        }
        if start.elapsed() >= timeout {
            warn!("model still loading after {:?}, rendering without it", timeout);
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
