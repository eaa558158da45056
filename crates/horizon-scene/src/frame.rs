//! Per-frame animation and rendering.
//!
//! The driver is cooperative: the host calls [`FrameDriver::tick`] once per
//! display refresh. A cloneable [`StopToken`] ends the loop from anywhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::Vec3;
use tracing::{debug, warn};

use crate::context::SceneContext;
use crate::renderer::Renderer;

/// Box rotation added on every frame, radians per axis.
pub const BOX_ROTATION_STEP: Vec3 = Vec3::new(0.001, 0.001, 0.01);

/// Frame gaps longer than this are reported as slow.
pub const SLOW_FRAME_THRESHOLD: Duration = Duration::from_millis(250);

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    Stopped,
}

/// Counters kept across ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub slow_frames: u64,
    pub longest_gap: Duration,
}

/// Rotates the box and renders, once per tick.
#[derive(Debug)]
pub struct FrameDriver {
    stop: StopToken,
    previous: Option<Instant>,
    stats: FrameStats,
}

impl FrameDriver {
    pub fn new(stop: StopToken) -> Self {
        Self {
            stop,
            previous: None,
            stats: FrameStats::default(),
        }
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Run one frame: advance the box rotation, then render.
    pub fn tick<R: Renderer>(&mut self, context: &mut SceneContext<R>) -> FrameOutcome {
        self.tick_at(context, Instant::now())
    }

    fn tick_at<R: Renderer>(&mut self, context: &mut SceneContext<R>, now: Instant) -> FrameOutcome {
        if self.stop.is_cancelled() {
            return FrameOutcome::Stopped;
        }

        if let Some(previous) = self.previous {
            let gap = now.saturating_duration_since(previous);
            if gap > self.stats.longest_gap {
                self.stats.longest_gap = gap;
            }
            if gap > SLOW_FRAME_THRESHOLD {
                self.stats.slow_frames += 1;
                warn!(
                    "Frame gap {:.1}ms exceeds {:.1}ms",
                    gap.as_secs_f64() * 1000.0,
                    SLOW_FRAME_THRESHOLD.as_secs_f64() * 1000.0
                );
            }
        }
        self.previous = Some(now);

        if context.animates_box() {
            context.rotate_box(BOX_ROTATION_STEP);
        }
        context.render();
        self.stats.frames += 1;
        FrameOutcome::Rendered
    }

    /// Tick up to `frames` times. Returns how many frames were rendered.
    pub fn run_frames<R: Renderer>(&mut self, context: &mut SceneContext<R>, frames: u64) -> u64 {
        let mut rendered = 0;
        for _ in 0..frames {
            if self.tick(context) == FrameOutcome::Stopped {
                break;
            }
            rendered += 1;
        }
        debug!(rendered, total = self.stats.frames, "frame run finished");
        rendered
    }
}
