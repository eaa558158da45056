//! Logical viewport size and pixel ratio, resolved to a drawing-buffer size.
//!
//! Scene code works in logical pixels. The GPU surface and depth buffer are
//! sized in physical pixels: `round(logical * pixel_ratio)`, never below 1.

/// Minimum surface dimension (prevents zero-size panics).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Physical pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

/// Tracks what the scene asked for and what the surface should be.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceTracker {
    logical_width: u32,
    logical_height: u32,
    pixel_ratio: f32,
}

impl SurfaceTracker {
    pub fn new(logical_width: u32, logical_height: u32, pixel_ratio: f32) -> Self {
        let mut tracker = Self {
            logical_width: MIN_SURFACE_DIMENSION,
            logical_height: MIN_SURFACE_DIMENSION,
            pixel_ratio: 1.0,
        };
        tracker.set_logical_size(logical_width, logical_height);
        tracker.set_pixel_ratio(pixel_ratio);
        tracker
    }

    /// Returns the new physical size if it changed.
    pub fn set_logical_size(&mut self, width: u32, height: u32) -> Option<PhysicalSize> {
        let before = self.physical_size();
        self.logical_width = width.max(MIN_SURFACE_DIMENSION);
        self.logical_height = height.max(MIN_SURFACE_DIMENSION);
        self.changed_from(before)
    }

    /// Non-finite or non-positive ratios are ignored.
    pub fn set_pixel_ratio(&mut self, ratio: f32) -> Option<PhysicalSize> {
        if !ratio.is_finite() || ratio <= 0.0 {
            log::warn!("Ignoring invalid pixel ratio {ratio}");
            return None;
        }
        let before = self.physical_size();
        self.pixel_ratio = ratio;
        self.changed_from(before)
    }

    pub fn logical_size(&self) -> (u32, u32) {
        (self.logical_width, self.logical_height)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn physical_size(&self) -> PhysicalSize {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(MIN_SURFACE_DIMENSION);
        PhysicalSize {
            width: scale(self.logical_width),
            height: scale(self.logical_height),
        }
    }

    fn changed_from(&self, before: PhysicalSize) -> Option<PhysicalSize> {
        let after = self.physical_size();
        (after != before).then_some(after)
    }
}
