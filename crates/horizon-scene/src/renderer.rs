//! The renderer seam and a headless implementation.

use glam::Mat4;
use horizon_sky::Sky;
use tracing::trace;

use crate::camera::Camera;
use crate::graph::Scene;

/// Tone mapping operator applied to the lit HDR image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToneMapping {
    None,
    Linear,
    #[default]
    AcesFilmic,
}

impl ToneMapping {
    /// Operator index in the shaders' uniform blocks.
    pub fn shader_index(self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::Linear => 1,
            ToneMapping::AcesFilmic => 2,
        }
    }
}

/// Draws a scene through a camera.
///
/// `render` never fails: backend errors are logged and the frame is dropped.
pub trait Renderer {
    fn render(&mut self, scene: &Scene, camera: &Camera);

    /// Set the drawing size in logical pixels.
    fn set_size(&mut self, width: u32, height: u32);

    /// Drawing size in logical pixels.
    fn size(&self) -> (u32, u32);

    /// Set the physical-to-logical pixel ratio used for the backbuffer.
    fn set_pixel_ratio(&mut self, ratio: f32);

    fn pixel_ratio(&self) -> f32;

    fn tone_mapping(&self) -> ToneMapping;

    fn set_tone_mapping(&mut self, mode: ToneMapping);

    fn tone_mapping_exposure(&self) -> f32;

    fn set_tone_mapping_exposure(&mut self, exposure: f32);

    /// Backbuffer size in physical pixels.
    fn drawing_buffer_size(&self) -> (u32, u32) {
        let (w, h) = self.size();
        let ratio = self.pixel_ratio();
        (
            ((w as f32 * ratio).round() as u32).max(1),
            ((h as f32 * ratio).round() as u32).max(1),
        )
    }
}

/// What a [`HeadlessRenderer`] saw on one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub index: u64,
    pub size: (u32, u32),
    pub exposure: f32,
    pub tone_mapping: ToneMapping,
    pub node_count: usize,
    pub mesh_count: usize,
    pub light_count: usize,
    pub sky: Option<Sky>,
    pub view_projection: Mat4,
}

/// A renderer with no output device. Records each frame instead of drawing.
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    size: (u32, u32),
    pixel_ratio: f32,
    tone_mapping: ToneMapping,
    exposure: f32,
    frames_rendered: u64,
    last_frame: Option<FrameRecord>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            size: (1, 1),
            pixel_ratio: 1.0,
            tone_mapping: ToneMapping::default(),
            exposure: 1.0,
            frames_rendered: 0,
            last_frame: None,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last_frame.as_ref()
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        let record = FrameRecord {
            index: self.frames_rendered,
            size: self.size,
            exposure: self.exposure,
            tone_mapping: self.tone_mapping,
            node_count: scene.len(),
            mesh_count: scene.meshes().count(),
            light_count: scene.lights().count(),
            sky: scene.find_sky().map(|(sky, _)| *sky),
            view_projection: camera.view_projection_matrix(),
        };
        trace!(frame = record.index, meshes = record.mesh_count, "headless frame");
        self.frames_rendered += 1;
        self.last_frame = Some(record);
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn tone_mapping(&self) -> ToneMapping {
        self.tone_mapping
    }

    fn set_tone_mapping(&mut self, mode: ToneMapping) {
        self.tone_mapping = mode;
    }

    fn tone_mapping_exposure(&self) -> f32 {
        self.exposure
    }

    fn set_tone_mapping_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }
}
