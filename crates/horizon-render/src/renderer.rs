//! wgpu implementation of [`horizon_scene::Renderer`].

use std::collections::HashMap;

use glam::Mat4;
use horizon_scene::{Camera, NodeId, Renderer, Scene, ToneMapping};
use horizon_sky::SkyGpuUniform;

use crate::buffer::BufferAllocator;
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::mesh_pipeline::{CameraUniform, GpuMesh, LightUniform, MESH_SHADER_SOURCE, MeshPipeline, ModelUniform};
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::shader::ShaderLibrary;
use crate::sky_pipeline::{SKY_SHADER_SOURCE, SkyPipeline};
use crate::surface::{PhysicalSize, SurfaceTracker};

/// Draws the sky, then every mesh lit by the first spot light.
pub struct GpuRenderer {
    context: RenderContext,
    depth: DepthBuffer,
    shaders: ShaderLibrary,
    sky: SkyPipeline,
    meshes: MeshPipeline,
    gpu_meshes: HashMap<NodeId, GpuMesh>,
    surface: SurfaceTracker,
    tone_mapping: ToneMapping,
    exposure: f32,
    frames: u64,
}

impl GpuRenderer {
    /// Build pipelines for `context`. The logical size starts at the current
    /// surface size with a pixel ratio of 1.
    pub fn new(context: RenderContext) -> Self {
        let mut shaders = ShaderLibrary::new();
        let sky_module = shaders.load_with_tonemap(&context.device, "sky", SKY_SHADER_SOURCE);
        let mesh_module = shaders.load_with_tonemap(&context.device, "mesh", MESH_SHADER_SOURCE);

        let sky = SkyPipeline::new(&context.device, &sky_module, context.surface_format);
        let meshes = MeshPipeline::new(&context.device, &mesh_module, context.surface_format);

        let (width, height) = context.surface_size();
        let depth = DepthBuffer::new(&context.device, width, height);
        log::info!(
            "GPU renderer ready: {} shaders, surface {}x{} {:?}",
            shaders.len(),
            width,
            height,
            context.surface_format
        );

        Self {
            context,
            depth,
            shaders,
            sky,
            meshes,
            gpu_meshes: HashMap::new(),
            surface: SurfaceTracker::new(width, height, 1.0),
            tone_mapping: ToneMapping::default(),
            exposure: 1.0,
            frames: 0,
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    fn apply_physical_size(&mut self, physical: PhysicalSize) {
        self.context.resize(physical.width, physical.height);
        let (width, height) = self.context.surface_size();
        self.depth.resize(&self.context.device, width, height);
        log::debug!("Surface resized to {width}x{height}");
    }

    /// Upload meshes seen for the first time and refresh every model uniform.
    fn sync_meshes(&mut self, scene: &Scene) {
        let allocator = BufferAllocator::new(&self.context.device);
        for (id, node, world) in scene.meshes() {
            let uniform = ModelUniform::new(world, &node.material);
            match self.gpu_meshes.get(&id) {
                Some(mesh) => mesh.update(&self.context.queue, &uniform),
                None => {
                    if node.mesh.is_empty() {
                        continue;
                    }
                    let label = scene
                        .get(id)
                        .map(|n| n.name.as_str())
                        .unwrap_or("mesh");
                    let buffer = allocator.create_mesh(label, &node.mesh);
                    let mesh = self
                        .meshes
                        .create_mesh(&self.context.device, label, buffer, &uniform);
                    log::debug!(
                        "Uploaded mesh '{}' ({} triangles)",
                        label,
                        node.mesh.triangle_count()
                    );
                    self.gpu_meshes.insert(id, mesh);
                }
            }
        }
    }
}

/// Inverse view-projection without the camera translation, for sky rays.
pub fn sky_inverse_view_projection(camera: &Camera) -> Mat4 {
    let rotation_only = Mat4::from_quat(camera.rotation.conjugate());
    (camera.projection_matrix() * rotation_only).inverse()
}

impl Renderer for GpuRenderer {
    fn render(&mut self, scene: &Scene, camera: &Camera) {
        let surface_texture = match self.context.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Timeout) => {
                log::debug!("Surface timeout, skipping frame");
                return;
            }
            Err(err) => {
                log::warn!("Skipping frame: {err}");
                return;
            }
        };

        self.sync_meshes(scene);

        let tone_mapping = self.tone_mapping.shader_index();
        let light = scene
            .lights()
            .next()
            .map(|(_, spot, position)| LightUniform::from_spot(spot, position))
            .unwrap_or_else(LightUniform::disabled);
        self.meshes.update_frame(
            &self.context.queue,
            &CameraUniform::new(camera, self.exposure, self.tone_mapping),
            &light,
        );

        let sky = scene.find_sky().map(|(sky, _)| {
            SkyGpuUniform::new(
                sky,
                sky_inverse_view_projection(camera),
                camera.position,
                self.exposure,
                tone_mapping,
            )
        });
        if let Some(uniform) = &sky {
            self.sky.update(&self.context.queue, uniform);
        }

        let mut frame = FrameEncoder::new(&self.context.device, &self.context.queue, surface_texture);
        {
            let builder = RenderPassBuilder::new().label("horizon-main");
            let mut pass = frame.begin_render_pass(&builder, &self.depth);
            if sky.is_some() {
                self.sky.draw(&mut pass);
            }
            self.meshes.begin(&mut pass);
            for (id, _, _) in scene.meshes() {
                if let Some(mesh) = self.gpu_meshes.get(&id) {
                    self.meshes.draw(&mut pass, mesh);
                }
            }
        }
        frame.submit();
        self.frames += 1;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if let Some(physical) = self.surface.set_logical_size(width, height) {
            self.apply_physical_size(physical);
        }
    }

    fn size(&self) -> (u32, u32) {
        self.surface.logical_size()
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        if let Some(physical) = self.surface.set_pixel_ratio(ratio) {
            self.apply_physical_size(physical);
        }
    }

    fn pixel_ratio(&self) -> f32 {
        self.surface.pixel_ratio()
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
