//! Lit mesh pipeline: diffuse surfaces under a single spot light.
//!
//! Shading follows the physically based light model the scene was authored
//! for: inverse-power distance falloff with an optional cutoff range, a
//! smooth cone edge controlled by the penumbra, and a Lambert BRDF. There is
//! no ambient term, so surfaces outside the cone are black.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use horizon_scene::{Camera, Material, SpotLight, ToneMapping};
use wgpu::util::DeviceExt;

use crate::buffer::{MeshBuffer, VertexPositionNormal};
use crate::depth::DepthBuffer;

/// Per-frame camera data. (96 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub exposure: f32,
    pub tone_mapping: u32,
    pub _padding: [u32; 3],
}

impl CameraUniform {
    pub fn new(camera: &Camera, exposure: f32, tone_mapping: ToneMapping) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            position: camera.position.to_array(),
            exposure,
            tone_mapping: tone_mapping.shader_index(),
            _padding: [0; 3],
        }
    }
}

/// The scene's spot light, or a disabled slot. (64 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub intensity: f32,
    /// Unit vector from the target towards the light.
    pub direction: [f32; 3],
    pub cone_cos: f32,
    /// Linear RGB.
    pub color: [f32; 3],
    pub penumbra_cos: f32,
    pub cutoff_distance: f32,
    pub decay: f32,
    pub enabled: u32,
    pub _padding: u32,
}

impl LightUniform {
    pub fn disabled() -> Self {
        Self::zeroed()
    }

    pub fn from_spot(light: &SpotLight, world_position: Vec3) -> Self {
        let direction = (world_position - light.target)
            .try_normalize()
            .unwrap_or(Vec3::Y);
        Self {
            position: world_position.to_array(),
            intensity: light.intensity,
            direction: direction.to_array(),
            cone_cos: light.angle.cos(),
            color: light.color.to_linear(),
            penumbra_cos: (light.angle * (1.0 - light.penumbra)).cos(),
            cutoff_distance: light.distance,
            decay: light.decay,
            enabled: 1,
            _padding: 0,
        }
    }
}

/// Per-mesh transform and surface color. (144 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`.
    pub normal: [[f32; 4]; 4],
    /// Linear RGB, alpha unused.
    pub color: [f32; 4],
}

impl ModelUniform {
    pub fn new(world: Mat4, material: &Material) -> Self {
        let [r, g, b] = material.color.to_linear();
        Self {
            model: world.to_cols_array_2d(),
            normal: world.inverse().transpose().to_cols_array_2d(),
            color: [r, g, b, 1.0],
        }
    }
}

/// GPU resources for one scene mesh.
pub struct GpuMesh {
    pub buffer: MeshBuffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    pub fn update(&self, queue: &wgpu::Queue, uniform: &ModelUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }
}

pub struct MeshPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    pub model_bind_group_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mesh-frame-bind-group-layout"),
                entries: &[
                    uniform_entry(0, std::mem::size_of::<CameraUniform>()),
                    uniform_entry(1, std::mem::size_of::<LightUniform>()),
                ],
            });
        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mesh-model-bind-group-layout"),
                entries: &[uniform_entry(0, std::mem::size_of::<ModelUniform>())],
            });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh-camera-buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh-light-buffer"),
            contents: bytemuck::bytes_of(&LightUniform::disabled()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh-frame-bind-group"),
            layout: &frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh-pipeline-layout"),
            bind_group_layouts: &[&frame_bind_group_layout, &model_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormal::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Imported models are not guaranteed to be closed.
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: DepthBuffer::COMPARE_FUNCTION,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_bind_group_layout,
            model_bind_group_layout,
            camera_buffer,
            light_buffer,
            frame_bind_group,
        }
    }

    pub fn update_frame(&self, queue: &wgpu::Queue, camera: &CameraUniform, light: &LightUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(light));
    }

    /// Upload a mesh with its own model uniform.
    pub fn create_mesh(
        &self,
        device: &wgpu::Device,
        label: &str,
        buffer: MeshBuffer,
        uniform: &ModelUniform,
    ) -> GpuMesh {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-model")),
            contents: bytemuck::bytes_of(uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-model-bind-group")),
            layout: &self.model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        GpuMesh {
            buffer,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn begin(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
    }

    /// Draw one mesh. [`begin`](Self::begin) must have been called on the pass.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, mesh: &GpuMesh) {
        render_pass.set_bind_group(1, &mesh.bind_group, &[]);
        mesh.buffer.bind(render_pass);
        mesh.buffer.draw(render_pass);
    }
}

/// Mesh shader body. Needs [`crate::tonemap::TONEMAP_WGSL`] prepended.
pub const MESH_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec3<f32>,
    exposure: f32,
    tone_mapping: u32,
};

struct LightUniform {
    position: vec3<f32>,
    intensity: f32,
    direction: vec3<f32>,
    cone_cos: f32,
    color: vec3<f32>,
    penumbra_cos: f32,
    cutoff_distance: f32,
    decay: f32,
    enabled: u32,
};

struct ModelUniform {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> light: LightUniform;
@group(1) @binding(0) var<uniform> mesh: ModelUniform;

const RECIPROCAL_PI: f32 = 0.3183098861837907;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = mesh.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (mesh.normal * vec4<f32>(in.normal, 0.0)).xyz;
    return out;
}

fn distance_attenuation(light_distance: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(light_distance, decay), 0.01);
    if cutoff > 0.0 {
        let ratio = light_distance / cutoff;
        let edge = clamp(1.0 - ratio * ratio * ratio * ratio, 0.0, 1.0);
        falloff = falloff * edge * edge;
    }
    return falloff;
}

fn spot_attenuation(cone_cos: f32, penumbra_cos: f32, angle_cos: f32) -> f32 {
    if penumbra_cos <= cone_cos {
        return step(cone_cos, angle_cos);
    }
    return smoothstep(cone_cos, penumbra_cos, angle_cos);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = mesh.color.rgb;
    var outgoing = vec3<f32>(0.0);

    let n_len = length(in.world_normal);
    if light.enabled != 0u && n_len > 0.0 {
        var normal = in.world_normal / n_len;
        let view_dir = camera.position - in.world_position;
        if dot(normal, view_dir) < 0.0 {
            normal = -normal;
        }

        let to_light = light.position - in.world_position;
        let light_distance = length(to_light);
        let l = to_light / max(light_distance, 1e-6);
        let angle_cos = dot(l, light.direction);
        let attenuation = distance_attenuation(light_distance, light.cutoff_distance, light.decay)
            * spot_attenuation(light.cone_cos, light.penumbra_cos, angle_cos);
        let irradiance = max(dot(normal, l), 0.0) * light.color * light.intensity * attenuation;
        outgoing = irradiance * diffuse * RECIPROCAL_PI;
    }

    return vec4<f32>(tone_map(outgoing, camera.exposure, camera.tone_mapping), 1.0);
}
"#;
