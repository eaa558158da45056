//! Preetham analytic sky drawn as a fullscreen triangle behind everything.
//!
//! The scattering coefficients are computed on the CPU by `horizon-sky` and
//! arrive packed in a [`SkyGpuUniform`]. The fragment stage reconstructs the
//! view ray from `inv_view_proj` (built from the camera rotation only), so the
//! result is the same as ray-casting the inside of a large sky box centered on
//! the camera.

use std::num::NonZeroU64;

use bytemuck::Zeroable;
use horizon_sky::SkyGpuUniform;
use wgpu::util::DeviceExt;

use crate::depth::DepthBuffer;

pub const SKY_UNIFORM_SIZE: u64 = std::mem::size_of::<SkyGpuUniform>() as u64;

pub struct SkyPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SkyPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(SKY_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-uniform-buffer"),
            contents: bytemuck::bytes_of(&SkyGpuUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-bind-group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Sits on the far plane and never occludes.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
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
            bind_group_layout,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &SkyGpuUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

/// Sky shader body. Needs [`crate::tonemap::TONEMAP_WGSL`] prepended.
pub const SKY_SHADER_SOURCE: &str = r#"
struct SkyUniform {
    inv_view_proj: mat4x4<f32>,
    camera_position: vec3<f32>,
    exposure: f32,
    sun_direction: vec3<f32>,
    sun_intensity: f32,
    up: vec3<f32>,
    sun_fade: f32,
    beta_r: vec3<f32>,
    mie_directional_g: f32,
    beta_m: vec3<f32>,
    tone_mapping: u32,
};

@group(0) @binding(0)
var<uniform> sky: SkyUniform;

const PI: f32 = 3.141592653589793;
const RAYLEIGH_ZENITH_LENGTH: f32 = 8.4e3;
const MIE_ZENITH_LENGTH: f32 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.99995667;
const THREE_OVER_SIXTEEN_PI: f32 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f32 = 0.07957747154594767;
const TINY: f32 = 1e-20;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    var out: VertexOutput;
    // Reverse-Z far plane.
    out.clip_position = vec4<f32>(x, y, 0.0, 1.0);
    out.ndc = vec2<f32>(x, y);
    return out;
}

fn rayleigh_phase(cos_theta: f32) -> f32 {
    return THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta);
}

fn hg_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let denom = max(pow(max(1.0 - 2.0 * g * cos_theta + g2, 0.0), 1.5), 1e-6);
    return ONE_OVER_FOUR_PI * ((1.0 - g2) / denom);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let far_point = sky.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let direction = normalize(far_point.xyz / far_point.w);

    let zenith_angle = acos(max(0.0, dot(sky.up, direction)));
    let inv = 1.0 / (cos(zenith_angle)
        + 0.15 * pow(93.885 - ((zenith_angle * 180.0) / PI), -1.253));
    let s_r = RAYLEIGH_ZENITH_LENGTH * inv;
    let s_m = MIE_ZENITH_LENGTH * inv;

    let fex = exp(-(sky.beta_r * s_r + sky.beta_m * s_m));

    let cos_theta = dot(direction, sky.sun_direction);
    let beta_r_theta = sky.beta_r * rayleigh_phase(cos_theta * 0.5 + 0.5);
    let beta_m_theta = sky.beta_m * hg_phase(cos_theta, sky.mie_directional_g);

    let ratio = (beta_r_theta + beta_m_theta) / max(sky.beta_r + sky.beta_m, vec3<f32>(TINY));
    var lin = pow(max(sky.sun_intensity * ratio * (1.0 - fex), vec3<f32>(0.0)), vec3<f32>(1.5));
    let horizon_mix = clamp(pow(max(1.0 - dot(sky.up, sky.sun_direction), 0.0), 5.0), 0.0, 1.0);
    lin = lin * mix(
        vec3<f32>(1.0),
        pow(max(sky.sun_intensity * ratio * fex, vec3<f32>(0.0)), vec3<f32>(0.5)),
        horizon_mix,
    );

    var l0 = vec3<f32>(0.1) * fex;
    let sundisk = smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.00002, cos_theta);
    l0 = l0 + (sky.sun_intensity * 19000.0 * fex) * sundisk;

    let tex_color = (lin + l0) * 0.04 + vec3<f32>(0.0, 0.0003, 0.00075);
    let ret_color = pow(max(tex_color, vec3<f32>(0.0)), vec3<f32>(1.0 / (1.2 + (1.2 * sky.sun_fade))));

    return vec4<f32>(tone_map(ret_color, sky.exposure, sky.tone_mapping), 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderLibrary;
    use crate::test_support::create_test_device;

    #[test]
    fn test_uniform_size_matches_wgsl_layout() {
        assert_eq!(SKY_UNIFORM_SIZE, 144);
    }

    #[test]
    fn test_shader_declares_uniform_fields_in_order() {
        let fields = [
            "inv_view_proj",
            "camera_position",
            "exposure",
            "sun_direction",
            "sun_intensity",
            "up",
            "sun_fade",
            "beta_r",
            "mie_directional_g",
            "beta_m",
            "tone_mapping",
        ];
        let mut cursor = 0;
        for field in fields {
            let needle = format!("    {field}: ");
            let found = SKY_SHADER_SOURCE[cursor..]
                .find(&needle)
                .unwrap_or_else(|| panic!("{field} missing or out of order"));
            cursor += found + needle.len();
        }
    }

    #[test]
    fn test_sky_pipeline_creation() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        let module = shaders.load_with_tonemap(&device, "sky", SKY_SHADER_SOURCE);
        let pipeline = SkyPipeline::new(&device, &module, wgpu::TextureFormat::Bgra8UnormSrgb);

        let sky = horizon_sky::Sky::new();
        let uniform = SkyGpuUniform::new(&sky, glam::Mat4::IDENTITY, glam::Vec3::ZERO, 1.0, 2);
        pipeline.update(&queue, &uniform);
        assert_eq!(pipeline.uniform_buffer.size(), SKY_UNIFORM_SIZE);
    }
}
