//! The main render pass and per-frame submission.
//!
//! The sky and every mesh share one pass: colour is cleared, depth is
//! cleared to the reverse-Z far plane, the sky draws first without writing
//! depth and the meshes test against each other.

use crate::depth::DepthBuffer;

/// Shown only where the sky pass does not write.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Load state and label for the main pass.
#[derive(Debug, Clone)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    use_depth: bool,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self {
            clear_color: CLEAR_COLOR,
            use_depth: true,
            label: None,
        }
    }
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_color(self, clear_color: wgpu::Color) -> Self {
        Self {
            clear_color,
            ..self
        }
    }

    /// Whether the pass attaches the depth buffer.
    pub fn with_depth(self, use_depth: bool) -> Self {
        Self { use_depth, ..self }
    }

    pub fn label(self, label: &'static str) -> Self {
        Self {
            label: Some(label),
            ..self
        }
    }

    pub fn begin<'a>(
        &self,
        encoder: &'a mut wgpu::CommandEncoder,
        target: &'a wgpu::TextureView,
        depth: &'a DepthBuffer,
    ) -> wgpu::RenderPass<'a> {
        let color = wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            depth_slice: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.clear_color),
                store: wgpu::StoreOp::Store,
            },
        };
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color)],
            depth_stencil_attachment: self.use_depth.then(|| depth.attachment()),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Encodes one frame into the acquired surface texture and presents it.
///
/// Dropping an unsubmitted frame still presents it, with a warning, so the
/// swapchain never leaks a texture.
pub struct FrameEncoder<'q> {
    queue: &'q wgpu::Queue,
    pending: Option<(wgpu::CommandEncoder, wgpu::SurfaceTexture)>,
    target: wgpu::TextureView,
}

impl<'q> FrameEncoder<'q> {
    pub fn new(
        device: &wgpu::Device,
        queue: &'q wgpu::Queue,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let target = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("horizon-frame"),
        });
        Self {
            queue,
            pending: Some((encoder, surface_texture)),
            target,
        }
    }

    pub fn begin_render_pass<'a>(
        &'a mut self,
        builder: &RenderPassBuilder,
        depth: &'a DepthBuffer,
    ) -> wgpu::RenderPass<'a> {
        let (encoder, _) = self
            .pending
            .as_mut()
            .expect("FrameEncoder already submitted");
        builder.begin(encoder, &self.target, depth)
    }

    pub fn submit(mut self) {
        self.present();
    }

    fn present(&mut self) {
        if let Some((encoder, surface_texture)) = self.pending.take() {
            self.queue.submit([encoder.finish()]);
            surface_texture.present();
        }
    }
}

impl Drop for FrameEncoder<'_> {
    fn drop(&mut self) {
        if self.pending.is_some() {
            log::warn!("Frame dropped before submit, presenting anyway");
            self.present();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_pass_defaults() {
        let builder = RenderPassBuilder::new();
        assert_eq!(builder.clear_color, CLEAR_COLOR);
        assert!(builder.use_depth);
        assert!(builder.label.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let builder = RenderPassBuilder::new()
            .label("horizon-main")
            .with_depth(false)
            .clear_color(wgpu::Color::BLACK);
        assert_eq!(builder.clear_color, wgpu::Color::BLACK);
        assert!(!builder.use_depth);
        assert_eq!(builder.label, Some("horizon-main"));
    }
}
