//! Device, queue and window surface for the horizon renderer.

use std::sync::Arc;

use winit::window::Window;

/// Raised while bringing up the GPU; the app cannot render without it.
#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    #[error("no GPU adapter can present to this window")]
    NoAdapter,

    #[error("GPU device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("window surface creation failed: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// The adapter reported no formats for the surface.
    #[error("surface has no formats supported by the adapter")]
    IncompatibleSurface,
}

/// Why a frame could not be acquired. The caller skips the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface lost")]
    Lost,
    #[error("out of memory")]
    OutOfMemory,
    #[error("timeout")]
    Timeout,
}

/// What to do about a failed `get_current_texture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Reconfigure,
    Skip(SurfaceError),
}

fn recovery_for(err: &wgpu::SurfaceError) -> Recovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Recovery::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => Recovery::Skip(SurfaceError::OutOfMemory),
        wgpu::SurfaceError::Timeout => Recovery::Skip(SurfaceError::Timeout),
        wgpu::SurfaceError::Other => Recovery::Skip(SurfaceError::Lost),
    }
}

/// GPU state for one window. The sky and mesh pipelines borrow `device`
/// and `queue` from here.
pub struct RenderContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    pub adapter_info: wgpu::AdapterInfo,
}

impl RenderContext {
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderContextError> {
        let physical = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderContextError::NoAdapter)?;
        let adapter_info = adapter.get_info();
        log::info!(
            "Adapter: {} [{:?} / {:?}]",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("horizon-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let (width, height) = clamp_surface_size(
            physical.width,
            physical.height,
            device.limits().max_texture_dimension_2d,
        );
        let surface_config = surface_configuration(&caps, width, height, vsync)
            .ok_or(RenderContextError::IncompatibleSurface)?;
        log::debug!(
            "Surface {}x{} {:?} {:?}",
            width,
            height,
            surface_config.format,
            surface_config.present_mode
        );
        surface.configure(&device, &surface_config);

        Ok(Self {
            device,
            queue,
            surface,
            surface_format: surface_config.format,
            surface_config,
            adapter_info,
        })
    }

    /// Reconfigure for a new physical size, clamped to the device limit.
    pub fn resize(&mut self, width: u32, height: u32) {
        let max = self.device.limits().max_texture_dimension_2d;
        let size = clamp_surface_size(width, height, max);
        if size == self.surface_size() {
            return;
        }
        (self.surface_config.width, self.surface_config.height) = size;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Physical pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Acquire the next frame. Lost or outdated surfaces are reconfigured
    /// once before giving up.
    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, SurfaceError> {
        let err = match self.surface.get_current_texture() {
            Ok(texture) => return Ok(texture),
            Err(err) => err,
        };
        match recovery_for(&err) {
            Recovery::Skip(reason) => Err(reason),
            Recovery::Reconfigure => {
                log::warn!("Surface {err}, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                self.surface
                    .get_current_texture()
                    .map_err(|_| SurfaceError::Lost)
            }
        }
    }
}

/// Blocking wrapper around [`RenderContext::new`].
pub fn init_render_context_blocking(
    window: Arc<Window>,
    vsync: bool,
) -> Result<RenderContext, RenderContextError> {
    pollster::block_on(RenderContext::new(window, vsync))
}

/// `None` when the surface supports no formats on this adapter.
fn surface_configuration(
    caps: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
    vsync: bool,
) -> Option<wgpu::SurfaceConfiguration> {
    let format = select_preferred_srgb_format(&caps.formats)?;
    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: select_present_mode(&caps.present_modes, vsync),
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
        desired_maximum_frame_latency: 2,
    })
}

/// The sky shader writes linear colour, so an sRGB target is preferred.
fn select_preferred_srgb_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    const PREFERRED: [wgpu::TextureFormat; 2] = [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ];
    PREFERRED
        .into_iter()
        .find(|f| formats.contains(f))
        .or_else(|| formats.iter().copied().find(|f| f.is_srgb()))
        .or_else(|| formats.first().copied())
}

/// Fifo when vsync is requested; otherwise the lowest-latency mode available.
fn select_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

pub(crate) fn clamp_surface_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let clamped = (width.clamp(1, max_dimension), height.clamp(1, max_dimension));
    if clamped.0 < width || clamped.1 < height {
        log::warn!("Surface {width}x{height} exceeds device limit {max_dimension}, clamping");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{PresentMode, TextureFormat};

    #[test]
    fn test_zero_sized_window_gets_one_pixel() {
        assert_eq!(clamp_surface_size(0, 0, 8192), (1, 1));
        assert_eq!(clamp_surface_size(0, 600, 8192), (1, 600));
    }

    #[test]
    fn test_oversized_window_clamps_each_axis() {
        assert_eq!(clamp_surface_size(10240, 5760, 8192), (8192, 5760));
        assert_eq!(clamp_surface_size(1920, 1080, 8192), (1920, 1080));
    }

    #[test]
    fn test_present_mode_selection() {
        let all = [PresentMode::Fifo, PresentMode::Immediate, PresentMode::Mailbox];
        assert_eq!(select_present_mode(&all, true), PresentMode::Fifo);
        assert_eq!(select_present_mode(&all, false), PresentMode::Mailbox);
        assert_eq!(
            select_present_mode(&[PresentMode::Fifo, PresentMode::Immediate], false),
            PresentMode::Immediate
        );
        assert_eq!(select_present_mode(&[PresentMode::Fifo], false), PresentMode::Fifo);
    }

    #[test]
    fn test_format_selection() {
        let cases: [(&[TextureFormat], Option<TextureFormat>); 4] = [
            (
                &[TextureFormat::Rgba8UnormSrgb, TextureFormat::Bgra8UnormSrgb],
                Some(TextureFormat::Bgra8UnormSrgb),
            ),
            (
                &[TextureFormat::Rgba8Unorm, TextureFormat::Rgba8UnormSrgb],
                Some(TextureFormat::Rgba8UnormSrgb),
            ),
            (
                &[TextureFormat::Bgra8Unorm, TextureFormat::Rgba8Unorm],
                Some(TextureFormat::Bgra8Unorm),
            ),
            (&[], None),
        ];
        for (formats, expected) in cases {
            assert_eq!(select_preferred_srgb_format(formats), expected, "{formats:?}");
        }
    }

    #[test]
    fn test_lost_and_outdated_surfaces_reconfigure() {
        assert_eq!(recovery_for(&wgpu::SurfaceError::Lost), Recovery::Reconfigure);
        assert_eq!(recovery_for(&wgpu::SurfaceError::Outdated), Recovery::Reconfigure);
        assert_eq!(
            recovery_for(&wgpu::SurfaceError::Timeout),
            Recovery::Skip(SurfaceError::Timeout)
        );
        assert_eq!(
            recovery_for(&wgpu::SurfaceError::OutOfMemory),
            Recovery::Skip(SurfaceError::OutOfMemory)
        );
    }
}
