//! The windowed application: winit event handling around a [`SceneContext`].

use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use horizon_config::{CliArgs, Config};
use horizon_render::{GpuRenderer, init_render_context_blocking};
use horizon_scene::{
    FrameDriver, FrameOutcome, GltfLoader, Renderer, SceneAssembler, SceneContext, StopToken,
};
use horizon_sky::DebugPanel;
use tracing::{debug, error, info, instrument, trace, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::controls::apply_panel_command;
use crate::input::{MouseState, OrbitGesture, PanelCommand, panel_command};
use crate::settings::{
    effective_pixel_ratio, scattering_binding, scene_settings, sky_parameters, tone_mapping,
};

/// Window attributes for the configured size, title and fullscreen mode.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Application state owned by the event loop.
pub struct HorizonApp {
    /// Effective settings: the file with command-line overrides applied.
    config: Config,
    /// Settings as last read from `config.ron`.
    file_config: Config,
    cli: CliArgs,
    config_dir: PathBuf,
    window: Option<Arc<Window>>,
    context: Option<SceneContext<GpuRenderer>>,
    driver: FrameDriver,
    panel: DebugPanel,
    mouse: MouseState,
    modifiers: ModifiersState,
}

impl HorizonApp {
    /// `file_config` is the un-overridden file view; `cli` is re-applied to
    /// it on every reload.
    pub fn new(file_config: Config, cli: CliArgs, config_dir: PathBuf) -> Self {
        let config = effective_config(&file_config, &cli);
        let panel = DebugPanel::sky_controls(config.debug.show_panel);
        Self {
            config,
            file_config,
            cli,
            config_dir,
            window: None,
            context: None,
            driver: FrameDriver::new(StopToken::new()),
            panel,
            mouse: MouseState::new(),
            modifiers: ModifiersState::empty(),
        }
    }

    fn scale_factor(&self) -> f64 {
        self.window.as_ref().map_or(1.0, |w| w.scale_factor())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.driver.stop_token().cancel();
        let stats = self.driver.stats();
        info!(
            frames = stats.frames,
            slow_frames = stats.slow_frames,
            "shutting down"
        );
        event_loop.exit();
    }

    /// Re-read `config.ron` and apply sky, tone mapping and pixel ratio changes.
    /// Command-line overrides survive the reload.
    fn reload_config(&mut self) {
        let file_config = match self.file_config.reload(&self.config_dir) {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("config unchanged");
                return;
            }
            Err(e) => {
                warn!("config reload failed: {e}");
                return;
            }
        };
        let new_config = effective_config(&file_config, &self.cli);
        let scale_factor = self.scale_factor();
        if let Some(context) = &mut self.context {
            let renderer = context.renderer_mut();
            renderer.set_tone_mapping(tone_mapping(new_config.render.tone_mapping));
            renderer.set_pixel_ratio(effective_pixel_ratio(
                new_config.render.pixel_ratio,
                scale_factor,
            ));
            let model = context.sky_model_mut();
            *model.params_mut() = sky_parameters(&new_config.sky);
            model.set_binding(scattering_binding(&new_config.sky));
            context.apply_sky_parameters();
        }
        self.file_config = file_config;
        self.config = new_config;
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        if code == KeyCode::Escape {
            self.shutdown(event_loop);
            return;
        }
        match panel_command(code, self.modifiers.shift_key()) {
            Some(PanelCommand::ReloadConfig) if !event.repeat => self.reload_config(),
            Some(command) => {
                if let Some(context) = &mut self.context {
                    apply_panel_command(&mut self.panel, context, command);
                }
            }
            None => {}
        }
    }

    /// Feed accumulated mouse motion and wheel input to the orbit controller.
    fn apply_orbit_input(&mut self) {
        let scale = self.scale_factor() as f32;
        let Some(context) = &mut self.context else {
            return;
        };
        let delta = self.mouse.delta() / scale;
        if delta != Vec2::ZERO {
            let pan_modifier = self.modifiers.shift_key() || self.modifiers.control_key();
            match self.mouse.drag_gesture(pan_modifier) {
                Some(OrbitGesture::Rotate) => context.orbit_rotate(delta.x, delta.y),
                Some(OrbitGesture::Pan) => context.orbit_pan(delta.x, delta.y),
                None => {}
            }
        }
        let scroll = self.mouse.scroll();
        if scroll != 0.0 && !context.orbit_dolly(scroll) {
            trace!("zoom disabled, wheel ignored");
        }
        self.mouse.clear_transients();
    }
}

impl ApplicationHandler for HorizonApp {
    #[instrument(skip_all)]
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = window_attributes_from_config(&self.config);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );

        let context = match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let scale_factor = window.scale_factor();
        let logical = window.inner_size().to_logical::<f64>(scale_factor);
        let viewport = (logical.width.round() as u32, logical.height.round() as u32);
        info!(
            "Window {}x{} (scale: {:.2})",
            viewport.0, viewport.1, scale_factor
        );

        let settings = scene_settings(&self.config, scale_factor);
        let mut scene = SceneAssembler::build_scene(&settings, GpuRenderer::new(context), viewport);
        scene.request_model(&GltfLoader::new(), &self.config.scene.model_path);
        if self.panel.is_visible() {
            info!("sky panel\n{}", self.panel.describe(scene.sky_model().params()));
        }

        self.context = Some(scene);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                let logical = size.to_logical::<f64>(self.scale_factor());
                if let Some(context) = &mut self.context {
                    context.on_window_resize(
                        logical.width.round() as u32,
                        logical.height.round() as u32,
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                debug!(scale_factor, "scale factor changed");
                if self.config.render.pixel_ratio <= 0.0
                    && let Some(context) = &mut self.context
                {
                    context
                        .renderer_mut()
                        .set_pixel_ratio(effective_pixel_ratio(0.0, scale_factor));
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.mouse.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.mouse.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.mouse.on_scroll(delta),
            WindowEvent::RedrawRequested => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                self.apply_orbit_input();
                let Some(context) = &mut self.context else {
                    return;
                };
                context.poll_model_load();
                if self.driver.tick(context) == FrameOutcome::Stopped {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

/// `file_config` with `cli` applied, or `file_config` alone when the
/// overrides fail validation.
pub fn effective_config(file_config: &Config, cli: &CliArgs) -> Config {
    file_config.with_cli_overrides(cli).unwrap_or_else(|e| {
        warn!("ignoring command-line overrides: {e}");
        file_config.clone()
    })
}

/// Open the window and run until it is closed.
pub fn run(file_config: Config, cli: CliArgs, config_dir: PathBuf) {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = HorizonApp::new(file_config, cli, config_dir);
    event_loop.run_app(&mut app).expect("Event loop failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_attributes_follow_config() {
        let mut config = Config::default();
        config.window.width = 640;
        config.window.height = 480;
        config.window.title = "sky".to_string();
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "sky");
        assert!(attrs.fullscreen.is_none());
        assert_eq!(
            attrs.inner_size,
            Some(winit::dpi::LogicalSize::new(640.0, 480.0).into())
        );
    }

    #[test]
    fn test_fullscreen_is_borderless() {
        let mut config = Config::default();
        config.window.fullscreen = true;
        let attrs = window_attributes_from_config(&config);
        assert!(matches!(attrs.fullscreen, Some(Fullscreen::Borderless(None))));
    }

    #[test]
    fn test_new_app_panel_follows_config() {
        let mut config = Config::default();
        config.debug.show_panel = true;
        let app = HorizonApp::new(config, CliArgs::default(), PathBuf::from("."));
        assert!(app.panel.is_visible());
        assert!(app.context.is_none());
        assert_eq!(app.scale_factor(), 1.0);
    }

    #[test]
    fn test_cli_overrides_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file_config = Config::load_or_create(dir.path()).unwrap();
        let cli = CliArgs {
            pixel_ratio: Some(4.0),
            ..CliArgs::default()
        };
        let mut app = HorizonApp::new(file_config.clone(), cli, dir.path().to_path_buf());
        assert_eq!(app.config.render.pixel_ratio, 4.0);

        app.reload_config();
        assert_eq!(app.config.render.pixel_ratio, 4.0);

        let mut edited = file_config;
        edited.sky.elevation = 12.5;
        edited.save(dir.path()).unwrap();
        app.reload_config();
        assert_eq!(app.config.sky.elevation, 12.5);
        assert_eq!(app.file_config.sky.elevation, 12.5);
        assert_eq!(app.config.render.pixel_ratio, 4.0);
        assert_eq!(app.file_config.render.pixel_ratio, 0.0);
    }

    #[test]
    fn test_invalid_overrides_fall_back_to_file() {
        let cli = CliArgs {
            width: Some(0),
            ..CliArgs::default()
        };
        let config = effective_config(&Config::default(), &cli);
        assert_eq!(config.window.width, Config::default().window.width);
    }
}
