//! Owned scene state: graph, camera, renderer, controls and handles.

use std::f32::consts::TAU;
use std::path::Path;

use glam::Vec3;
use horizon_sky::{Sky, SkyField, SkyParameterModel, SkyTarget};
use tracing::{error, info, instrument, warn};

use crate::assembler::SceneAssembler;
use crate::asset::{AssetLoader, LoadEvent, ModelAsset, PendingLoad};
use crate::camera::Camera;
use crate::graph::{MeshNode, NodeId, NodeKind, Scene};
use crate::orbit::OrbitController;
use crate::renderer::Renderer;

/// Ids of the nodes the application touches after assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub root: NodeId,
    pub sky: NodeId,
    pub box_mesh: NodeId,
    pub light: NodeId,
    /// Set once the model has loaded.
    pub model: Option<NodeId>,
}

/// Everything needed to draw and update the scene. Single owner, no globals.
pub struct SceneContext<R: Renderer> {
    scene: Scene,
    camera: Camera,
    renderer: R,
    orbit: OrbitController,
    handles: SceneHandles,
    sky_model: SkyParameterModel,
    pending_model: Option<PendingLoad>,
    animate_box: bool,
}

impl<R: Renderer> SceneContext<R> {
    pub(crate) fn new(
        scene: Scene,
        camera: Camera,
        renderer: R,
        orbit: OrbitController,
        handles: SceneHandles,
        sky_model: SkyParameterModel,
        animate_box: bool,
    ) -> Self {
        Self {
            scene,
            camera,
            renderer,
            orbit,
            handles,
            sky_model,
            pending_model: None,
            animate_box,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn handles(&self) -> &SceneHandles {
        &self.handles
    }

    pub fn sky_model(&self) -> &SkyParameterModel {
        &self.sky_model
    }

    /// Edit parameters in place; follow with
    /// [`apply_sky_parameters`](Self::apply_sky_parameters).
    pub fn sky_model_mut(&mut self) -> &mut SkyParameterModel {
        &mut self.sky_model
    }

    pub fn animates_box(&self) -> bool {
        self.animate_box
    }

    /// Render one frame now.
    pub fn render(&mut self) {
        self.renderer.render(&self.scene, &self.camera);
    }

    /// Push the sky parameters into the sky and renderer, then render.
    pub fn apply_sky_parameters(&mut self) {
        let model = self.sky_model.clone();
        model.apply_and_render(self);
    }

    /// Set one parameter and re-apply.
    pub fn set_sky_parameter(&mut self, field: SkyField, value: f32) {
        self.sky_model.set(field, value);
        self.apply_sky_parameters();
    }

    /// Follow a viewport resize. Zero dimensions are treated as 1.
    #[instrument(skip(self))]
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.camera.set_aspect_ratio(width as f32, height as f32);
        self.renderer.set_size(width, height);
        self.render();
    }

    /// Current box rotation, radians per axis in `[0, 2pi)`.
    pub fn box_rotation(&self) -> Vec3 {
        self.scene
            .get(self.handles.box_mesh)
            .map(|n| n.transform.rotation)
            .unwrap_or(Vec3::ZERO)
    }

    /// Add `delta` to the box rotation, wrapping each angle into `[0, 2pi)`.
    pub fn rotate_box(&mut self, delta: Vec3) {
        if let Some(node) = self.scene.get_mut(self.handles.box_mesh) {
            let r = node.transform.rotation + delta;
            node.transform.rotation =
                Vec3::new(r.x.rem_euclid(TAU), r.y.rem_euclid(TAU), r.z.rem_euclid(TAU));
        }
    }

    /// Queue an orbit drag and move the camera.
    pub fn orbit_rotate(&mut self, dx: f32, dy: f32) {
        let height = self.renderer.size().1 as f32;
        self.orbit.rotate(dx, dy, height);
        self.orbit.update(&mut self.camera);
    }

    /// Queue a pan drag and move the camera.
    pub fn orbit_pan(&mut self, dx: f32, dy: f32) {
        let height = self.renderer.size().1 as f32;
        self.orbit.pan(dx, dy, height, self.camera.fov_y);
        self.orbit.update(&mut self.camera);
    }

    /// Wheel input. Returns `false` when zoom is disabled.
    pub fn orbit_dolly(&mut self, scroll: f32) -> bool {
        if !self.orbit.dolly(scroll) {
            return false;
        }
        self.orbit.update(&mut self.camera);
        true
    }

    /// Start loading the model. One-shot: ignored once a load has been
    /// started or a model inserted.
    #[instrument(skip(self, loader))]
    pub fn request_model(&mut self, loader: &dyn AssetLoader, path: &Path) {
        if self.pending_model.is_some() || self.handles.model.is_some() {
            warn!(path = %path.display(), "model already requested, ignoring");
            return;
        }
        info!(path = %path.display(), "loading model");
        self.pending_model = Some(loader.load(path));
    }

    /// Whether a model load is still outstanding.
    pub fn model_pending(&self) -> bool {
        self.pending_model.is_some()
    }

    /// Drain load events. Returns `true` when a model was inserted.
    pub fn poll_model_load(&mut self) -> bool {
        let Some(pending) = self.pending_model.as_mut() else {
            return false;
        };
        let events = pending.poll();
        if pending.is_finished() {
            self.pending_model = None;
        }
        let mut inserted = false;
        for event in events {
            inserted |= self.handle_load_event(event);
        }
        inserted
    }

    /// React to one load event. Returns `true` when a model was inserted.
    pub fn handle_load_event(&mut self, event: LoadEvent) -> bool {
        match event {
            LoadEvent::Progress(percent) => {
                info!("{percent:.0}% loaded");
                false
            }
            LoadEvent::Loaded(asset) => {
                self.insert_model(asset);
                true
            }
            LoadEvent::Failed(err) => {
                error!("model load failed: {err}");
                false
            }
        }
    }

    /// Place a loaded model under the root and remember its node.
    pub fn insert_model(&mut self, asset: ModelAsset) -> NodeId {
        let vertices = asset.vertex_count();
        let root = self.scene.add(
            asset.name.clone(),
            NodeKind::Group,
            SceneAssembler::model_transform(),
        );
        for (i, part) in asset.parts.into_iter().enumerate() {
            let kind = NodeKind::Mesh(MeshNode {
                mesh: part.mesh,
                material: part.material,
            });
            let name = format!("{}#{i}", asset.name);
            if let Err(err) = self.scene.add_child(root, name, kind, Default::default()) {
                error!("dropping model part: {err}");
            }
        }
        info!(name = %asset.name, vertices, "model inserted");
        self.handles.model = Some(root);
        root
    }
}

impl<R: Renderer> SkyTarget for SceneContext<R> {
    fn sky_mut(&mut self) -> Option<&mut Sky> {
        self.scene.sky_mut(self.handles.sky)
    }

    fn set_exposure(&mut self, exposure: f32) {
        self.renderer.set_tone_mapping_exposure(exposure);
    }

    fn render(&mut self) {
        SceneContext::render(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::SceneSettings;
    use crate::asset::{AssetLoadError, ModelPart};
    use crate::geometry::MeshData;
    use crate::graph::Material;
    use crate::renderer::HeadlessRenderer;
    use std::path::PathBuf;

    fn build() -> SceneContext<HeadlessRenderer> {
        SceneAssembler::build_scene(&SceneSettings::default(), HeadlessRenderer::new(), (1280, 720))
    }

    struct FailingLoader;

    impl AssetLoader for FailingLoader {
        fn load(&self, path: &Path) -> PendingLoad {
            let (sender, receiver) = crossbeam_channel::unbounded();
            sender.send(LoadEvent::Progress(40.0)).unwrap();
            sender
                .send(LoadEvent::Failed(AssetLoadError::MissingPositions {
                    path: path.to_path_buf(),
                }))
                .unwrap();
            PendingLoad::new(path.to_path_buf(), receiver)
        }
    }

    struct ReadyLoader;

    impl AssetLoader for ReadyLoader {
        fn load(&self, path: &Path) -> PendingLoad {
            let (sender, receiver) = crossbeam_channel::unbounded();
            sender
                .send(LoadEvent::Loaded(ModelAsset {
                    name: "logo".to_string(),
                    parts: vec![ModelPart {
                        mesh: MeshData::cuboid(1.0, 1.0, 1.0),
                        material: Material::default(),
                    }],
                }))
                .unwrap();
            PendingLoad::new(path.to_path_buf(), receiver)
        }
    }

    #[test]
    fn test_resize_updates_camera_and_renderer() {
        let mut ctx = build();
        let before = ctx.renderer().frames_rendered();
        ctx.on_window_resize(1024, 512);
        assert_eq!(ctx.camera().aspect_ratio, 2.0);
        assert_eq!(ctx.renderer().size(), (1024, 512));
        assert_eq!(ctx.renderer().frames_rendered(), before + 1);
    }

    #[test]
    fn test_resize_clamps_zero() {
        let mut ctx = build();
        ctx.on_window_resize(0, 300);
        assert_eq!(ctx.renderer().size(), (1, 300));
        assert!(ctx.camera().aspect_ratio.is_finite());
    }

    #[test]
    fn test_failed_load_leaves_static_scene() {
        let mut ctx = build();
        ctx.request_model(&FailingLoader, &PathBuf::from("assets/M-Logo.glb"));
        assert!(ctx.model_pending());
        assert!(!ctx.poll_model_load());
        assert!(!ctx.model_pending());
        assert!(ctx.handles().model.is_none());

        let root = ctx.scene().root();
        assert_eq!(ctx.scene().children(root).len(), 3);

        let before = ctx.renderer().frames_rendered();
        ctx.render();
        assert_eq!(ctx.renderer().frames_rendered(), before + 1);
        assert_eq!(ctx.renderer().last_frame().unwrap().mesh_count, 1);
    }

    #[test]
    fn test_loaded_model_is_placed() {
        let mut ctx = build();
        ctx.request_model(&ReadyLoader, Path::new("logo.glb"));
        assert!(ctx.poll_model_load());
        let model = ctx.handles().model.unwrap();
        let node = ctx.scene().get(model).unwrap();
        assert_eq!(node.transform, SceneAssembler::model_transform());
        assert_eq!(ctx.scene().children(model).len(), 1);
        assert_eq!(ctx.scene().children(ctx.scene().root()).len(), 4);
        ctx.render();
        assert_eq!(ctx.renderer().last_frame().unwrap().mesh_count, 2);
    }

    #[test]
    fn test_second_request_is_ignored() {
        let mut ctx = build();
        ctx.request_model(&ReadyLoader, Path::new("logo.glb"));
        ctx.poll_model_load();
        ctx.request_model(&ReadyLoader, Path::new("logo.glb"));
        assert!(!ctx.model_pending());
        assert_eq!(ctx.scene().children(ctx.scene().root()).len(), 4);
    }

    #[test]
    fn test_poll_without_request() {
        let mut ctx = build();
        assert!(!ctx.poll_model_load());
    }

    #[test]
    fn test_apply_twice_gives_identical_uniforms() {
        let mut ctx = build();
        let first = *ctx.scene().sky(ctx.handles().sky).unwrap();
        ctx.apply_sky_parameters();
        let second = *ctx.scene().sky(ctx.handles().sky).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sky_target_resolves_sky_node() {
        let mut ctx = build();
        let expected = *ctx.scene().sky(ctx.handles().sky).unwrap();
        let sky = SkyTarget::sky_mut(&mut ctx).expect("assembled scene has a sky");
        assert_eq!(*sky, expected);
    }

    #[test]
    fn test_set_sky_parameter_applies_and_renders() {
        let mut ctx = build();
        let before = ctx.renderer().frames_rendered();
        ctx.set_sky_parameter(SkyField::Exposure, 0.3);
        assert_eq!(ctx.renderer().tone_mapping_exposure(), 0.3);
        assert_eq!(ctx.renderer().frames_rendered(), before + 1);
        ctx.set_sky_parameter(SkyField::Elevation, 45.0);
        let sky = ctx.scene().sky(ctx.handles().sky).unwrap();
        assert_eq!(sky.uniforms.sun_position, horizon_sky::sun_direction(45.0, 153.4));
    }

    #[test]
    fn test_rotate_box_wraps() {
        let mut ctx = build();
        ctx.rotate_box(Vec3::new(TAU + 0.5, -0.25, 0.0));
        let r = ctx.box_rotation();
        assert!((r.x - 0.5).abs() < 1e-5);
        assert!((r.y - (TAU - 0.25)).abs() < 1e-5);
        assert_eq!(r.z, 0.0);
    }

    #[test]
    fn test_orbit_dolly_disabled() {
        let mut ctx = build();
        let position = ctx.camera().position;
        assert!(!ctx.orbit_dolly(3.0));
        assert_eq!(ctx.camera().position, position);
    }

    #[test]
    fn test_orbit_rotate_moves_camera() {
        let mut ctx = build();
        let position = ctx.camera().position;
        ctx.orbit_rotate(50.0, 0.0);
        assert!((ctx.camera().position - position).length() > 1.0);
    }
}
