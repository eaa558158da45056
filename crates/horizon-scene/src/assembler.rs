//! One-time construction of the horizon scene.

use glam::Vec3;
use horizon_sky::{ScatteringBinding, Sky, SkyParameterModel, SkyParameters};
use tracing::{info, instrument};

use crate::camera::Camera;
use crate::color::Color;
use crate::context::{SceneContext, SceneHandles};
use crate::geometry::MeshData;
use crate::graph::{Material, MeshNode, NodeKind, Scene, SpotLight, Transform};
use crate::orbit::OrbitController;
use crate::renderer::{Renderer, ToneMapping};

pub const CAMERA_FOV_DEG: f32 = 60.0;
pub const CAMERA_NEAR: f32 = 100.0;
pub const CAMERA_FAR: f32 = 2_000_000.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(200.0, -1000.0, 500.0);

pub const SKY_SCALE: f32 = 4500.0;

pub const BOX_SIZE: Vec3 = Vec3::new(300.0, 40.0, 400.0);
pub const BOX_COLOR: u32 = 0x243c4c;
pub const BOX_POSITION: Vec3 = Vec3::new(-700.0, -100.0, -50.0);

pub const LIGHT_COLOR: u32 = 0x8194a4;
pub const LIGHT_INTENSITY: f32 = 2.0;
pub const LIGHT_POSITION: Vec3 = Vec3::new(200.0, -1000.0, 500.0);

pub const MODEL_SCALE: f32 = 25.0;
pub const MODEL_POSITION: Vec3 = Vec3::new(500.0, -200.0, 250.0);
/// Radians, not degrees.
pub const MODEL_ROTATION: Vec3 = Vec3::new(0.0, -20.0, -20.0);

/// Inputs to [`SceneAssembler::build_scene`].
#[derive(Debug, Clone)]
pub struct SceneSettings {
    pub sky: SkyParameters,
    pub scattering: ScatteringBinding,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f32,
    pub tone_mapping: ToneMapping,
    pub animate_box: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            sky: SkyParameters::default(),
            scattering: ScatteringBinding::default(),
            pixel_ratio: 1.0,
            tone_mapping: ToneMapping::AcesFilmic,
            animate_box: true,
        }
    }
}

/// Builds the static part of the scene.
pub struct SceneAssembler;

impl SceneAssembler {
    /// Create camera, sky, box and light, configure `renderer` for a
    /// `viewport` of logical pixels, bind the orbit controller, then apply
    /// the sky parameters once (which renders the first frame).
    #[instrument(skip(settings, renderer))]
    pub fn build_scene<R: Renderer>(
        settings: &SceneSettings,
        mut renderer: R,
        viewport: (u32, u32),
    ) -> SceneContext<R> {
        let (width, height) = (viewport.0.max(1), viewport.1.max(1));

        let mut camera = Camera::perspective(
            CAMERA_FOV_DEG,
            width as f32 / height as f32,
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        camera.position = CAMERA_POSITION;

        let mut scene = Scene::new();
        let sky = scene.add(
            "sky",
            NodeKind::Sky(Sky::new()),
            Transform::IDENTITY.with_uniform_scale(SKY_SCALE),
        );
        let box_mesh = scene.add(
            "box",
            NodeKind::Mesh(MeshNode {
                mesh: MeshData::cuboid(BOX_SIZE.x, BOX_SIZE.y, BOX_SIZE.z),
                material: Material {
                    color: Color::from_hex(BOX_COLOR),
                },
            }),
            Transform::from_position(BOX_POSITION),
        );
        let light = scene.add(
            "spot-light",
            NodeKind::Light(SpotLight::new(Color::from_hex(LIGHT_COLOR), LIGHT_INTENSITY)),
            Transform::from_position(LIGHT_POSITION),
        );

        renderer.set_pixel_ratio(settings.pixel_ratio);
        renderer.set_size(width, height);
        renderer.set_tone_mapping(settings.tone_mapping);
        renderer.set_tone_mapping_exposure(1.0);

        let mut orbit = OrbitController::new(Vec3::ZERO);
        orbit.enable_zoom = false;
        orbit.enable_pan = true;
        camera.look_at(orbit.target());
        orbit.update(&mut camera);

        let handles = SceneHandles {
            root: scene.root(),
            sky,
            box_mesh,
            light,
            model: None,
        };
        info!(width, height, nodes = scene.len(), "scene assembled");

        let mut context = SceneContext::new(
            scene,
            camera,
            renderer,
            orbit,
            handles,
            SkyParameterModel::new(settings.sky, settings.scattering),
            settings.animate_box,
        );
        context.apply_sky_parameters();
        context
    }

    /// Placement of a loaded model's root node.
    pub fn model_transform() -> Transform {
        Transform::from_position(MODEL_POSITION)
            .with_rotation(MODEL_ROTATION)
            .with_uniform_scale(MODEL_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::renderer::HeadlessRenderer;

    fn build() -> SceneContext<HeadlessRenderer> {
        SceneAssembler::build_scene(&SceneSettings::default(), HeadlessRenderer::new(), (1280, 720))
    }

    #[test]
    fn test_scene_has_sky_box_light_under_root() {
        let ctx = build();
        let scene = ctx.scene();
        let kinds: Vec<_> = scene
            .children(scene.root())
            .iter()
            .map(|id| scene.get(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(kinds, ["sky", "box", "spot-light"]);
    }

    #[test]
    fn test_static_placements() {
        let ctx = build();
        let scene = ctx.scene();
        let handles = ctx.handles();

        let sky = scene.get(handles.sky).unwrap();
        assert_eq!(sky.transform.scale, Vec3::splat(4500.0));

        let box_node = scene.get(handles.box_mesh).unwrap();
        assert_eq!(box_node.transform.position, BOX_POSITION);
        match &box_node.kind {
            NodeKind::Mesh(mesh) => {
                assert_eq!(mesh.material.color.to_hex(), 0x243c4c);
                let (min, max) = mesh.mesh.bounds().unwrap();
                assert_eq!(max - min, Vec3::new(300.0, 40.0, 400.0));
            }
            other => panic!("box is {other:?}"),
        }

        let light = scene.get(handles.light).unwrap();
        assert_eq!(light.transform.position, LIGHT_POSITION);
        match &light.kind {
            NodeKind::Light(spot) => {
                assert_eq!(spot.color.to_hex(), 0x8194a4);
                assert_eq!(spot.intensity, 2.0);
            }
            other => panic!("light is {other:?}"),
        }
    }

    #[test]
    fn test_camera_setup() {
        let ctx = build();
        let camera = ctx.camera();
        assert!((camera.fov_y - 60f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 100.0);
        assert_eq!(camera.far, 2_000_000.0);
        assert!((camera.aspect_ratio - 1280.0 / 720.0).abs() < 1e-6);
        assert!((camera.position - CAMERA_POSITION).length() < 1e-1);
        let to_origin = (-camera.position).normalize();
        assert!((camera.forward() - to_origin).length() < 1e-4);
        assert!(!ctx.orbit().enable_zoom);
        assert!(ctx.orbit().enable_pan);
    }

    #[test]
    fn test_renderer_configured_and_first_frame_rendered() {
        let settings = SceneSettings {
            pixel_ratio: 2.0,
            ..SceneSettings::default()
        };
        let ctx = SceneAssembler::build_scene(&settings, HeadlessRenderer::new(), (640, 480));
        let renderer = ctx.renderer();
        assert_eq!(renderer.size(), (640, 480));
        assert_eq!(renderer.pixel_ratio(), 2.0);
        assert_eq!(renderer.tone_mapping(), ToneMapping::AcesFilmic);
        assert_eq!(renderer.tone_mapping_exposure(), 1.0);
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn test_initial_apply_writes_sky() {
        let ctx = build();
        let sky = ctx.scene().sky(ctx.handles().sky).unwrap();
        assert_eq!(sky.uniforms.turbidity, 30.0);
        assert_eq!(sky.uniforms.mie_directional_g, 0.705);
        let expected = horizon_sky::sun_direction(10.3, 153.4);
        assert!((sky.uniforms.sun_position - expected).length() < 1e-6);
    }

    #[test]
    fn test_zero_viewport_clamps() {
        let ctx = SceneAssembler::build_scene(&SceneSettings::default(), HeadlessRenderer::new(), (0, 0));
        assert_eq!(ctx.renderer().size(), (1, 1));
        assert_eq!(ctx.camera().aspect_ratio, 1.0);
    }

    #[test]
    fn test_model_transform() {
        let t = SceneAssembler::model_transform();
        assert_eq!(t.scale, Vec3::splat(25.0));
        assert_eq!(t.position, Vec3::new(500.0, -200.0, 250.0));
        assert_eq!(t.rotation, Vec3::new(0.0, -20.0, -20.0));
    }
}
