//! Scene graph, camera and controls, model loading, scene assembly and the
//! frame driver, all behind the [`Renderer`] seam.

pub mod assembler;
pub mod asset;
pub mod camera;
pub mod color;
pub mod context;
pub mod frame;
pub mod geometry;
pub mod graph;
pub mod orbit;
pub mod renderer;

pub use assembler::{SceneAssembler, SceneSettings};
pub use asset::{AssetLoadError, AssetLoader, GltfLoader, LoadEvent, ModelAsset, ModelPart, PendingLoad};
pub use camera::Camera;
pub use color::Color;
pub use context::{SceneContext, SceneHandles};
pub use frame::{BOX_ROTATION_STEP, FrameDriver, FrameOutcome, FrameStats, StopToken};
pub use geometry::MeshData;
pub use graph::{Material, MeshNode, Node, NodeId, NodeKind, Scene, SceneError, SpotLight, Transform};
pub use orbit::OrbitController;
pub use renderer::{FrameRecord, HeadlessRenderer, Renderer, ToneMapping};
