//! Arena scene graph.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. Nodes are
//! never removed, so an id handed out by a scene stays valid for that scene's
//! lifetime. Every node except the root has exactly one parent.

use glam::{EulerRot, Mat4, Quat, Vec3};
use horizon_sky::Sky;
use thiserror::Error;

use crate::color::Color;
use crate::geometry::MeshData;

/// Handle to a node in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} does not belong to this scene")]
    UnknownNode(NodeId),
}

/// Local transform: translation, XYZ Euler rotation in radians, scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Rotation as a quaternion, X applied outermost.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local-to-parent matrix: translate * rotate * scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A surface material. Only a base color is needed here.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub mesh: MeshData,
    pub material: Material,
}

/// A cone light aimed at `target`, with three-style defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    /// World-space point the light is aimed at.
    pub target: Vec3,
    /// Half-angle of the cone, radians.
    pub angle: f32,
    /// Fraction of the cone over which the edge softens.
    pub penumbra: f32,
    /// Range; 0 means unlimited.
    pub distance: f32,
    pub decay: f32,
}

impl SpotLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            target: Vec3::ZERO,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            distance: 0.0,
            decay: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Sky(Sky),
    Mesh(MeshNode),
    Light(SpotLight),
    /// Pure transform node, e.g. the root of a loaded model.
    Group,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The scene graph. Created with a single root node.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "scene".to_string(),
                transform: Transform::IDENTITY,
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Attach a new node under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        if parent.0 >= self.nodes.len() {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            transform,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Attach a new node directly under the root.
    pub fn add(&mut self, name: impl Into<String>, kind: NodeKind, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            transform,
            kind,
            parent: Some(NodeId(0)),
            children: Vec::new(),
        });
        self.nodes[0].children.push(id);
        id
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Local-to-world matrix, composing every ancestor's transform.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.get(id);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|p| self.get(p));
        }
        matrix
    }

    pub fn sky(&self, id: NodeId) -> Option<&Sky> {
        match &self.get(id)?.kind {
            NodeKind::Sky(sky) => Some(sky),
            _ => None,
        }
    }

    pub fn sky_mut(&mut self, id: NodeId) -> Option<&mut Sky> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Sky(sky) => Some(sky),
            _ => None,
        }
    }

    /// The first sky in the scene with its world matrix.
    pub fn find_sky(&self) -> Option<(&Sky, Mat4)> {
        self.iter().find_map(|(id, node)| match &node.kind {
            NodeKind::Sky(sky) => Some((sky, self.world_matrix(id))),
            _ => None,
        })
    }

    /// Every mesh node with its world matrix.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &MeshNode, Mat4)> {
        self.iter().filter_map(|(id, node)| match &node.kind {
            NodeKind::Mesh(mesh) => Some((id, mesh, self.world_matrix(id))),
            _ => None,
        })
    }

    /// Every spot light with its world-space position.
    pub fn lights(&self) -> impl Iterator<Item = (NodeId, &SpotLight, Vec3)> {
        self.iter().filter_map(|(id, node)| match &node.kind {
            NodeKind::Light(light) => Some((id, light, self.world_matrix(id).w_axis.truncate())),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
