//! Asynchronous model loading.
//!
//! A loader returns a [`PendingLoad`] at once and does the file read and glTF
//! parse on a worker thread. Events arrive over a channel and are drained by
//! the owner of the scene with [`PendingLoad::poll`], so only that thread ever
//! touches the scene graph.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use glam::Mat4;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::color::Color;
use crate::geometry::MeshData;
use crate::graph::Material;

/// Bytes read between progress reports.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Guards against malformed node hierarchies.
const MAX_NODE_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{path} contains no triangle mesh with positions")]
    MissingPositions { path: PathBuf },
    #[error("loader for {path} stopped without a result")]
    Disconnected { path: PathBuf },
}

/// One drawable piece of a model, already in model-root space.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPart {
    pub mesh: MeshData,
    pub material: Material,
}

/// A parsed model ready to be inserted into a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub name: String,
    pub parts: Vec<ModelPart>,
}

impl ModelAsset {
    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.vertex_count()).sum()
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    /// Percent of the file read so far, `0..=100`.
    Progress(f32),
    Loaded(ModelAsset),
    Failed(AssetLoadError),
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress(_))
    }
}

/// Receiving end of one load. Yields progress, then exactly one of
/// [`LoadEvent::Loaded`] or [`LoadEvent::Failed`].
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    receiver: Receiver<LoadEvent>,
    finished: bool,
}

impl PendingLoad {
    pub fn new(path: PathBuf, receiver: Receiver<LoadEvent>) -> Self {
        Self {
            path,
            receiver,
            finished: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the terminal event has been handed out.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the events available now without blocking.
    ///
    /// A sender that goes away before the terminal event turns into
    /// [`AssetLoadError::Disconnected`]. Nothing is returned after the
    /// terminal event.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while !self.finished {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.finished = event.is_terminal();
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    events.push(LoadEvent::Failed(AssetLoadError::Disconnected {
                        path: self.path.clone(),
                    }));
                }
            }
        }
        events
    }

    /// Block until the load ends, discarding progress.
    pub fn wait(mut self) -> Result<ModelAsset, AssetLoadError> {
        while !self.finished {
            match self.receiver.recv() {
                Ok(LoadEvent::Progress(_)) => {}
                Ok(LoadEvent::Loaded(asset)) => return Ok(asset),
                Ok(LoadEvent::Failed(err)) => return Err(err),
                Err(_) => break,
            }
        }
        self.finished = true;
        Err(AssetLoadError::Disconnected { path: self.path })
    }
}

/// Starts model loads.
pub trait AssetLoader {
    fn load(&self, path: &Path) -> PendingLoad;
}

/// Loads `.glb` / `.gltf` files on a background thread.
#[derive(Debug, Clone)]
pub struct GltfLoader {
    chunk_size: usize,
}

impl GltfLoader {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader for GltfLoader {
    #[instrument(skip(self))]
    fn load(&self, path: &Path) -> PendingLoad {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let path = path.to_path_buf();
        let worker_path = path.clone();
        let worker_sender = sender.clone();
        let chunk_size = self.chunk_size;

        let spawned = thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                let event = match read_with_progress(&worker_path, chunk_size, &worker_sender)
                    .and_then(|bytes| parse_model(&bytes, &worker_path))
                {
                    Ok(asset) => LoadEvent::Loaded(asset),
                    Err(err) => LoadEvent::Failed(err),
                };
                // The receiver may be gone if the scene was dropped mid-load.
                let _ = worker_sender.send(event);
            });

        if let Err(source) = spawned {
            let _ = sender.send(LoadEvent::Failed(AssetLoadError::Io {
                path: path.clone(),
                source,
            }));
        }
        PendingLoad::new(path, receiver)
    }
}

fn read_with_progress(
    path: &Path,
    chunk_size: usize,
    sender: &Sender<LoadEvent>,
) -> Result<Vec<u8>, AssetLoadError> {
    let io_err = |source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let total = file.metadata().map_err(io_err)?.len();
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let n = file.read(&mut chunk).map_err(io_err)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        if total > 0 {
            let percent = (bytes.len() as f64 / total as f64 * 100.0).min(100.0) as f32;
            if sender.send(LoadEvent::Progress(percent)).is_err() {
                return Err(AssetLoadError::Disconnected {
                    path: path.to_path_buf(),
                });
            }
        }
    }
    Ok(bytes)
}

/// Parse glTF or GLB bytes into a [`ModelAsset`].
///
/// External buffer URIs resolve against the directory of `path`. Node
/// transforms of the default scene are baked into the vertices. Only
/// triangle primitives are kept; missing normals are generated.
pub fn parse_model(bytes: &[u8], path: &Path) -> Result<ModelAsset, AssetLoadError> {
    let parse_err = |source| AssetLoadError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(parse_err)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(parse_err)?;

    let mut parts = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, Mat4::IDENTITY, &buffers, &mut parts, 0);
            }
        }
        None => {
            for mesh in document.meshes() {
                collect_mesh(&mesh, Mat4::IDENTITY, &buffers, &mut parts);
            }
        }
    }

    if parts.is_empty() {
        return Err(AssetLoadError::MissingPositions {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    Ok(ModelAsset { name, parts })
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    parts: &mut Vec<ModelPart>,
    depth: usize,
) {
    if depth > MAX_NODE_DEPTH {
        debug!(node = node.index(), "node hierarchy too deep, skipping");
        return;
    }
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        collect_mesh(&mesh, world, buffers, parts);
    }
    for child in node.children() {
        collect_node(&child, world, buffers, parts, depth + 1);
    }
}

fn collect_mesh(
    mesh: &gltf::Mesh<'_>,
    matrix: Mat4,
    buffers: &[gltf::buffer::Data],
    parts: &mut Vec<ModelPart>,
) {
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            debug!(mesh = mesh.index(), mode = ?primitive.mode(), "skipping non-triangle primitive");
            continue;
        }
        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        if positions.is_empty() {
            continue;
        }
        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let normals = reader
            .read_normals()
            .map(|n| n.collect::<Vec<_>>())
            .unwrap_or_default();

        let mut data = MeshData {
            positions,
            normals,
            indices,
        };
        if data.normals.len() != data.positions.len() {
            data.generate_normals();
        }

        let [r, g, b, _] = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();
        parts.push(ModelPart {
            mesh: data.transformed(matrix),
            material: Material {
                color: Color::from_linear([r, g, b]),
            },
        });
    }
}
