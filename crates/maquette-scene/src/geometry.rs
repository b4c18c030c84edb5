//! Geometry decoding for GLB/glTF and OBJ payloads
//!
//! Decoders produce flat CPU-side meshes (positions + triangle indices);
//! materials, textures, and animations are ignored. Which decoder runs is
//! decided purely by file extension, and an unsupported extension fails
//! before any decode work happens.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use glam::Vec3;
use maquette_core::ModelFormat;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },
    #[error("failed to decode glTF geometry: {0}")]
    Gltf(String),
    #[error("failed to decode OBJ geometry: {0}")]
    Obj(String),
    #[error("model contains no geometry")]
    Empty,
}

/// A decoded triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some((min, max))
    }
}

/// Decode a payload whose format is taken from the file name's extension
pub fn decode_by_name(bytes: &[u8], file_name: &str) -> Result<Vec<Mesh>, DecodeError> {
    let format = ModelFormat::from_name(file_name).ok_or_else(|| DecodeError::UnsupportedFormat {
        extension: file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default(),
    })?;
    decode_geometry(bytes, format)
}

/// Decode a payload with a known format
pub fn decode_geometry(bytes: &[u8], format: ModelFormat) -> Result<Vec<Mesh>, DecodeError> {
    let meshes = match format {
        ModelFormat::Glb | ModelFormat::Gltf => decode_gltf(bytes)?,
        ModelFormat::Obj => decode_obj(bytes)?,
    };

    if meshes.iter().all(|m| m.positions.is_empty()) {
        return Err(DecodeError::Empty);
    }
    debug!(
        meshes = meshes.len(),
        vertices = meshes.iter().map(Mesh::vertex_count).sum::<usize>(),
        "Decoded geometry"
    );
    Ok(meshes)
}

fn decode_gltf(bytes: &[u8]) -> Result<Vec<Mesh>, DecodeError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| DecodeError::Gltf(e.to_string()))?;
    let blob = gltf.blob.clone();
    let buffers = resolve_buffers(&gltf.document, blob)?;

    let mut meshes = Vec::new();
    for mesh in gltf.document.meshes() {
        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh-{}", mesh.index()));
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| b.as_slice()));
            let positions: Vec<Vec3> = match reader.read_positions() {
                Some(positions) => positions.map(Vec3::from_array).collect(),
                None => continue,
            };
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                // Non-indexed primitive: consecutive vertices form triangles
                None => (0..positions.len() as u32).collect(),
            };
            meshes.push(Mesh {
                name: name.clone(),
                positions,
                indices,
            });
        }
    }
    Ok(meshes)
}

/// Materialize every buffer the document references. Binary payloads come
/// from the GLB blob; `.gltf` JSON may embed buffers as base64 data URIs.
/// External file references cannot be satisfied from a byte payload.
fn resolve_buffers(
    document: &gltf::Document,
    mut blob: Option<Vec<u8>>,
) -> Result<Vec<Vec<u8>>, DecodeError> {
    let mut buffers = Vec::new();
    for buffer in document.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => blob
                .take()
                .ok_or_else(|| DecodeError::Gltf("missing binary chunk".to_string()))?,
            gltf::buffer::Source::Uri(uri) => decode_data_uri(uri)?,
        };
        if data.len() < buffer.length() {
            return Err(DecodeError::Gltf(format!(
                "buffer {} shorter than declared length",
                buffer.index()
            )));
        }
        buffers.push(data);
    }
    Ok(buffers)
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, DecodeError> {
    let rest = uri.strip_prefix("data:").ok_or_else(|| {
        DecodeError::Gltf(format!("external buffer references are not supported: {uri}"))
    })?;
    let (_, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| DecodeError::Gltf("buffer data URI is not base64".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::Gltf(format!("invalid base64 buffer: {e}")))
}

fn decode_obj(bytes: &[u8]) -> Result<Vec<Mesh>, DecodeError> {
    let mut reader = std::io::Cursor::new(bytes);
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        // Materials are ignored; satisfy mtllib references with nothing
        |_| Ok(Default::default()),
    )
    .map_err(|e| DecodeError::Obj(e.to_string()))?;

    let mut meshes = Vec::new();
    for model in models {
        let positions: Vec<Vec3> = model
            .mesh
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        meshes.push(Mesh {
            name: model.name,
            positions,
            indices: model.mesh.indices,
        });
    }
    Ok(meshes)
}
