//! Model metadata and supported file formats

use serde::{Deserialize, Serialize};

/// Unique identifier for an uploaded model, assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace-only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Metadata for an uploaded 3D model
///
/// Owned by the backend; the client holds a read-only copy for the
/// duration of a viewer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: ModelId,
    /// Filename the model was uploaded under (e.g. "cube.glb")
    pub original_name: String,
    /// File extension without the leading dot (e.g. "glb")
    pub file_extension: String,
}

impl Model {
    /// Resolve the model's format from its stored extension
    pub fn format(&self) -> Option<ModelFormat> {
        ModelFormat::from_extension(&self.file_extension)
    }
}

/// Supported 3D model file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Binary glTF
    Glb,
    /// JSON glTF with embedded buffers
    Gltf,
    /// Wavefront OBJ text
    Obj,
}

impl ModelFormat {
    /// Resolve a format from a file extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "glb" => Some(ModelFormat::Glb),
            "gltf" => Some(ModelFormat::Gltf),
            "obj" => Some(ModelFormat::Obj),
            _ => None,
        }
    }

    /// Resolve a format from a file name (e.g. "cube.glb")
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ModelFormat::Glb => "glb",
            ModelFormat::Gltf => "gltf",
            ModelFormat::Obj => "obj",
        }
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
