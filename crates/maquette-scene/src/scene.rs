//! Scene graph owned by a viewer session

use glam::Vec3;

use crate::geometry::Mesh;

/// Background color of the standard scene (light gray, #f0f0f0)
const BACKGROUND: [f32; 4] = [0.941, 0.941, 0.941, 1.0];

/// Light sources the renderer may honor
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        position: Vec3,
    },
}

/// Background, lights, and decoded meshes for one viewer session
///
/// The owning session is the only mutator; decoded geometry arrives
/// through the session's guarded insert path, never directly.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub background: [f32; 4],
    pub lights: Vec<Light>,
    pub meshes: Vec<Mesh>,
}

impl Scene {
    /// The standard viewer setup: light-gray background, white ambient
    /// light at 0.6, white directional light at 0.8 from (10, 20, 15).
    pub fn standard() -> Self {
        Self {
            background: BACKGROUND,
            lights: vec![
                Light::Ambient {
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.6,
                },
                Light::Directional {
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.8,
                    position: Vec3::new(10.0, 20.0, 15.0),
                },
            ],
            meshes: Vec::new(),
        }
    }

    pub fn insert_meshes(&mut self, meshes: Vec<Mesh>) {
        self.meshes.extend(meshes);
    }

    /// True while no geometry has been inserted; the renderer must
    /// tolerate this (decode completes after the first frames).
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}
