//! Maquette Scene - Camera, scene graph, and geometry decoding
//!
//! This crate provides the CPU side of the viewer:
//! - An orbit camera with three.js-compatible zoom semantics
//! - GLB/glTF and OBJ geometry decoding into flat mesh data
//! - A small scene graph (background, lights, meshes) owned by one
//!   viewer session at a time
//!
//! Rasterization itself lives behind the viewer's `Renderer` trait; this
//! crate never touches a GPU.

pub mod camera;
pub mod geometry;
pub mod scene;

pub use camera::OrbitCamera;
pub use geometry::{decode_by_name, decode_geometry, DecodeError, Mesh};
pub use scene::{Light, Scene};
