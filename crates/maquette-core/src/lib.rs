//! Maquette Core - Shared types for the model hosting client
//!
//! This crate provides the foundational types for the Maquette system:
//! - Model metadata and supported file formats
//! - Saved camera viewpoints and their validation rules
//! - Session credentials for the authenticated user

pub mod credentials;
pub mod model;
pub mod viewpoint;

pub use credentials::Credentials;
pub use model::{Model, ModelFormat, ModelId};
pub use viewpoint::{Viewpoint, ViewpointDraft, ViewpointError};
