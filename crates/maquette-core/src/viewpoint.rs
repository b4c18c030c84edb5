//! Saved camera viewpoints ("scene states")

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ModelId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewpointError {
    #[error("viewpoint name must not be empty")]
    EmptyName,
    #[error("zoom must be a positive finite number, got {0}")]
    InvalidZoom(f32),
}

/// A persisted camera viewpoint for one model
///
/// Immutable once created; the backend assigns `id` and `created_at`.
/// The orbit target travels under the wire name `rotation`, a legacy
/// field name the backend kept from its first release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewpoint {
    pub id: String,
    pub model_id: ModelId,
    pub name: String,
    pub camera_position: [f32; 3],
    #[serde(rename = "rotation")]
    pub target_position: [f32; 3],
    pub zoom: f32,
    pub created_at: DateTime<Utc>,
}

/// A client-side viewpoint snapshot awaiting persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewpointDraft {
    pub name: String,
    pub camera_position: [f32; 3],
    #[serde(rename = "rotation")]
    pub target_position: [f32; 3],
    pub zoom: f32,
}

impl ViewpointDraft {
    /// Check the invariants a draft must satisfy before submission:
    /// a non-empty name and a positive, finite zoom scalar.
    pub fn validate(&self) -> Result<(), ViewpointError> {
        if self.name.trim().is_empty() {
            return Err(ViewpointError::EmptyName);
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(ViewpointError::InvalidZoom(self.zoom));
        }
        Ok(())
    }
}
