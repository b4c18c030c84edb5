//! Orbit camera state and projection math

use glam::{Mat4, Vec3};
use maquette_core::{Viewpoint, ViewpointDraft};

/// Smallest zoom the on-screen controls can reach
pub const MIN_ZOOM: f32 = 0.2;
/// Zoom step used by the zoom in/out controls
pub const ZOOM_STEP: f32 = 0.2;

/// A perspective camera orbiting a target point
///
/// Zoom follows three.js `PerspectiveCamera.zoom` semantics: it scales
/// the frustum height rather than moving the camera, so position, target,
/// and zoom are three independent scalars a viewpoint can capture.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub position: Vec3,
    /// The point the camera orbits around and looks toward
    pub target: Vec3,
    pub zoom: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            zoom: 1.0,
            fov_y: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aspect(aspect: f32) -> Self {
        let mut camera = Self::default();
        camera.aspect = aspect;
        camera.update_projection();
        camera
    }

    /// Recompute the projection matrix from the current fov, aspect,
    /// near/far planes, and zoom. Must be called after any of those
    /// change; `apply` and the zoom controls call it themselves.
    pub fn update_projection(&mut self) {
        let fov = 2.0 * ((self.fov_y * 0.5).tan() / self.zoom).atan();
        self.projection = Mat4::perspective_rh(fov, self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Snapshot the current position, orbit target, and zoom into a
    /// draft viewpoint.
    pub fn snapshot(&self, name: impl Into<String>) -> ViewpointDraft {
        ViewpointDraft {
            name: name.into(),
            camera_position: self.position.to_array(),
            target_position: self.target.to_array(),
            zoom: self.zoom,
        }
    }

    /// Restore a saved viewpoint: position, target, zoom, and a fresh
    /// projection matrix.
    pub fn apply(&mut self, viewpoint: &Viewpoint) {
        self.position = Vec3::from_array(viewpoint.camera_position);
        self.target = Vec3::from_array(viewpoint.target_position);
        self.zoom = viewpoint.zoom;
        self.update_projection();
    }

    pub fn zoom_in(&mut self) {
        self.zoom += ZOOM_STEP;
        self.update_projection();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
        self.update_projection();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection();
    }

    /// Restore the default pose
    pub fn reset(&mut self) {
        *self = Self::with_aspect(self.aspect);
    }
}
