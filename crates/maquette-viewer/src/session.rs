//! Viewer session lifecycle: fetch a model, run the frame loop, manage
//! its saved viewpoints
//!
//! A session is single-use: it views exactly one model. `open` performs
//! the three backend fetches (metadata, binary payload, viewpoint list)
//! concurrently and becomes `Ready` only when all three succeed. The
//! scene and camera are constructed only on that success path, the frame
//! loop starts before geometry decoding completes, and a decode result
//! arriving after `close` is discarded instead of mutating a torn-down
//! scene.

use std::sync::{Arc, Mutex};

use maquette_client::{ApiClient, ApiError};
use maquette_core::{Model, ModelFormat, ModelId, Viewpoint};
use maquette_scene::{decode_geometry, DecodeError, Mesh, OrbitCamera, Scene};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::render::{FrameLoop, HeadlessRenderer, Renderer, Stage};

/// Failure categories surfaced to the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthExpired,
    NotFound,
    Forbidden,
    UnsupportedFormat,
    DecodeFailure,
    Timeout,
    Network,
    /// The backend answered with an unexpected error status
    Backend,
    Validation,
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("model identifier must not be empty")]
    EmptyModelId,
    #[error("this session already has a load in flight or completed")]
    AlreadyOpen,
    #[error("viewer session is closed")]
    Closed,
    #[error("viewer is not ready")]
    NotReady,
    #[error("unknown viewpoint: {0}")]
    UnknownViewpoint(String),
    #[error("validation failure: {0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::Api(ApiError::AuthExpired) => ErrorKind::AuthExpired,
            ViewerError::Api(ApiError::NotFound) => ErrorKind::NotFound,
            ViewerError::Api(ApiError::Forbidden) => ErrorKind::Forbidden,
            ViewerError::Api(ApiError::Timeout) => ErrorKind::Timeout,
            ViewerError::Api(ApiError::Network(_)) => ErrorKind::Network,
            ViewerError::Api(ApiError::UnsupportedFormat { .. }) => ErrorKind::UnsupportedFormat,
            ViewerError::Api(ApiError::Validation(_)) => ErrorKind::Validation,
            ViewerError::Api(_) => ErrorKind::Backend,
            ViewerError::Decode(DecodeError::UnsupportedFormat { .. }) => {
                ErrorKind::UnsupportedFormat
            }
            ViewerError::Decode(_) => ErrorKind::DecodeFailure,
            _ => ErrorKind::Validation,
        }
    }

    /// Short message shown to the user
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::AuthExpired => "Session expired. Please login again.",
            ErrorKind::UnsupportedFormat => "Unsupported file format",
            ErrorKind::DecodeFailure => "Failed to load 3D model",
            ErrorKind::Validation => "Invalid input",
            _ => "Failed to load model",
        }
        .to_string()
    }

    /// Longer hint accompanying the message
    pub fn detail(&self) -> String {
        match self.kind() {
            ErrorKind::DecodeFailure => {
                "The file might be corrupted or incompatible".to_string()
            }
            ErrorKind::Network | ErrorKind::Timeout => {
                "Please check your network connection".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Lifecycle of a viewer session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Error {
        kind: ErrorKind,
        message: String,
        detail: String,
    },
    Closed,
}

/// In-memory handle to the fetched binary payload, released on close.
/// The id stands in for the temporary object URL the hosted viewer used.
#[derive(Debug, Clone)]
pub struct PayloadHandle {
    id: Uuid,
    bytes: Arc<Vec<u8>>,
}

impl PayloadHandle {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

struct Inner {
    state: SessionState,
    renderer: Option<Box<dyn Renderer>>,
    model: Option<Model>,
    payload: Option<PayloadHandle>,
    stage: Option<Arc<Mutex<Stage>>>,
    viewpoints: Vec<Viewpoint>,
    active_viewpoint: Option<String>,
    frame_loop: Option<FrameLoop>,
    decode_task: Option<JoinHandle<()>>,
}

/// Controller for viewing one model and its saved viewpoints
pub struct ViewerSession {
    client: Arc<ApiClient>,
    inner: Arc<Mutex<Inner>>,
}

impl ViewerSession {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self::with_renderer(client, Box::new(HeadlessRenderer))
    }

    pub fn with_renderer(client: Arc<ApiClient>, renderer: Box<dyn Renderer>) -> Self {
        Self {
            client,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle,
                renderer: Some(renderer),
                model: None,
                payload: None,
                stage: None,
                viewpoints: Vec::new(),
                active_viewpoint: None,
                frame_loop: None,
                decode_task: None,
            })),
        }
    }

    /// Load a model into this session.
    ///
    /// Fetches metadata, the binary payload, and the viewpoint list
    /// concurrently; the session becomes `Ready` only when all three
    /// succeed. A second `open` on the same session is rejected with
    /// [`ViewerError::AlreadyOpen`] whether the first is still in flight
    /// or already settled; callers build a fresh session per model.
    pub async fn open(&self, model_id: &ModelId) -> Result<(), ViewerError> {
        if model_id.is_blank() {
            return Err(ViewerError::EmptyModelId);
        }

        {
            let mut inner = self.inner.lock().unwrap();
            match inner.state {
                SessionState::Idle => inner.state = SessionState::Loading,
                SessionState::Closed => return Err(ViewerError::Closed),
                _ => return Err(ViewerError::AlreadyOpen),
            }
        }

        info!(model = %model_id, "Opening viewer session");
        match self.load(model_id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    async fn load(&self, model_id: &ModelId) -> Result<(), ViewerError> {
        let (model, payload, viewpoints) = tokio::try_join!(
            async { self.client.model_by_id(model_id).await.map_err(ViewerError::from) },
            async { self.client.model_file(model_id).await.map_err(ViewerError::from) },
            async { self.client.viewpoints(model_id).await.map_err(ViewerError::from) },
        )?;

        // Extension gate: decided before any scene work or decode attempt
        let format = ModelFormat::from_extension(&model.file_extension).ok_or_else(|| {
            DecodeError::UnsupportedFormat {
                extension: model.file_extension.clone(),
            }
        })?;

        let payload = PayloadHandle::new(payload);
        let mut inner = self.inner.lock().unwrap();
        if inner.state != SessionState::Loading {
            // close() won the race while the fetches were in flight
            debug!(model = %model_id, "Session closed during load, discarding fetched model");
            return Err(ViewerError::Closed);
        }

        let stage = Arc::new(Mutex::new(Stage {
            scene: Scene::standard(),
            camera: OrbitCamera::new(),
        }));

        // The frame loop starts before geometry decoding completes; the
        // renderer sees an empty scene until the decode task reports in.
        let renderer = inner.renderer.take().unwrap_or_else(|| Box::new(HeadlessRenderer));
        inner.frame_loop = Some(FrameLoop::spawn(renderer, stage.clone()));
        inner.decode_task = Some(Self::spawn_decode(
            self.inner.clone(),
            payload.bytes.clone(),
            format,
        ));

        info!(
            model = %model_id,
            name = %model.original_name,
            viewpoints = viewpoints.len(),
            payload_bytes = payload.len(),
            "Viewer session ready"
        );

        inner.stage = Some(stage);
        inner.model = Some(model);
        inner.payload = Some(payload);
        inner.viewpoints = viewpoints;
        inner.state = SessionState::Ready;
        Ok(())
    }

    /// Decode geometry off the async threads and insert it into the
    /// still-running scene. The task is owned by the session and aborted
    /// on close, and a result that arrives after close is dropped.
    fn spawn_decode(
        inner: Arc<Mutex<Inner>>,
        bytes: Arc<Vec<u8>>,
        format: ModelFormat,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let decoded =
                tokio::task::spawn_blocking(move || decode_geometry(&bytes, format)).await;
            match decoded {
                Ok(Ok(meshes)) => Self::insert_decoded(&inner, meshes),
                Ok(Err(err)) => Self::fail_decode(&inner, err),
                Err(join_err) => {
                    if !join_err.is_cancelled() {
                        warn!(error = %join_err, "Geometry decode task failed");
                    }
                }
            }
        })
    }

    fn insert_decoded(inner: &Arc<Mutex<Inner>>, meshes: Vec<Mesh>) {
        let inner = inner.lock().unwrap();
        if inner.state == SessionState::Closed {
            debug!("Ignoring decoded geometry for a closed session");
            return;
        }
        if let Some(stage) = &inner.stage {
            let mut stage = stage.lock().unwrap();
            stage.scene.insert_meshes(meshes);
            info!(
                meshes = stage.scene.mesh_count(),
                triangles = stage.scene.triangle_count(),
                "Inserted decoded geometry"
            );
        }
    }

    fn fail_decode(inner: &Arc<Mutex<Inner>>, err: DecodeError) {
        let mut inner = inner.lock().unwrap();
        if inner.state == SessionState::Closed {
            return;
        }
        let err = ViewerError::from(err);
        warn!(error = %err, "Geometry decode failed");
        // The frame loop keeps running; the session just has no mesh
        inner.state = SessionState::Error {
            kind: err.kind(),
            message: err.user_message(),
            detail: err.detail(),
        };
    }

    fn fail(&self, err: &ViewerError) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == SessionState::Closed {
            return;
        }
        warn!(error = %err, "Viewer session failed");
        inner.state = SessionState::Error {
            kind: err.kind(),
            message: err.user_message(),
            detail: err.detail(),
        };
    }

    /// Snapshot the current camera into a named viewpoint and persist it.
    /// On success the viewpoint is prepended to the list (newest first);
    /// on failure the list and the camera are left untouched.
    pub async fn capture_viewpoint(&self, name: &str) -> Result<Viewpoint, ViewerError> {
        if name.trim().is_empty() {
            return Err(ViewerError::Validation(
                "viewpoint name must not be empty".to_string(),
            ));
        }

        let (model_id, draft) = {
            let inner = self.inner.lock().unwrap();
            if inner.state != SessionState::Ready {
                return Err(ViewerError::NotReady);
            }
            let model = inner.model.as_ref().ok_or(ViewerError::NotReady)?;
            let stage = inner.stage.as_ref().ok_or(ViewerError::NotReady)?;
            let draft = stage.lock().unwrap().camera.snapshot(name.trim());
            (model.id.clone(), draft)
        };

        let saved = self.client.save_viewpoint(&model_id, &draft).await?;
        info!(viewpoint = %saved.id, name = %saved.name, "Saved viewpoint");

        let mut inner = self.inner.lock().unwrap();
        if inner.state == SessionState::Ready {
            inner.viewpoints.insert(0, saved.clone());
        }
        Ok(saved)
    }

    /// Restore a saved viewpoint. Pure client-side: no network call. The
    /// id must reference a member of the current list; otherwise the
    /// camera is left untouched.
    pub fn apply_viewpoint(&self, viewpoint_id: &str) -> Result<(), ViewerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != SessionState::Ready {
            return Err(ViewerError::NotReady);
        }
        let viewpoint = inner
            .viewpoints
            .iter()
            .find(|v| v.id == viewpoint_id)
            .cloned()
            .ok_or_else(|| ViewerError::UnknownViewpoint(viewpoint_id.to_string()))?;

        let stage = inner.stage.as_ref().ok_or(ViewerError::NotReady)?.clone();
        stage.lock().unwrap().camera.apply(&viewpoint);
        inner.active_viewpoint = Some(viewpoint.id.clone());
        debug!(viewpoint = %viewpoint.id, "Applied viewpoint");
        Ok(())
    }

    /// Zoom controls, mirroring the viewer's on-screen buttons
    pub fn zoom_in(&self) -> Result<(), ViewerError> {
        self.with_camera(|camera| camera.zoom_in())
    }

    pub fn zoom_out(&self) -> Result<(), ViewerError> {
        self.with_camera(|camera| camera.zoom_out())
    }

    /// Reset the camera to its default pose and drop the active viewpoint
    pub fn reset_view(&self) -> Result<(), ViewerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != SessionState::Ready {
            return Err(ViewerError::NotReady);
        }
        let stage = inner.stage.as_ref().ok_or(ViewerError::NotReady)?.clone();
        stage.lock().unwrap().camera.reset();
        inner.active_viewpoint = None;
        Ok(())
    }

    fn with_camera(&self, f: impl FnOnce(&mut OrbitCamera)) -> Result<(), ViewerError> {
        let inner = self.inner.lock().unwrap();
        if inner.state != SessionState::Ready {
            return Err(ViewerError::NotReady);
        }
        let stage = inner.stage.as_ref().ok_or(ViewerError::NotReady)?;
        f(&mut stage.lock().unwrap().camera);
        Ok(())
    }

    /// Release the frame loop, the decode task, and the payload handle.
    /// Idempotent and safe to call from any state.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == SessionState::Closed {
            return;
        }
        if let Some(mut frame_loop) = inner.frame_loop.take() {
            frame_loop.stop();
        }
        if let Some(task) = inner.decode_task.take() {
            task.abort();
        }
        inner.payload = None;
        inner.stage = None;
        inner.state = SessionState::Closed;
        info!("Viewer session closed");
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn model(&self) -> Option<Model> {
        self.inner.lock().unwrap().model.clone()
    }

    /// Saved viewpoints, newest first
    pub fn viewpoints(&self) -> Vec<Viewpoint> {
        self.inner.lock().unwrap().viewpoints.clone()
    }

    /// The most recently applied viewpoint id, if any
    pub fn active_viewpoint(&self) -> Option<String> {
        self.inner.lock().unwrap().active_viewpoint.clone()
    }

    /// Handle to the fetched binary payload while the session holds one
    pub fn payload(&self) -> Option<PayloadHandle> {
        self.inner.lock().unwrap().payload.clone()
    }

    pub fn camera(&self) -> Option<OrbitCamera> {
        let inner = self.inner.lock().unwrap();
        inner
            .stage
            .as_ref()
            .map(|stage| stage.lock().unwrap().camera.clone())
    }

    pub fn mesh_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .stage
            .as_ref()
            .map(|stage| stage.lock().unwrap().scene.mesh_count())
            .unwrap_or(0)
    }

    pub fn frames_rendered(&self) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner
            .frame_loop
            .as_ref()
            .map(|frame_loop| frame_loop.frames())
            .unwrap_or(0)
    }

    /// True once the decode task has settled (or was never started)
    pub fn decode_settled(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .decode_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(true)
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.close();
    }
}
