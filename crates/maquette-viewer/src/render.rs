//! Frame loop driving a renderer over the shared stage

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use maquette_scene::{OrbitCamera, Scene};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// A frame sink. Real implementations rasterize; the session only
/// requires that a renderer tolerates an empty scene (geometry arrives
/// after the first frames) and never blocks a tick on I/O.
pub trait Renderer: Send + 'static {
    fn render(&mut self, scene: &Scene, camera: &OrbitCamera);
}

impl Renderer for Box<dyn Renderer> {
    fn render(&mut self, scene: &Scene, camera: &OrbitCamera) {
        (**self).render(scene, camera);
    }
}

/// Renderer that draws nothing; stands in for a GPU backend in tests
/// and headless runs
#[derive(Debug, Default)]
pub struct HeadlessRenderer;

impl Renderer for HeadlessRenderer {
    fn render(&mut self, _scene: &Scene, _camera: &OrbitCamera) {}
}

/// Shared render state: the scene graph and the camera viewing it
#[derive(Debug)]
pub struct Stage {
    pub scene: Scene,
    pub camera: OrbitCamera,
}

/// Repeating per-frame task, cancellable exactly once
pub struct FrameLoop {
    handle: Option<JoinHandle<()>>,
    frames: Arc<AtomicU64>,
}

impl FrameLoop {
    /// Tick cadence, roughly display refresh
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

    /// Start ticking over the given stage. Each tick reads the stage
    /// under its lock and hands it to the renderer; in-flight network
    /// operations never hold that lock, so they cannot block a frame.
    pub fn spawn<R: Renderer>(mut renderer: R, stage: Arc<Mutex<Stage>>) -> Self {
        let frames = Arc::new(AtomicU64::new(0));
        let counter = frames.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Self::FRAME_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                {
                    let stage = stage.lock().unwrap();
                    renderer.render(&stage.scene, &stage.camera);
                }
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        Self {
            handle: Some(handle),
            frames,
        }
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Shared frame counter, outliving the loop itself
    pub fn counter(&self) -> Arc<AtomicU64> {
        self.frames.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Cancel the loop. The first call stops the task; later calls are
    /// no-ops.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Frame loop stopped");
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
