//! Maquette Viewer - Session lifecycle for viewing one model
//!
//! A [`ViewerSession`] owns everything needed to view a single model:
//! the fetched metadata and binary payload, the scene graph and orbit
//! camera, the frame loop, and the saved viewpoints. Sessions move
//! through `Idle -> Loading -> Ready -> (Error | Closed)`; geometry
//! decoding runs as a cancellable task whose late results are ignored
//! once the session closes.

pub mod render;
pub mod session;

pub use render::{FrameLoop, HeadlessRenderer, Renderer, Stage};
pub use session::{ErrorKind, PayloadHandle, SessionState, ViewerError, ViewerSession};
