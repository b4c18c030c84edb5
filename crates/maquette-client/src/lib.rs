//! Maquette Client - Session store and REST client for the backend
//!
//! This crate provides the outbound half of the system:
//! - Persistent session store holding the authenticated user's credentials
//! - Client-side decoding of the bearer token payload
//! - API gateway client wrapping every backend endpoint (auth, model CRUD,
//!   viewpoint CRUD) with structured error mapping
//!
//! The backend itself is an external collaborator; nothing here retries,
//! caches, or reorders requests. Every operation is attempted exactly once.

pub mod api;
pub mod error;
pub mod session;
pub mod token;

pub use api::{ApiClient, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use session::{SessionStore, StoreError};
pub use token::{decode_claims, TokenClaims};
