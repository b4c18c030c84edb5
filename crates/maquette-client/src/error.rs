//! API error kinds and HTTP status mapping

use maquette_core::ViewpointError;
use thiserror::Error;

use crate::session::StoreError;

/// Failure of a single backend request
///
/// Every operation is attempted exactly once; a failure is terminal for
/// that attempt and the caller decides whether to retry manually.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the bearer token (HTTP 401). The session
    /// store has already been cleared when this is returned.
    #[error("session expired, please log in again")]
    AuthExpired,
    #[error("access denied")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },
    #[error("request timed out")]
    Timeout,
    #[error("network failure: {0}")]
    Network(reqwest::Error),
    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed token: {0}")]
    Token(String),
    #[error("validation failure: {0}")]
    Validation(#[from] ViewpointError),
    #[error("credential store failure: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Classify a transport-level failure, separating timeouts from
    /// other network errors.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }
}
