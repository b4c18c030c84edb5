//! Client-side bearer token payload decoding
//!
//! The backend issues JWTs whose payload carries the user's email and
//! username. The client decodes that payload to populate the session
//! store; it does NOT verify the signature - token verification is the
//! backend's job on every authenticated request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::ApiError;

/// Claims the client reads out of the token payload
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub email: String,
    pub username: String,
}

/// Decode the payload segment of a JWT
pub fn decode_claims(token: &str) -> Result<TokenClaims, ApiError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(ApiError::Token("token is not a JWT".to_string())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ApiError::Token(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Token(format!("payload is not valid claims JSON: {e}")))
}
